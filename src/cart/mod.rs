//! Cart-specific actor logic.

pub mod entity;
pub mod error;

pub use entity::{CartAction, CartActionResult, CartContext, CheckoutRequest};
pub use error::*;

use crate::clients::CartClient;
use crate::framework::ResourceActor;
use crate::model::{Cart, Money};

/// Creates a new cart actor and its client. The actor hydrates from the store when run.
pub fn new(delivery_fee: Money) -> (ResourceActor<Cart>, CartClient) {
    let (actor, generic_client) = ResourceActor::new(32, Cart::default());
    let client = CartClient::new(generic_client, delivery_fee);
    (actor, client)
}
