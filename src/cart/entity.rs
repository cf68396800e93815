//! [`ActorEntity`] implementation for [`Cart`].
//!
//! The cart actor is the only writer of the cart. It hydrates from the local store on
//! start and writes the whole cart back after every change, so a restart resumes
//! exactly where the customer left off.

use crate::api::Backend;
use crate::cart::CartError;
use crate::framework::ActorEntity;
use crate::model::{Cart, CartItem, MenuItemId, NewOrder, Order, OrderType, PaymentMethod};
use crate::store::{keys, load_json, save_json, KeyValueStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Dependencies injected into the cart actor.
#[derive(Clone)]
pub struct CartContext {
    pub store: Arc<dyn KeyValueStore>,
    pub backend: Arc<dyn Backend>,
}

/// What the customer chose on the checkout form.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    /// Ignored for collection orders.
    pub address: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    pub fn delivery(address: impl Into<String>) -> Self {
        Self {
            order_type: OrderType::Delivery,
            address: address.into(),
            payment_method: PaymentMethod::Cash,
        }
    }

    pub fn collection() -> Self {
        Self {
            order_type: OrderType::Collection,
            address: String::new(),
            payment_method: PaymentMethod::Cash,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CartAction {
    AddOrUpdate { item: CartItem, delta: i64 },
    UpdateQuantity { item_id: MenuItemId, delta: i64 },
    Remove(MenuItemId),
    Clear,
    Checkout(CheckoutRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartActionResult {
    Updated(Cart),
    CheckedOut(Order),
}

impl Cart {
    fn persist(&self, ctx: &CartContext) {
        // The in-memory cart stays authoritative when the disk write fails.
        if let Err(e) = save_json(ctx.store.as_ref(), keys::CART, self) {
            warn!(error = %e, "Failed to persist cart");
        }
    }

    fn new_order(&self, request: &CheckoutRequest) -> Result<NewOrder, CartError> {
        if self.is_empty() {
            return Err(CartError::validation("Your cart is empty"));
        }
        let address = request.address.trim();
        let delivery_address = match request.order_type {
            OrderType::Delivery if address.is_empty() => {
                return Err(CartError::validation("Please enter a delivery address"));
            }
            OrderType::Delivery => address.to_string(),
            OrderType::Collection => String::new(),
        };
        Ok(NewOrder {
            items: self.order_items(),
            order_type: request.order_type,
            delivery_address,
            payment_method: request.payment_method,
        })
    }
}

#[async_trait]
impl ActorEntity for Cart {
    type Action = CartAction;
    type ActionResult = CartActionResult;
    type Context = CartContext;
    type Error = CartError;

    async fn on_start(&mut self, ctx: &CartContext) -> Result<(), CartError> {
        match load_json::<Cart>(ctx.store.as_ref(), keys::CART) {
            Ok(Some(mut saved)) => {
                saved.lines.retain(|line| line.quantity > 0);
                info!(lines = saved.lines.len(), "Restored cart");
                *self = saved;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable saved cart"),
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: CartAction,
        ctx: &CartContext,
    ) -> Result<CartActionResult, CartError> {
        match action {
            CartAction::AddOrUpdate { item, delta } => self.add_or_update(item, delta),
            CartAction::UpdateQuantity { item_id, delta } => self.update_quantity(item_id, delta),
            CartAction::Remove(item_id) => self.remove(item_id),
            CartAction::Clear => self.clear(),
            CartAction::Checkout(request) => {
                let order = self.new_order(&request)?;
                let created = ctx.backend.create_order(&order).await?;
                info!(order_id = %created.id, "Order placed, clearing cart");
                self.clear();
                self.persist(ctx);
                return Ok(CartActionResult::CheckedOut(created));
            }
        }
        self.persist(ctx);
        Ok(CartActionResult::Updated(self.clone()))
    }
}
