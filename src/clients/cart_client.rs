use crate::cart::{CartAction, CartActionResult, CartError, CheckoutRequest};
use crate::clients::actor_client::ActorClient;
use crate::framework::ResourceClient;
use crate::model::{Cart, CartItem, MenuItemId, Money, Order, OrderType, Totals};
use tracing::{debug, instrument};

/// Client for the cart actor.
///
/// Amounts are derived from the current lines on every call and never stored.
#[derive(Clone)]
pub struct CartClient {
    inner: ResourceClient<Cart>,
    delivery_fee: Money,
}

impl CartClient {
    pub fn new(inner: ResourceClient<Cart>, delivery_fee: Money) -> Self {
        Self {
            inner,
            delivery_fee,
        }
    }

    async fn update(&self, action: CartAction) -> Result<Cart, CartError> {
        match self.inner.perform_action(action).await? {
            CartActionResult::Updated(cart) => Ok(cart),
            other => Err(CartError::UnexpectedReply(format!("{other:?}"))),
        }
    }

    /// Adds `delta` units of `item` (negative to decrement).
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_or_update(&self, item: CartItem, delta: i64) -> Result<Cart, CartError> {
        self.update(CartAction::AddOrUpdate { item, delta }).await
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, item_id: MenuItemId, delta: i64) -> Result<Cart, CartError> {
        self.update(CartAction::UpdateQuantity { item_id, delta }).await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: MenuItemId) -> Result<Cart, CartError> {
        self.update(CartAction::Remove(item_id)).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, CartError> {
        self.update(CartAction::Clear).await
    }

    pub async fn cart(&self) -> Result<Cart, CartError> {
        self.state().await
    }

    pub async fn subtotal(&self) -> Result<Money, CartError> {
        Ok(self.cart().await?.subtotal())
    }

    /// The flat surcharge for `order_type`. Zero for collection.
    pub fn delivery_fee(&self, order_type: OrderType) -> Money {
        order_type.delivery_fee(self.delivery_fee)
    }

    pub async fn total(&self, order_type: OrderType) -> Result<Money, CartError> {
        Ok(self.totals(order_type).await?.total)
    }

    pub async fn totals(&self, order_type: OrderType) -> Result<Totals, CartError> {
        Ok(self.cart().await?.totals(order_type, self.delivery_fee))
    }

    /// Places the order. The cart is cleared only when the backend accepts it.
    #[instrument(skip(self))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Order, CartError> {
        debug!("Sending checkout to cart actor");
        match self.inner.perform_action(CartAction::Checkout(request)).await? {
            CartActionResult::CheckedOut(order) => Ok(order),
            other => Err(CartError::UnexpectedReply(format!("{other:?}"))),
        }
    }
}

impl ActorClient<Cart> for CartClient {
    fn inner(&self) -> &ResourceClient<Cart> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockBackend};
    use crate::api::ClientError;
    use crate::cart::CartContext;
    use crate::model::{OrderId, OrderStatus, PaymentMethod};
    use crate::store::{keys, KeyValueStore, MemoryStore};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn start(mock: &MockBackend, store: Arc<MemoryStore>) -> CartClient {
        let (actor, client) = crate::cart::new(dec!(5.00));
        let ctx = CartContext {
            store,
            backend: Arc::new(mock.clone()),
        };
        tokio::spawn(actor.run(ctx));
        client
    }

    fn placed_order() -> Order {
        Order {
            id: OrderId(77),
            items: Vec::new(),
            order_type: OrderType::Delivery,
            delivery_address: Some("4 Borrowdale Rd".into()),
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Pending,
            has_delivery: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_totals_for_two_line_delivery_cart() {
        let mock = MockBackend::new();
        let cart = start(&mock, Arc::new(MemoryStore::new()));

        cart.add_or_update(CartItem::new(1, "Burger", dec!(8.99)), 2).await.unwrap();
        cart.add_or_update(CartItem::new(2, "Pizza", dec!(12.99)), 1).await.unwrap();

        assert_eq!(cart.subtotal().await.unwrap(), dec!(30.97));
        assert_eq!(cart.delivery_fee(OrderType::Delivery), dec!(5.00));
        assert_eq!(cart.delivery_fee(OrderType::Collection), dec!(0));
        assert_eq!(cart.total(OrderType::Delivery).await.unwrap(), dec!(35.97));
        assert_eq!(cart.total(OrderType::Collection).await.unwrap(), dec!(30.97));
        mock.verify();
    }

    #[tokio::test]
    async fn test_empty_checkout_fails_without_calling_backend() {
        let mock = MockBackend::new();
        let cart = start(&mock, Arc::new(MemoryStore::new()));

        let err = cart.checkout(CheckoutRequest::collection()).await.unwrap_err();
        assert!(matches!(err.client_error(), Some(ClientError::ValidationError(_))));
        assert!(cart.cart().await.unwrap().is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_without_address_leaves_cart_unchanged() {
        let mock = MockBackend::new();
        let cart = start(&mock, Arc::new(MemoryStore::new()));
        cart.add_or_update(CartItem::new(1, "Burger", dec!(8.99)), 1).await.unwrap();

        let err = cart.checkout(CheckoutRequest::delivery("")).await.unwrap_err();
        assert!(matches!(err.client_error(), Some(ClientError::ValidationError(_))));
        assert_eq!(cart.cart().await.unwrap().item_count(), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_and_persists() {
        let mock = MockBackend::new();
        mock.expect_create_order().return_ok(placed_order());
        let store = Arc::new(MemoryStore::new());
        let cart = start(&mock, store.clone());

        cart.add_or_update(CartItem::new(1, "Burger", dec!(8.99)), 2).await.unwrap();
        let order = cart.checkout(CheckoutRequest::delivery("4 Borrowdale Rd")).await.unwrap();

        assert_eq!(order.id, OrderId(77));
        assert!(cart.cart().await.unwrap().is_empty());
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some(r#"{"lines":[]}"#));

        match &mock.calls()[0] {
            Call::CreateOrder(sent) => {
                assert_eq!(sent.items.len(), 1);
                assert_eq!(sent.items[0].quantity, 2);
                assert_eq!(sent.delivery_address, "4 Borrowdale Rd");
            }
            other => panic!("unexpected call {other:?}"),
        }
        mock.verify();
    }

    #[tokio::test]
    async fn test_rejected_checkout_keeps_cart() {
        let mock = MockBackend::new();
        mock.expect_create_order()
            .return_err(ClientError::Rejected("Menu item unavailable".into()));
        let cart = start(&mock, Arc::new(MemoryStore::new()));
        cart.add_or_update(CartItem::new(3, "Chips", dec!(2.50)), 3).await.unwrap();

        let err = cart.checkout(CheckoutRequest::collection()).await.unwrap_err();
        assert_eq!(err, CartError::Client(ClientError::Rejected("Menu item unavailable".into())));
        assert_eq!(cart.cart().await.unwrap().item_count(), 3);
        mock.verify();
    }

    #[tokio::test]
    async fn test_cart_restored_from_store() {
        let store = Arc::new(MemoryStore::new());
        let first = start(&MockBackend::new(), store.clone());
        first.add_or_update(CartItem::new(1, "Burger", dec!(8.99)), 2).await.unwrap();
        first.update_quantity(MenuItemId(1), -1).await.unwrap();
        drop(first);

        let second = start(&MockBackend::new(), store);
        let cart = second.cart().await.unwrap();
        assert_eq!(cart.line(MenuItemId(1)).map(|l| l.quantity), Some(1));
    }
}
