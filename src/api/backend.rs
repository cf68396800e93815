use crate::api::ClientError;
use crate::model::{
    Delivery, DeliveryFilter, DeliveryId, DeliveryStatus, DriverStats, Earnings, LocationSample,
    Me, NewOrder, Order, OrderFilter, OrderId,
};
use async_trait::async_trait;

/// Operations the client needs from the backend.
///
/// The backend is the authority for order and delivery state: implementations return
/// what the server said and never synthesise a status locally.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Exchange credentials for a session token.
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError>;

    /// Install (or clear) the token sent with every later request.
    fn set_token(&self, token: Option<String>);

    /// The signed-in user and their mobile role.
    async fn me(&self) -> Result<Me, ClientError>;

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ClientError>;

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, ClientError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Order, ClientError>;

    /// The delivery attached to a DELIVERY order.
    async fn fetch_order_delivery(&self, id: OrderId) -> Result<Delivery, ClientError>;

    async fn fetch_delivery(&self, id: DeliveryId) -> Result<Delivery, ClientError>;

    /// Ask the backend to move a delivery to `target`. Returns the status the backend confirmed.
    async fn update_delivery_status(
        &self,
        id: DeliveryId,
        target: DeliveryStatus,
    ) -> Result<DeliveryStatus, ClientError>;

    async fn push_location(
        &self,
        id: DeliveryId,
        sample: &LocationSample,
    ) -> Result<(), ClientError>;

    async fn driver_stats(&self) -> Result<DriverStats, ClientError>;

    /// The driver's current delivery, if any.
    async fn active_delivery(&self) -> Result<Option<Delivery>, ClientError>;

    async fn driver_deliveries(&self, filter: DeliveryFilter)
        -> Result<Vec<Delivery>, ClientError>;

    async fn earnings(&self) -> Result<Earnings, ClientError>;
}
