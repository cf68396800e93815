use crate::api::{Backend, ClientError};
use crate::model::{Order, OrderFilter};
use std::sync::Arc;
use tracing::instrument;

/// The customer's order history.
#[derive(Clone)]
pub struct CustomerOrders {
    backend: Arc<dyn Backend>,
}

impl CustomerOrders {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Orders matching `filter`, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<Order>, ClientError> {
        let mut orders = self.backend.list_orders(filter).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockBackend;
    use crate::model::{OrderId, OrderStatus, OrderType, PaymentMethod};
    use chrono::{TimeZone, Utc};

    fn order(id: u64, day: u32) -> Order {
        Order {
            id: OrderId(id),
            items: Vec::new(),
            order_type: OrderType::Collection,
            delivery_address: None,
            payment_method: PaymentMethod::Cash,
            status: OrderStatus::Delivered,
            has_delivery: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).single(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let mock = MockBackend::new();
        mock.expect_list_orders(OrderFilter::Completed)
            .return_ok(vec![order(1, 1), order(3, 9), order(2, 4)]);
        let orders = CustomerOrders::new(Arc::new(mock.clone()));

        let listed = orders.list(OrderFilter::Completed).await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        mock.verify();
    }
}
