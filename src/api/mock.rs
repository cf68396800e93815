//! # Mock Backend
//!
//! Utilities for testing components without a server.
//!
//! Script the answers you need with the `expect_*` builders, hand the mock to the
//! component under test, then call [`MockBackend::verify`] to assert that every
//! expectation was consumed and no unexpected call was made.
//!
//! ```ignore
//! let mock = MockBackend::new();
//! mock.expect_fetch_order(OrderId(1)).return_ok(order);
//! mock.expect_update_status(DeliveryId(3), DeliveryStatus::InTransit)
//!     .return_err(ClientError::RejectedTransition("not accepted".into()));
//!
//! let backend: Arc<dyn Backend> = Arc::new(mock.clone());
//! // ... exercise the component ...
//! mock.verify();
//! ```
//!
//! Expectations for the same call are answered in the order they were registered.
//! Calls of different kinds may interleave freely, which keeps tests of concurrent
//! loops (status polling next to location streaming) deterministic.

use crate::api::{Backend, ClientError};
use crate::model::{
    Delivery, DeliveryFilter, DeliveryId, DeliveryStatus, DriverStats, Earnings, LocationSample,
    Me, NewOrder, Order, OrderFilter, OrderId,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A request made to the mock, used to match expectations and to inspect traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { email: String },
    Me,
    CreateOrder(NewOrder),
    ListOrders(OrderFilter),
    FetchOrder(OrderId),
    FetchOrderDelivery(OrderId),
    FetchDelivery(DeliveryId),
    UpdateStatus(DeliveryId, DeliveryStatus),
    PushLocation(DeliveryId),
    DriverStats,
    ActiveDelivery,
    DriverDeliveries(DeliveryFilter),
    Earnings,
}

impl Call {
    /// Whether an expectation registered for `self` answers `actual`.
    fn answers(&self, actual: &Call) -> bool {
        match (self, actual) {
            // Checkout payloads are inspected through `calls()`; any create matches.
            (Call::CreateOrder(_), Call::CreateOrder(_)) => true,
            (Call::Login { .. }, Call::Login { .. }) => true,
            _ => self == actual,
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Token(Result<String, ClientError>),
    Me(Result<Me, ClientError>),
    Order(Result<Order, ClientError>),
    Orders(Result<Vec<Order>, ClientError>),
    Delivery(Result<Delivery, ClientError>),
    Deliveries(Result<Vec<Delivery>, ClientError>),
    ActiveDelivery(Result<Option<Delivery>, ClientError>),
    Status(Result<DeliveryStatus, ClientError>),
    Unit(Result<(), ClientError>),
    Stats(Result<DriverStats, ClientError>),
    Earnings(Result<Earnings, ClientError>),
}

struct Expectation {
    call: Call,
    reply: Reply,
    delay: Option<Duration>,
    repeat: bool,
}

#[derive(Default)]
struct MockState {
    expectations: Vec<Expectation>,
    calls: Vec<Call>,
    unexpected: Vec<Call>,
    token: Option<String>,
}

/// A scripted [`Backend`]. Cloning shares the script and the call log.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Creates a new mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn builder<T>(&self, call: Call, wrap: fn(Result<T, ClientError>) -> Reply) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            state: self.state.clone(),
            call,
            wrap,
            delay: None,
            repeat: false,
        }
    }

    pub fn expect_login(&self) -> ExpectationBuilder<String> {
        self.builder(Call::Login { email: String::new() }, Reply::Token)
    }

    pub fn expect_me(&self) -> ExpectationBuilder<Me> {
        self.builder(Call::Me, Reply::Me)
    }

    pub fn expect_create_order(&self) -> ExpectationBuilder<Order> {
        // The payload is a placeholder; any checkout matches.
        let placeholder = NewOrder {
            items: Vec::new(),
            order_type: crate::model::OrderType::Collection,
            delivery_address: String::new(),
            payment_method: Default::default(),
        };
        self.builder(Call::CreateOrder(placeholder), Reply::Order)
    }

    pub fn expect_list_orders(&self, filter: OrderFilter) -> ExpectationBuilder<Vec<Order>> {
        self.builder(Call::ListOrders(filter), Reply::Orders)
    }

    pub fn expect_fetch_order(&self, id: OrderId) -> ExpectationBuilder<Order> {
        self.builder(Call::FetchOrder(id), Reply::Order)
    }

    pub fn expect_fetch_order_delivery(&self, id: OrderId) -> ExpectationBuilder<Delivery> {
        self.builder(Call::FetchOrderDelivery(id), Reply::Delivery)
    }

    pub fn expect_fetch_delivery(&self, id: DeliveryId) -> ExpectationBuilder<Delivery> {
        self.builder(Call::FetchDelivery(id), Reply::Delivery)
    }

    pub fn expect_update_status(
        &self,
        id: DeliveryId,
        target: DeliveryStatus,
    ) -> ExpectationBuilder<DeliveryStatus> {
        self.builder(Call::UpdateStatus(id, target), Reply::Status)
    }

    pub fn expect_push_location(&self, id: DeliveryId) -> ExpectationBuilder<()> {
        self.builder(Call::PushLocation(id), Reply::Unit)
    }

    pub fn expect_driver_stats(&self) -> ExpectationBuilder<DriverStats> {
        self.builder(Call::DriverStats, Reply::Stats)
    }

    pub fn expect_active_delivery(&self) -> ExpectationBuilder<Option<Delivery>> {
        self.builder(Call::ActiveDelivery, Reply::ActiveDelivery)
    }

    pub fn expect_driver_deliveries(
        &self,
        filter: DeliveryFilter,
    ) -> ExpectationBuilder<Vec<Delivery>> {
        self.builder(Call::DriverDeliveries(filter), Reply::Deliveries)
    }

    pub fn expect_earnings(&self) -> ExpectationBuilder<Earnings> {
        self.builder(Call::Earnings, Reply::Earnings)
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of received calls equal to `call`.
    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// The token most recently installed with `set_token`.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// Verifies that all one-shot expectations were met and nothing unexpected was called.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.unexpected.is_empty() {
            panic!("Unexpected calls: {:?}", state.unexpected);
        }
        let remaining: Vec<&Call> = state
            .expectations
            .iter()
            .filter(|e| !e.repeat)
            .map(|e| &e.call)
            .collect();
        if !remaining.is_empty() {
            panic!("Not all expectations were met. {} remaining: {:?}", remaining.len(), remaining);
        }
    }

    async fn answer<T>(
        &self,
        call: Call,
        unwrap: fn(Reply) -> Option<Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        let found = {
            let mut state = self.lock();
            state.calls.push(call.clone());
            match state.expectations.iter().position(|e| e.call.answers(&call)) {
                Some(index) if state.expectations[index].repeat => {
                    let e = &state.expectations[index];
                    Some((e.reply.clone(), e.delay))
                }
                Some(index) => {
                    let e = state.expectations.remove(index);
                    Some((e.reply, e.delay))
                }
                None => {
                    state.unexpected.push(call.clone());
                    None
                }
            }
        };

        let Some((reply, delay)) = found else {
            return Err(ClientError::Network(format!("unexpected call {call:?}")));
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        unwrap(reply).unwrap_or_else(|| Err(ClientError::Network(format!("reply type mismatch for {call:?}"))))
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T> {
    state: Arc<Mutex<MockState>>,
    call: Call,
    wrap: fn(Result<T, ClientError>) -> Reply,
    delay: Option<Duration>,
    repeat: bool,
}

impl<T> ExpectationBuilder<T> {
    /// Delays the answer, simulating a slow server.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answers every matching call with the same reply instead of just the next one.
    pub fn always(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ClientError) {
        self.push(Err(error));
    }

    fn push(self, result: Result<T, ClientError>) {
        let reply = (self.wrap)(result);
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.expectations.push(Expectation {
            call: self.call,
            reply,
            delay: self.delay,
            repeat: self.repeat,
        });
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<String, ClientError> {
        let call = Call::Login { email: email.to_string() };
        self.answer(call, |r| match r {
            Reply::Token(r) => Some(r),
            _ => None,
        })
        .await
    }

    fn set_token(&self, token: Option<String>) {
        self.lock().token = token;
    }

    async fn me(&self) -> Result<Me, ClientError> {
        self.answer(Call::Me, |r| match r {
            Reply::Me(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        self.answer(Call::CreateOrder(order.clone()), |r| match r {
            Reply::Order(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, ClientError> {
        self.answer(Call::ListOrders(filter), |r| match r {
            Reply::Orders(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Order, ClientError> {
        self.answer(Call::FetchOrder(id), |r| match r {
            Reply::Order(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn fetch_order_delivery(&self, id: OrderId) -> Result<Delivery, ClientError> {
        self.answer(Call::FetchOrderDelivery(id), |r| match r {
            Reply::Delivery(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn fetch_delivery(&self, id: DeliveryId) -> Result<Delivery, ClientError> {
        self.answer(Call::FetchDelivery(id), |r| match r {
            Reply::Delivery(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn update_delivery_status(
        &self,
        id: DeliveryId,
        target: DeliveryStatus,
    ) -> Result<DeliveryStatus, ClientError> {
        self.answer(Call::UpdateStatus(id, target), |r| match r {
            Reply::Status(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn push_location(
        &self,
        id: DeliveryId,
        _sample: &LocationSample,
    ) -> Result<(), ClientError> {
        self.answer(Call::PushLocation(id), |r| match r {
            Reply::Unit(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn driver_stats(&self) -> Result<DriverStats, ClientError> {
        self.answer(Call::DriverStats, |r| match r {
            Reply::Stats(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn active_delivery(&self) -> Result<Option<Delivery>, ClientError> {
        self.answer(Call::ActiveDelivery, |r| match r {
            Reply::ActiveDelivery(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn driver_deliveries(
        &self,
        filter: DeliveryFilter,
    ) -> Result<Vec<Delivery>, ClientError> {
        self.answer(Call::DriverDeliveries(filter), |r| match r {
            Reply::Deliveries(r) => Some(r),
            _ => None,
        })
        .await
    }

    async fn earnings(&self) -> Result<Earnings, ClientError> {
        self.answer(Call::Earnings, |r| match r {
            Reply::Earnings(r) => Some(r),
            _ => None,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_with_expectations() {
        let mock = MockBackend::new();
        mock.expect_push_location(DeliveryId(1)).always().return_ok(());
        mock.expect_driver_stats().return_err(ClientError::Network("offline".into()));

        let sample = LocationSample::at(crate::model::Coordinate::new(1.0, 2.0), chrono::Utc::now());
        for _ in 0..3 {
            mock.push_location(DeliveryId(1), &sample).await.unwrap();
        }
        assert_eq!(mock.count(&Call::PushLocation(DeliveryId(1))), 3);
        assert!(mock.driver_stats().await.is_err());

        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected calls")]
    async fn test_unexpected_call_fails_verify() {
        let mock = MockBackend::new();
        assert!(mock.earnings().await.is_err());
        mock.verify();
    }
}
