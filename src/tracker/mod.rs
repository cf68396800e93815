//! Delivery lifecycle tracking.
//!
//! A [`DeliveryTracker`] presents one order/delivery to the presentation layer. It
//! owns three pieces of concurrent work, all cancelled when it is stopped or dropped:
//!
//! - the snapshot actor, the single writer of the cached [`TrackerSnapshot`]
//! - an optional status poller refreshing the snapshot from the backend
//! - an optional location stream forwarding the device position (driver side)
//!
//! The backend is the authority for every status. Transition intents are sent as
//! requests and the snapshot changes only once the backend confirms them.

pub mod entity;
pub mod error;
pub mod location;

pub use entity::{TrackerAction, TrackerSnapshot};
pub use error::*;
pub use location::{LocationError, LocationSource, PathLocationSource};

use crate::api::{Backend, ClientError};
use crate::clients::SnapshotClient;
use crate::config::PollingConfig;
use crate::framework::{ApplyOutcome, PeriodicTask, RequestSequence, ResourceActor};
use crate::model::{Coordinate, Delivery, DeliveryId, DeliveryStatus, OrderId, Route};
use crate::routing::{self, RouteProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Creates the snapshot actor and its client.
pub fn new() -> (ResourceActor<TrackerSnapshot>, SnapshotClient) {
    let (actor, generic_client) = ResourceActor::new(32, TrackerSnapshot::default());
    (actor, SnapshotClient::new(generic_client))
}

/// State shared with the background loops.
#[derive(Clone)]
struct TrackerCore {
    backend: Arc<dyn Backend>,
    routes: Arc<dyn RouteProvider>,
    snapshots: SnapshotClient,
    sequence: RequestSequence,
}

impl TrackerCore {
    async fn fetch_snapshot(&self, order_id: OrderId) -> Result<TrackerSnapshot, TrackerError> {
        self.fetch_snapshot_as(self.sequence.next_token(), order_id).await
    }

    async fn fetch_snapshot_as(
        &self,
        token: u64,
        order_id: OrderId,
    ) -> Result<TrackerSnapshot, TrackerError> {
        let order = self.backend.fetch_order(order_id).await?;
        let delivery = if order.has_delivery {
            match self.backend.fetch_order_delivery(order_id).await {
                Ok(delivery) => Some(delivery),
                // Not assigned to a driver yet.
                Err(ClientError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };
        self.snapshots
            .apply(TrackerAction::ApplyFetch {
                token,
                order,
                delivery,
            })
            .await?;
        self.snapshots.snapshot().await
    }

    async fn fetch_delivery(&self, delivery_id: DeliveryId) -> Result<Delivery, TrackerError> {
        let token = self.sequence.next_token();
        let delivery = self.backend.fetch_delivery(delivery_id).await?;
        self.snapshots
            .apply(TrackerAction::ApplyDelivery {
                token,
                delivery: delivery.clone(),
            })
            .await?;
        Ok(delivery)
    }

    async fn poll(&self, order_id: OrderId) {
        let token = self.sequence.next_token();
        match self.fetch_snapshot_as(token, order_id).await {
            Ok(snapshot) => debug!(
                %order_id,
                order_status = ?snapshot.order.as_ref().map(|o| o.status),
                delivery_status = ?snapshot.delivery_status(),
                "Polled"
            ),
            Err(e) => {
                warn!(%order_id, error = %e, "Status poll failed, keeping last snapshot");
                if let TrackerError::Client(error) = e {
                    let _ = self
                        .snapshots
                        .apply(TrackerAction::RecordError { token, error })
                        .await;
                }
            }
        }
    }

    /// Takes one position reading, shows it and forwards it. Nothing here is retried:
    /// the next reading supersedes a lost one.
    async fn sample_location(&self, delivery_id: DeliveryId, source: &dyn LocationSource) {
        let sample = match source.current_position().await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(%delivery_id, error = %e, "Could not read position");
                return;
            }
        };
        let token = self.sequence.next_token();
        let update = TrackerAction::ApplyLocation {
            token,
            sample: sample.clone(),
        };
        if let Err(e) = self.snapshots.apply(update).await {
            warn!(error = %e, "Could not cache location sample");
        }
        if let Err(e) = self.backend.push_location(delivery_id, &sample).await {
            warn!(%delivery_id, error = %e, "Dropping location sample");
        }
    }
}

/// Tracks one order/delivery for the presentation layer.
pub struct DeliveryTracker {
    core: TrackerCore,
    status_interval: Duration,
    location_interval: Duration,
    status_poll: Option<PeriodicTask>,
    location_stream: Option<PeriodicTask>,
    actor: JoinHandle<()>,
}

impl DeliveryTracker {
    /// Starts the snapshot actor. Must be called inside a Tokio runtime.
    pub fn new(
        backend: Arc<dyn Backend>,
        routes: Arc<dyn RouteProvider>,
        polling: &PollingConfig,
    ) -> Self {
        let (actor, snapshots) = new();
        let actor = tokio::spawn(actor.run(()));
        Self {
            core: TrackerCore {
                backend,
                routes,
                snapshots,
                sequence: RequestSequence::new(),
            },
            status_interval: polling.order_status(),
            location_interval: polling.location_sample(),
            status_poll: None,
            location_stream: None,
            actor,
        }
    }

    /// Fetches the order and, for DELIVERY orders, its delivery.
    ///
    /// On failure the cached snapshot is left as it was and the error is returned.
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self, order_id: OrderId) -> Result<TrackerSnapshot, TrackerError> {
        self.core.fetch_snapshot(order_id).await
    }

    /// Fetches a delivery by its own id (driver side).
    #[instrument(skip(self))]
    pub async fn fetch_delivery(&self, delivery_id: DeliveryId) -> Result<Delivery, TrackerError> {
        self.core.fetch_delivery(delivery_id).await
    }

    /// Seeds the snapshot with a delivery the caller already holds, e.g. from a list.
    pub async fn watch_delivery(&self, delivery: Delivery) -> Result<(), TrackerError> {
        let token = self.core.sequence.next_token();
        self.core
            .snapshots
            .apply(TrackerAction::ApplyDelivery { token, delivery })
            .await?;
        Ok(())
    }

    /// Asks the backend to move the delivery to `target`.
    ///
    /// The snapshot adopts the status the backend confirmed. A refusal leaves the
    /// snapshot untouched and surfaces as [`ClientError::RejectedTransition`]. Reaching
    /// a terminal status ends the location stream.
    #[instrument(skip(self))]
    pub async fn request_transition(
        &mut self,
        delivery_id: DeliveryId,
        target: DeliveryStatus,
    ) -> Result<Delivery, TrackerError> {
        let token = self.core.sequence.next_token();
        let confirmed = match self
            .core
            .backend
            .update_delivery_status(delivery_id, target)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                warn!(%delivery_id, %target, error = %e, "Transition refused");
                return Err(e.into());
            }
        };
        info!(%delivery_id, status = %confirmed, "Transition confirmed");

        let outcome = self
            .core
            .snapshots
            .apply(TrackerAction::ApplyStatus {
                token,
                delivery_id,
                status: confirmed,
            })
            .await?;
        if confirmed.is_terminal() {
            self.stop_location_stream().await;
        }

        let cached = self
            .core
            .snapshots
            .snapshot()
            .await?
            .delivery
            .filter(|d| d.id == delivery_id);
        match cached {
            Some(delivery) if outcome == ApplyOutcome::Applied => Ok(delivery),
            // Not cached, or superseded meanwhile: read the server's view.
            _ => self.core.fetch_delivery(delivery_id).await,
        }
    }

    /// Intents to offer for the cached delivery status.
    pub async fn next_actions(&self) -> Result<&'static [DeliveryStatus], TrackerError> {
        Ok(self.snapshot().await?.next_actions())
    }

    /// Starts sampling `source` and forwarding each reading. A second call while a
    /// stream is running does nothing.
    pub fn start_location_stream(&mut self, delivery_id: DeliveryId, source: Arc<dyn LocationSource>) {
        if self.location_stream.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!(%delivery_id, "Location stream already running");
            return;
        }
        let core = self.core.clone();
        self.location_stream = Some(PeriodicTask::spawn(
            "location-stream",
            self.location_interval,
            move || {
                let core = core.clone();
                let source = source.clone();
                async move { core.sample_location(delivery_id, source.as_ref()).await }
            },
        ));
    }

    pub async fn stop_location_stream(&mut self) {
        if let Some(task) = self.location_stream.take() {
            task.stop().await;
        }
    }

    pub fn is_streaming_location(&self) -> bool {
        self.location_stream.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Display route between two points. Never fails: falls back to a straight line.
    pub async fn fetch_route(&self, pickup: Coordinate, destination: Coordinate) -> Route {
        let route = routing::fetch_route(self.core.routes.as_ref(), pickup, destination).await;
        if let Err(e) = self.core.snapshots.apply(TrackerAction::SetRoute(route.clone())).await {
            warn!(error = %e, "Could not cache route");
        }
        route
    }

    /// Refreshes the snapshot for `order_id` every status interval, replacing any
    /// poller already running.
    pub fn start_status_polling(&mut self, order_id: OrderId) {
        let core = self.core.clone();
        self.status_poll = Some(PeriodicTask::spawn(
            "status-poll",
            self.status_interval,
            move || {
                let core = core.clone();
                async move { core.poll(order_id).await }
            },
        ));
    }

    pub async fn stop_status_polling(&mut self) {
        if let Some(task) = self.status_poll.take() {
            task.stop().await;
        }
    }

    pub async fn snapshot(&self) -> Result<TrackerSnapshot, TrackerError> {
        self.core.snapshots.snapshot().await
    }

    /// Stops background work and clears the snapshot so another order can be tracked.
    pub async fn reset(&mut self) -> Result<(), TrackerError> {
        self.stop().await;
        let token = self.core.sequence.next_token();
        self.core
            .snapshots
            .apply(TrackerAction::Reset { token })
            .await?;
        Ok(())
    }

    /// Cancels the poller and the location stream.
    pub async fn stop(&mut self) {
        self.stop_status_polling().await;
        self.stop_location_stream().await;
    }
}

impl Drop for DeliveryTracker {
    fn drop(&mut self) {
        // Loops abort through their own handles; the actor has no other owner.
        self.actor.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockBackend};
    use crate::model::{
        DriverInfo, Order, OrderStatus, OrderType, PaymentMethod, RouteSource,
    };
    use crate::routing::RoutingError;
    use async_trait::async_trait;

    struct NoRoutes;

    #[async_trait]
    impl RouteProvider for NoRoutes {
        async fn route(
            &self,
            _pickup: Coordinate,
            _destination: Coordinate,
        ) -> Result<Vec<Coordinate>, RoutingError> {
            Err(RoutingError::Network("offline".into()))
        }
    }

    fn order(status: OrderStatus, has_delivery: bool) -> Order {
        Order {
            id: OrderId(1),
            items: Vec::new(),
            order_type: OrderType::Delivery,
            delivery_address: Some("4 Borrowdale Rd".into()),
            payment_method: PaymentMethod::Cash,
            status,
            has_delivery,
            created_at: None,
            updated_at: None,
        }
    }

    fn delivery(status: DeliveryStatus) -> Delivery {
        Delivery {
            id: DeliveryId(3),
            order_id: Some(OrderId(1)),
            status,
            driver: Some(DriverInfo {
                id: 9,
                name: "Tendai".into(),
                phone: None,
                current_latitude: Some(-17.82),
                current_longitude: Some(31.05),
                total_deliveries: 12,
            }),
            pickup: Some(Coordinate::new(-17.8292, 31.0522)),
            destination: Some(Coordinate::new(-17.7840, 31.0530)),
            pickup_address: None,
            destination_address: None,
        }
    }

    fn tracker(mock: &MockBackend) -> DeliveryTracker {
        let polling = PollingConfig {
            badges_ms: 30_000,
            order_status_ms: 10_000,
            location_sample_ms: 5_000,
        };
        DeliveryTracker::new(Arc::new(mock.clone()), Arc::new(NoRoutes), &polling)
    }

    #[tokio::test]
    async fn test_fetch_snapshot_follows_delivery() {
        let mock = MockBackend::new();
        mock.expect_fetch_order(OrderId(1))
            .return_ok(order(OrderStatus::Dispatched, true));
        mock.expect_fetch_order_delivery(OrderId(1))
            .return_ok(delivery(DeliveryStatus::InTransit));
        let tracker = tracker(&mock);

        let snapshot = tracker.fetch_snapshot(OrderId(1)).await.unwrap();
        assert_eq!(snapshot.delivery_status(), Some(DeliveryStatus::InTransit));
        assert_eq!(snapshot.driver_location.map(|s| s.latitude), Some(-17.82));
        mock.verify();
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_snapshot() {
        let mock = MockBackend::new();
        mock.expect_fetch_order(OrderId(1))
            .return_ok(order(OrderStatus::Confirmed, false));
        mock.expect_fetch_order(OrderId(1))
            .return_err(ClientError::Network("timeout".into()));
        let tracker = tracker(&mock);

        tracker.fetch_snapshot(OrderId(1)).await.unwrap();
        let err = tracker.fetch_snapshot(OrderId(1)).await.unwrap_err();
        assert_eq!(err, TrackerError::Client(ClientError::Network("timeout".into())));

        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.order.map(|o| o.status), Some(OrderStatus::Confirmed));
        mock.verify();
    }

    #[tokio::test]
    async fn test_rejected_transition_keeps_status() {
        let mock = MockBackend::new();
        mock.expect_update_status(DeliveryId(3), DeliveryStatus::InTransit)
            .return_err(ClientError::RejectedTransition("accept first".into()));
        let mut tracker = tracker(&mock);
        tracker.watch_delivery(delivery(DeliveryStatus::Assigned)).await.unwrap();

        let err = tracker
            .request_transition(DeliveryId(3), DeliveryStatus::InTransit)
            .await
            .unwrap_err();
        assert!(err.is_rejected_transition());
        assert_eq!(
            tracker.snapshot().await.unwrap().delivery_status(),
            Some(DeliveryStatus::Assigned)
        );
        assert_eq!(
            tracker.next_actions().await.unwrap(),
            &[DeliveryStatus::Accepted, DeliveryStatus::Cancelled]
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_uncached_transition_reads_delivery_back() {
        let mock = MockBackend::new();
        mock.expect_update_status(DeliveryId(3), DeliveryStatus::Accepted)
            .return_ok(DeliveryStatus::Accepted);
        mock.expect_fetch_delivery(DeliveryId(3))
            .return_ok(delivery(DeliveryStatus::Accepted));
        let mut tracker = tracker(&mock);

        let updated = tracker
            .request_transition(DeliveryId(3), DeliveryStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(updated.status, DeliveryStatus::Accepted);
        assert_eq!(
            tracker.snapshot().await.unwrap().delivery_status(),
            Some(DeliveryStatus::Accepted)
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_route_failure_falls_back_and_is_cached() {
        let mock = MockBackend::new();
        let tracker = tracker(&mock);
        let pickup = Coordinate::new(-17.8292, 31.0522);
        let destination = Coordinate::new(-17.7840, 31.0530);

        let route = tracker.fetch_route(pickup, destination).await;
        assert_eq!(route.points, vec![pickup, destination]);
        assert_eq!(route.source, RouteSource::StraightLine);
        assert_eq!(tracker.snapshot().await.unwrap().route, Some(route));
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_stream_survives_push_failures() {
        let mock = MockBackend::new();
        mock.expect_push_location(DeliveryId(3))
            .return_err(ClientError::Network("offline".into()));
        mock.expect_push_location(DeliveryId(3)).always().return_ok(());
        let mut tracker = tracker(&mock);
        tracker.watch_delivery(delivery(DeliveryStatus::InTransit)).await.unwrap();

        let path = vec![
            Coordinate::new(-17.829, 31.052),
            Coordinate::new(-17.820, 31.052),
            Coordinate::new(-17.810, 31.053),
        ];
        let source = Arc::new(PathLocationSource::new(path.clone()));
        tracker.start_location_stream(DeliveryId(3), source.clone());
        tracker.start_location_stream(DeliveryId(3), source);
        assert!(tracker.is_streaming_location());

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(mock.count(&Call::PushLocation(DeliveryId(3))), 3);
        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.driver_location.map(|s| s.position()), Some(path[2]));

        tracker.stop_location_stream().await;
        tracker.stop_location_stream().await;
        assert!(!tracker.is_streaming_location());
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(mock.count(&Call::PushLocation(DeliveryId(3))), 3);
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_before_pickup_keeps_location_hidden() {
        let mock = MockBackend::new();
        mock.expect_push_location(DeliveryId(3)).always().return_ok(());
        let mut tracker = tracker(&mock);
        let mut accepted = delivery(DeliveryStatus::Accepted);
        accepted.driver = None;
        tracker.watch_delivery(accepted).await.unwrap();

        let source = Arc::new(PathLocationSource::new(vec![Coordinate::new(1.0, 2.0)]));
        tracker.start_location_stream(DeliveryId(3), source);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(mock.count(&Call::PushLocation(DeliveryId(3))), 1);
        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.delivery_status(), Some(DeliveryStatus::Accepted));
        assert!(snapshot.driver_location.is_none());
        tracker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_transition_stops_stream() {
        let mock = MockBackend::new();
        mock.expect_push_location(DeliveryId(3)).always().return_ok(());
        mock.expect_update_status(DeliveryId(3), DeliveryStatus::Delivered)
            .return_ok(DeliveryStatus::Delivered);
        let mut tracker = tracker(&mock);
        tracker.watch_delivery(delivery(DeliveryStatus::InTransit)).await.unwrap();

        let source = Arc::new(PathLocationSource::new(vec![Coordinate::new(1.0, 2.0)]));
        tracker.start_location_stream(DeliveryId(3), source);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let delivered = tracker
            .request_transition(DeliveryId(3), DeliveryStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, DeliveryStatus::Delivered);
        assert!(!tracker.is_streaming_location());
        assert!(tracker.next_actions().await.unwrap().is_empty());
        assert!(tracker.snapshot().await.unwrap().driver_location.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_polling_records_errors_and_recovers() {
        let mock = MockBackend::new();
        mock.expect_fetch_order(OrderId(1))
            .return_err(ClientError::Network("offline".into()));
        mock.expect_fetch_order(OrderId(1))
            .return_ok(order(OrderStatus::Ready, false));
        let mut tracker = tracker(&mock);

        tracker.start_status_polling(OrderId(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = tracker.snapshot().await.unwrap();
        assert!(snapshot.order.is_none());
        assert_eq!(snapshot.last_error, Some(ClientError::Network("offline".into())));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let snapshot = tracker.snapshot().await.unwrap();
        assert_eq!(snapshot.order.map(|o| o.status), Some(OrderStatus::Ready));
        assert!(snapshot.last_error.is_none());

        tracker.stop().await;
        mock.verify();
    }

    #[tokio::test]
    async fn test_reset_clears_snapshot() {
        let mock = MockBackend::new();
        let mut tracker = tracker(&mock);
        tracker.watch_delivery(delivery(DeliveryStatus::Accepted)).await.unwrap();

        tracker.reset().await.unwrap();
        let snapshot = tracker.snapshot().await.unwrap();
        assert!(snapshot.delivery.is_none());
        assert!(snapshot.next_actions().is_empty());
    }
}
