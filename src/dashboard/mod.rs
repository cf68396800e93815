//! Driver dashboard and customer order history.
//!
//! The [`DriverDashboard`] keeps the driver's counters and active delivery fresh on
//! the badges interval. Refreshes are tokened like the tracker's polls, so a slow
//! refresh can never overwrite a newer one.

pub mod entity;
pub mod error;
pub mod orders;

pub use entity::{DashboardAction, DashboardState};
pub use error::*;
pub use orders::CustomerOrders;

use crate::api::Backend;
use crate::clients::DashboardClient;
use crate::framework::{PeriodicTask, RequestSequence, ResourceActor};
use crate::model::{Delivery, DeliveryFilter, Earnings};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{instrument, warn};

/// Creates the dashboard actor and its client.
pub fn new() -> (ResourceActor<DashboardState>, DashboardClient) {
    let (actor, generic_client) = ResourceActor::new(16, DashboardState::default());
    (actor, DashboardClient::new(generic_client))
}

#[derive(Clone)]
struct DashboardCore {
    backend: Arc<dyn Backend>,
    state: DashboardClient,
    sequence: RequestSequence,
}

impl DashboardCore {
    async fn refresh(&self) -> Result<DashboardState, DashboardError> {
        let token = self.sequence.next_token();
        let stats = match self.backend.driver_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                self.state
                    .apply(DashboardAction::RecordError {
                        token,
                        error: e.clone(),
                    })
                    .await?;
                return Err(e.into());
            }
        };
        let active_delivery = match self.backend.active_delivery().await {
            Ok(active) => Some(active),
            Err(e) => {
                warn!(error = %e, "Could not load active delivery, keeping previous");
                None
            }
        };
        self.state
            .apply(DashboardAction::Apply {
                token,
                stats,
                active_delivery,
            })
            .await?;
        self.state.snapshot().await
    }
}

/// Live driver dashboard.
pub struct DriverDashboard {
    core: DashboardCore,
    poller: Option<PeriodicTask>,
    actor: JoinHandle<()>,
}

impl DriverDashboard {
    /// Starts the dashboard and its refresh loop. The first refresh runs immediately.
    pub fn start(backend: Arc<dyn Backend>, interval: Duration) -> Self {
        let (actor, state) = new();
        let actor = tokio::spawn(actor.run(()));
        let core = DashboardCore {
            backend,
            state,
            sequence: RequestSequence::new(),
        };
        let looped = core.clone();
        let poller = PeriodicTask::spawn("driver-dashboard", interval, move || {
            let core = looped.clone();
            async move {
                if let Err(e) = core.refresh().await {
                    warn!(error = %e, "Dashboard refresh failed");
                }
            }
        });
        Self {
            core,
            poller: Some(poller),
            actor,
        }
    }

    /// Refreshes now, e.g. on pull-to-refresh or after a transition.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<DashboardState, DashboardError> {
        self.core.refresh().await
    }

    pub async fn snapshot(&self) -> Result<DashboardState, DashboardError> {
        self.core.state.snapshot().await
    }

    #[instrument(skip(self))]
    pub async fn earnings(&self) -> Result<Earnings, DashboardError> {
        Ok(self.core.backend.earnings().await?)
    }

    #[instrument(skip(self))]
    pub async fn deliveries(&self, filter: DeliveryFilter) -> Result<Vec<Delivery>, DashboardError> {
        Ok(self.core.backend.driver_deliveries(filter).await?)
    }

    pub async fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }
}

impl Drop for DriverDashboard {
    fn drop(&mut self) {
        self.actor.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockBackend};
    use crate::api::ClientError;
    use crate::model::{DeliveryId, DeliveryStatus, DriverStats};
    use rust_decimal_macros::dec;

    fn active(id: u64) -> Delivery {
        Delivery {
            id: DeliveryId(id),
            order_id: None,
            status: DeliveryStatus::Accepted,
            driver: None,
            pickup: None,
            destination: None,
            pickup_address: None,
            destination_address: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_and_keeps_active_on_partial_failure() {
        let mock = MockBackend::new();
        mock.expect_driver_stats().always().return_ok(DriverStats {
            pending_deliveries: 2,
            total_earnings_today: dec!(42.50),
            ..DriverStats::default()
        });
        mock.expect_active_delivery().return_ok(Some(active(7)));
        mock.expect_active_delivery()
            .return_err(ClientError::Network("offline".into()));

        let mut dashboard = DriverDashboard::start(Arc::new(mock.clone()), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(mock.count(&Call::DriverStats), 2);
        let state = dashboard.snapshot().await.unwrap();
        assert_eq!(state.active_delivery.map(|d| d.id), Some(DeliveryId(7)));
        assert_eq!(state.stats.map(|s| s.total_earnings_today), Some(dec!(42.50)));

        dashboard.stop().await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(mock.count(&Call::DriverStats), 2);
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stats_are_recorded() {
        let mock = MockBackend::new();
        mock.expect_driver_stats()
            .always()
            .return_err(ClientError::Unauthorized);

        let dashboard = DriverDashboard::start(Arc::new(mock.clone()), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let state = dashboard.snapshot().await.unwrap();
        assert!(state.stats.is_none());
        assert_eq!(state.last_error, Some(ClientError::Unauthorized));
        assert_eq!(mock.count(&Call::ActiveDelivery), 0);
    }
}
