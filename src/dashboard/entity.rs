//! Cached driver dashboard figures.

use crate::api::ClientError;
use crate::dashboard::DashboardError;
use crate::framework::{ActorEntity, ApplyOutcome};
use crate::model::{Delivery, DriverStats};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub stats: Option<DriverStats>,
    pub active_delivery: Option<Delivery>,
    pub last_error: Option<ClientError>,
    token: u64,
}

#[derive(Debug, Clone)]
pub enum DashboardAction {
    Apply {
        token: u64,
        stats: DriverStats,
        /// `None` when the active delivery could not be read; the cached one is kept.
        active_delivery: Option<Option<Delivery>>,
    },
    /// A failed refresh. Ignored if a newer refresh has already been applied.
    RecordError { token: u64, error: ClientError },
}

#[async_trait]
impl ActorEntity for DashboardState {
    type Action = DashboardAction;
    type ActionResult = ApplyOutcome;
    type Context = ();
    type Error = DashboardError;

    async fn handle_action(
        &mut self,
        action: DashboardAction,
        _ctx: &(),
    ) -> Result<ApplyOutcome, DashboardError> {
        match action {
            DashboardAction::Apply {
                token,
                stats,
                active_delivery,
            } => {
                if token <= self.token {
                    debug!(token, last = self.token, "Discarding stale dashboard refresh");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.token = token;
                self.stats = Some(stats);
                if let Some(active) = active_delivery {
                    self.active_delivery = active;
                }
                self.last_error = None;
            }
            DashboardAction::RecordError { token, error } => {
                if token <= self.token {
                    debug!(token, last = self.token, "Discarding stale dashboard error");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.last_error = Some(error);
            }
        }
        Ok(ApplyOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(pending: u32) -> DriverStats {
        DriverStats {
            pending_deliveries: pending,
            ..DriverStats::default()
        }
    }

    #[tokio::test]
    async fn test_late_refresh_is_discarded() {
        let mut state = DashboardState::default();
        let newer = DashboardAction::Apply {
            token: 2,
            stats: stats(0),
            active_delivery: Some(None),
        };
        let older = DashboardAction::Apply {
            token: 1,
            stats: stats(4),
            active_delivery: Some(None),
        };
        assert_eq!(state.handle_action(newer, &()).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(state.handle_action(older, &()).await.unwrap(), ApplyOutcome::Discarded);
        assert_eq!(state.stats.map(|s| s.pending_deliveries), Some(0));
    }

    #[tokio::test]
    async fn test_error_from_older_refresh_is_discarded() {
        let mut state = DashboardState::default();
        let newer = DashboardAction::Apply {
            token: 2,
            stats: stats(1),
            active_delivery: Some(None),
        };
        let late_failure = DashboardAction::RecordError {
            token: 1,
            error: ClientError::Network("timeout".into()),
        };
        state.handle_action(newer, &()).await.unwrap();
        assert_eq!(
            state.handle_action(late_failure, &()).await.unwrap(),
            ApplyOutcome::Discarded
        );
        assert!(state.last_error.is_none());

        let fresh_failure = DashboardAction::RecordError {
            token: 3,
            error: ClientError::Network("offline".into()),
        };
        assert_eq!(
            state.handle_action(fresh_failure, &()).await.unwrap(),
            ApplyOutcome::Applied
        );
        assert_eq!(state.last_error, Some(ClientError::Network("offline".into())));
        assert_eq!(state.stats.map(|s| s.pending_deliveries), Some(1));
    }
}
