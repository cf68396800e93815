use crate::clients::actor_client::ActorClient;
use crate::framework::{ApplyOutcome, ResourceClient};
use crate::tracker::{TrackerAction, TrackerError, TrackerSnapshot};
use tracing::{debug, instrument};

/// Client for the tracker's snapshot actor.
#[derive(Clone)]
pub struct SnapshotClient {
    inner: ResourceClient<TrackerSnapshot>,
}

impl SnapshotClient {
    pub fn new(inner: ResourceClient<TrackerSnapshot>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, action))]
    pub async fn apply(&self, action: TrackerAction) -> Result<ApplyOutcome, TrackerError> {
        let outcome = self.inner.perform_action(action).await?;
        debug!(?outcome, "Snapshot write");
        Ok(outcome)
    }

    pub async fn snapshot(&self) -> Result<TrackerSnapshot, TrackerError> {
        self.state().await
    }
}

impl ActorClient<TrackerSnapshot> for SnapshotClient {
    fn inner(&self) -> &ResourceClient<TrackerSnapshot> {
        &self.inner
    }
}
