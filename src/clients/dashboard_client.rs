use crate::clients::actor_client::ActorClient;
use crate::dashboard::{DashboardAction, DashboardError, DashboardState};
use crate::framework::{ApplyOutcome, ResourceClient};

/// Client for the driver dashboard actor.
#[derive(Clone)]
pub struct DashboardClient {
    inner: ResourceClient<DashboardState>,
}

impl DashboardClient {
    pub fn new(inner: ResourceClient<DashboardState>) -> Self {
        Self { inner }
    }

    pub async fn apply(&self, action: DashboardAction) -> Result<ApplyOutcome, DashboardError> {
        self.inner.perform_action(action).await
    }

    pub async fn snapshot(&self) -> Result<DashboardState, DashboardError> {
        self.state().await
    }
}

impl ActorClient<DashboardState> for DashboardClient {
    fn inner(&self) -> &ResourceClient<DashboardState> {
        &self.inner
    }
}
