use crate::framework::{ActorEntity, ResourceClient};
use async_trait::async_trait;

/// Shared behaviour of the typed clients that wrap a [`ResourceClient`].
///
/// Implementors only expose their inner client; reading the current state comes for free.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// A copy of the actor's current state.
    #[tracing::instrument(skip(self))]
    async fn state(&self) -> Result<T, T::Error> {
        tracing::debug!("Sending request");
        self.inner().get().await
    }
}
