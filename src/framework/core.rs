//! # Core State Actor
//!
//! This module defines the generic building blocks for single-writer client state.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait that every piece of owned state must implement.
//! - [`ResourceActor`]: The generic actor that owns one entity and applies messages to it.
//! - [`ResourceClient`]: The generic client for communicating with the actor.
//! - [`FrameworkError`]: Channel-level failures (actor gone, response dropped).

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any piece of client state must implement to be owned by a [`ResourceActor`].
///
/// # Architecture Note
/// The cart, the tracker snapshot and the driver dashboard all follow the same rule:
/// exactly one task owns the value and every change arrives as a message. Writing the
/// message loop once here keeps that rule in one place.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so an action can await other services (the cart's checkout
/// awaits the backend). The `Context` associated type is injected into every hook when the
/// actor is started, which lets dependencies be wired after construction.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// Enum of the mutations this state accepts.
    type Action: Send + Sync + Debug;

    /// The value returned to the caller once an action has been applied.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// Per-actor error type. Channel failures are folded into it through `From`.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// Called once, before the first message is processed.
    /// Use this hook to hydrate state from persistence.
    async fn on_start(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Apply an action to the owned state.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

/// Internal message type sent to the actor.
///
/// There are only two shapes: read a copy of the state, or apply an action to it.
/// Every domain-specific mutation is an [`ActorEntity::Action`] variant.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Get {
        respond_to: Response<T, T::Error>,
    },
    Action {
        action: T::Action,
        respond_to: Response<T::ActionResult, T::Error>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that owns one entity.
///
/// **Concurrency Model**:
/// The actor processes its messages *sequentially*, so the entity never needs a
/// `Mutex`. An action that awaits (e.g. a checkout waiting on the backend) holds the
/// queue until it completes, which is exactly the serialization the owned state needs.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    state: T,
}

impl<T: ActorEntity> ResourceActor<T> {
    pub fn new(buffer_size: usize, initial: T) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            state: initial,
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    pub async fn run(mut self, context: T::Context) {
        // Extract just the type name (e.g., "Cart" instead of "order_tracker::model::cart::Cart")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");

        if let Err(e) = self.state.on_start(&context).await {
            warn!(entity_type, error = %e, "on_start failed, continuing with initial state");
        }
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Get { respond_to } => {
                    debug!(entity_type, "Get");
                    let _ = respond_to.send(Ok(self.state.clone()));
                }
                ResourceRequest::Action { action, respond_to } => {
                    debug!(entity_type, ?action, "Action");
                    let result = self.state.handle_action(action, &context).await;
                    match &result {
                        Ok(_) => debug!(entity_type, "Action ok"),
                        Err(e) => warn!(entity_type, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`ResourceActor`].
#[derive(Clone)]
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn get(&self) -> Result<T, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Get { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn perform_action(&self, action: T::Action) -> Result<T::ActionResult, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Action { action, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }
}
