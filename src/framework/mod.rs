//! Generic building blocks for owned client state and background work.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that state types implement to be owned by an actor
//! - [`ResourceActor`] - Generic actor that owns one entity and applies actions sequentially
//! - [`ResourceClient`] - Typed handle for reading the state and sending actions
//! - [`PeriodicTask`] - Cancellable fixed-interval loop (polling, location sampling)
//! - [`RequestSequence`] - Monotonic request tokens for latest-wins application
//!
//! # Testing
//!
//! Backends are mocked at the [`Backend`](crate::api::Backend) seam; see
//! [`crate::api::mock`].

pub mod core;
pub mod sequence;
pub mod task;

// Re-export core types for convenience
pub use core::*;
pub use sequence::{ApplyOutcome, RequestSequence};
pub use task::PeriodicTask;
