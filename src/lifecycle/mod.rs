//! # Session Lifecycle & Orchestration
//!
//! Everything that runs on behalf of a signed-in user is started here and torn down
//! here. There is no ambient global state: the [`AppSystem`] context object carries
//! the session, the role's services and the handles of their tasks.
//!
//! ## Role Dispatch
//!
//! The role is resolved once at login and dispatched once into [`RoleServices`]:
//!
//! - **Customer**: the cart actor (hydrated from the local store) and order history
//! - **Driver**: the live dashboard with its badges poller
//!
//! Trackers are created on demand with [`AppSystem::tracker`], one per tracked
//! order or delivery. A tracker owns its poller and location stream and cancels them
//! when stopped or dropped, so a view that goes away takes its timers with it.
//!
//! ## Shutdown
//!
//! [`AppSystem::shutdown`] stops the pollers, drops the clients (closing each
//! actor's channel) and awaits the actor tasks. [`AppSystem::logout`] does the same
//! and then clears the persisted session and cart.

pub mod app_system;
pub mod tracing;

pub use app_system::*;
pub use self::tracing::setup_tracing;
