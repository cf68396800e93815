//! # Order Tracker
//!
//! > **The client-side core of a food ordering and delivery app.**
//!
//! This crate holds the stateful logic that sits between a mobile presentation layer
//! and the ordering backend: the customer's cart, the live view of an order and its
//! delivery, the driver's dashboard and location stream, and the session that ties
//! them together. Screens render read-only snapshots produced here and send named
//! intents (add to cart, checkout, accept, start, complete, cancel) back in.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### The backend is the authority
//! Order and delivery statuses belong to the server. The client never moves a status
//! on its own: an intent is sent, and the cached snapshot changes only once the
//! backend confirms it. A refused transition leaves the last confirmed status on
//! screen and surfaces a recoverable error.
//!
//! ### One owner per piece of state
//! The cart, each tracker snapshot and the driver dashboard are each owned by a single
//! Tokio task (a state actor). Every change arrives as a message and is applied in
//! order, so no state sits behind a lock.
//!
//! ### Latest wins
//! Every read of server state takes a token from a [`RequestSequence`](framework::RequestSequence)
//! when it is issued. State actors apply a response only if its token is newer than
//! the last one applied, so a slow poll can never overwrite a newer answer.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Backend failures are classified once into [`ClientError`](api::ClientError)
//! (`Network`, `NotFound`, `ValidationError`, `RejectedTransition`, ...). Component
//! errors wrap it with `#[from]` next to the actor channel's `FrameworkError`.
//!
//! ### 2. Structured Cancellation
//! Timers are [`PeriodicTask`](framework::PeriodicTask)s: fixed-interval loops that
//! never overlap a slow cycle and stop when their owner stops or is dropped.
//!
//! ### 3. Observability
//! `tracing` everywhere with structured fields. See [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic state actor, request tokens and periodic tasks.
//!
//! ### 2. The Boundary ([`api`], [`routing`], [`store`])
//! The [`Backend`](api::Backend) trait with its HTTP and mock implementations, the
//! external routing service, and the local key-value store.
//!
//! ### 3. The Components ([`cart`], [`tracker`], [`dashboard`], [`session`])
//! - **Cart**: client-owned, persisted on every change, cleared on successful checkout.
//! - **Tracker**: one order/delivery snapshot with polling, transitions, location and route.
//! - **Dashboard**: driver counters and active delivery, plus customer order history.
//! - **Session**: sign-in with a bounded wait, restore, sign-out.
//!
//! ### 4. The Interface ([`clients`])
//! Typed wrappers around the actors' generic clients.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`AppSystem`](lifecycle::AppSystem) starts the services for a session's role and
//! shuts them all down again.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo against a local backend
//! ORDER_TRACKER_EMAIL=driver@example.com ORDER_TRACKER_PASSWORD=secret \
//!     RUST_LOG=info cargo run -- config.toml
//!
//! # Run the tests
//! cargo test
//! ```

pub mod api;
pub mod cart;
pub mod clients;
pub mod config;
pub mod dashboard;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod routing;
pub mod session;
pub mod store;
pub mod tracker;
