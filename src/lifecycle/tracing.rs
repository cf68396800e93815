//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); state actors tag
//! their lines with an `entity_type` field instead.
//!
//! ## Usage
//!
//! ```bash
//! # Lifecycle, transitions and failures
//! RUST_LOG=info cargo run
//!
//! # Every poll, actor message and HTTP status
//! RUST_LOG=debug cargo run
//!
//! # Only the tracker
//! RUST_LOG=order_tracker::tracker=debug cargo run
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle**: start and shutdown of the cart, snapshot and dashboard actors
//! - **Backend calls**: one span per call (`#[instrument]`), with the HTTP status at `debug`
//! - **Latest-wins decisions**: discarded stale responses at `debug`
//! - **Dropped work**: failed location pushes and failed polls at `warn`
//!
//! A typical driver session at `info`:
//!
//! ```text
//! INFO Actor started entity_type="DashboardState"
//! INFO Periodic task started task="driver-dashboard" period_ms=30000
//! INFO request_transition: Transition confirmed delivery_id=3 status=ACCEPTED
//! WARN Dropping location sample delivery_id=3 error=Network error: request timed out
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // entity_type and task fields identify the source
        .compact()
        .init();
}
