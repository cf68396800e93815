//! Serde data types mirroring the backend's resources, plus the client-owned cart.
//!
//! Everything here is plain data. The state actors that own instances of these types
//! live in [`crate::cart`], [`crate::tracker`] and [`crate::dashboard`].

pub mod cart;
pub mod delivery;
pub mod driver;
pub mod geo;
pub mod order;
pub mod user;

pub use cart::*;
pub use delivery::*;
pub use driver::*;
pub use geo::*;
pub use order::*;
pub use user::*;

/// Monetary amounts. Exact decimal arithmetic so totals never drift.
pub type Money = rust_decimal::Decimal;
