//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).

pub mod actor_client;
pub mod cart_client;
pub mod dashboard_client;
pub mod snapshot_client;

pub use actor_client::ActorClient;
pub use cart_client::*;
pub use dashboard_client::*;
pub use snapshot_client::*;
