//! Display routes between a pickup and a destination.
//!
//! Routing is delegated to an external service behind [`RouteProvider`]. Callers go
//! through [`fetch_route`], which never fails: any provider error degrades to the
//! two-point straight line.

pub mod osrm;

pub use osrm::OsrmRouter;

use crate::model::{Coordinate, Route};
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Routing service unreachable: {0}")]
    Network(String),
    #[error("Routing service answered {0}")]
    NoRoute(String),
    #[error("Malformed routing response: {0}")]
    Malformed(String),
}

/// Source of road geometry between two points.
#[async_trait]
pub trait RouteProvider: Send + Sync + 'static {
    async fn route(
        &self,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, RoutingError>;
}

/// Asks `provider` for a route, falling back to `[pickup, destination]` on any failure.
pub async fn fetch_route(
    provider: &dyn RouteProvider,
    pickup: Coordinate,
    destination: Coordinate,
) -> Route {
    match provider.route(pickup, destination).await {
        Ok(points) if !points.is_empty() => Route::from_service(points),
        Ok(_) => {
            warn!("Routing service returned an empty path, using straight line");
            Route::straight_line(pickup, destination)
        }
        Err(e) => {
            warn!(error = %e, "Route fetch failed, using straight line");
            Route::straight_line(pickup, destination)
        }
    }
}
