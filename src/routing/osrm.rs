//! OSRM HTTP route provider.

use crate::config::RoutingConfig;
use crate::model::Coordinate;
use crate::routing::{RouteProvider, RoutingError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: `[longitude, latitude]`.
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouter {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RoutingError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, pickup: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url,
            pickup.longitude,
            pickup.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

/// Extracts the first route's geometry from an OSRM body.
pub fn parse_osrm(body: &str) -> Result<Vec<Coordinate>, RoutingError> {
    let response: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Malformed(e.to_string()))?;
    if response.code != "Ok" {
        return Err(RoutingError::NoRoute(response.code));
    }
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::NoRoute("no routes".to_string()))?;
    if route.geometry.coordinates.is_empty() {
        return Err(RoutingError::Malformed("empty geometry".to_string()));
    }
    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(|[longitude, latitude]| Coordinate::new(latitude, longitude))
        .collect())
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    #[instrument(skip(self))]
    async fn route(
        &self,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, RoutingError> {
        let response = self
            .client
            .get(self.url(pickup, destination))
            .send()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), "Routing response");
        if !status.is_success() {
            return Err(RoutingError::NoRoute(format!("HTTP {}", status.as_u16())));
        }
        parse_osrm(&body)
    }
}
