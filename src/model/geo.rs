//! Coordinates, live position samples and display routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One reading of the driver's position. Superseded by every newer sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn at(position: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            speed: None,
            heading: None,
            accuracy: None,
            timestamp,
        }
    }

    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Where a [`Route`]'s geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteSource {
    /// Geometry returned by the routing service.
    Service,
    /// Two-point line used when the routing service could not answer.
    StraightLine,
}

/// Ordered path from pickup to destination, used only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<Coordinate>,
    pub source: RouteSource,
}

impl Route {
    pub fn from_service(points: Vec<Coordinate>) -> Self {
        Self {
            points,
            source: RouteSource::Service,
        }
    }

    pub fn straight_line(pickup: Coordinate, destination: Coordinate) -> Self {
        Self {
            points: vec![pickup, destination],
            source: RouteSource::StraightLine,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RouteSource::StraightLine
    }
}
