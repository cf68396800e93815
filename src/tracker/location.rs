//! Sources of the device's own position.

use crate::model::{Coordinate, LocationSample};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Reads the current position of the device (GPS or a simulator).
#[async_trait]
pub trait LocationSource: Send + Sync + 'static {
    async fn current_position(&self) -> Result<LocationSample, LocationError>;
}

/// Walks a fixed path one point per reading, then stays at the last point.
///
/// Used by the demo binary and by tests that need a moving driver.
pub struct PathLocationSource {
    points: Vec<Coordinate>,
    cursor: AtomicUsize,
}

impl PathLocationSource {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self {
            points,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LocationSource for PathLocationSource {
    async fn current_position(&self) -> Result<LocationSample, LocationError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let point = self
            .points
            .get(index)
            .or_else(|| self.points.last())
            .ok_or_else(|| LocationError::Unavailable("empty path".to_string()))?;
        Ok(LocationSample::at(*point, Utc::now()))
    }
}
