//! Driver-side fulfilment record of a DELIVERY order.

use crate::model::{Coordinate, LocationSample, OrderId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub u64);

impl From<u64> for DeliveryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Driver-facing delivery lifecycle.
///
/// `ASSIGNED → ACCEPTED → IN_TRANSIT → DELIVERED`, with `CANCELLED` reachable from
/// `ASSIGNED` or `ACCEPTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Assigned,
    Accepted,
    InTransit,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// Whether the backend's state machine has an edge from `self` to `target`.
    ///
    /// The backend enforces this; the client uses it only to decide which intents to
    /// offer and to recognise forward progress.
    pub fn can_transition_to(self, target: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, target),
            (Assigned, Accepted)
                | (Accepted, InTransit)
                | (InTransit, Delivered)
                | (Assigned, Cancelled)
                | (Accepted, Cancelled)
        )
    }

    /// The intents a driver is offered in this status.
    pub fn next_actions(self) -> &'static [DeliveryStatus] {
        use DeliveryStatus::*;
        match self {
            Assigned => &[Accepted, Cancelled],
            Accepted => &[InTransit, Cancelled],
            InTransit => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Assigned => "ASSIGNED",
            DeliveryStatus::Accepted => "ACCEPTED",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub current_latitude: Option<f64>,
    #[serde(default)]
    pub current_longitude: Option<f64>,
    #[serde(default)]
    pub total_deliveries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub driver: Option<DriverInfo>,
    #[serde(default, alias = "pickup_coords")]
    pub pickup: Option<Coordinate>,
    #[serde(default, alias = "destination_coords")]
    pub destination: Option<Coordinate>,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub destination_address: Option<String>,
}

impl Delivery {
    /// The driver's last reported position. Only meaningful while the delivery is in transit.
    pub fn driver_location(&self) -> Option<LocationSample> {
        if self.status != DeliveryStatus::InTransit {
            return None;
        }
        let driver = self.driver.as_ref()?;
        Some(LocationSample::at(
            Coordinate::new(driver.current_latitude?, driver.current_longitude?),
            Utc::now(),
        ))
    }
}

/// Which deliveries a driver lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryFilter {
    #[default]
    Active,
    Completed,
    All,
}

impl DeliveryFilter {
    pub fn as_query(self) -> &'static str {
        match self {
            DeliveryFilter::Active => "active",
            DeliveryFilter::Completed => "completed",
            DeliveryFilter::All => "all",
        }
    }
}
