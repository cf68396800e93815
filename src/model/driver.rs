//! Driver dashboard figures. Computed by the backend; the client only displays them.

use crate::model::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverStats {
    pub pending_deliveries: u32,
    pub in_transit: u32,
    pub completed_today: u32,
    pub total_earnings_today: Money,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Earnings {
    pub today: Money,
    pub week: Money,
    pub month: Money,
    pub total: Money,
    pub deliveries_today: u32,
    pub deliveries_week: u32,
    pub deliveries_month: u32,
}
