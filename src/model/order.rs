//! Customer orders as reported by the backend.
//!
//! The backend owns the order's status. The client only ever replaces its copy with
//! a newer one; it never edits status locally.

use crate::model::{MenuItemId, Money};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Delivery,
    Collection,
}

impl OrderType {
    /// The flat surcharge for this order type: `flat_fee` for deliveries, zero otherwise.
    pub fn delivery_fee(self, flat_fee: Money) -> Money {
        match self {
            OrderType::Delivery => flat_fee,
            OrderType::Collection => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobileMoney,
}

/// Server-defined order lifecycle.
///
/// `PENDING → CONFIRMED → PROCESSING → READY → DISPATCHED → DELIVERED`, with
/// `CANCELLED` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Ready,
    Dispatched,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Index into the customer-facing progress bar (0..=5). Cancelled orders show no progress.
    pub fn step(self) -> u8 {
        match self {
            OrderStatus::Pending | OrderStatus::Cancelled => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Dispatched => 4,
            OrderStatus::Delivered => 5,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Orders in flight between confirmation and hand-over.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed
                | OrderStatus::Processing
                | OrderStatus::Ready
                | OrderStatus::Dispatched
        )
    }
}

/// One purchased item on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Derived order amounts. Always computed from line items, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl Totals {
    pub fn new(subtotal: Money, order_type: OrderType, flat_fee: Money) -> Self {
        let delivery_fee = order_type.delivery_fee(flat_fee);
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    pub order_type: OrderType,
    #[serde(default, alias = "delivery_address_line1")]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    #[serde(default)]
    pub has_delivery: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(OrderLine::line_total).sum()
    }

    pub fn totals(&self, flat_fee: Money) -> Totals {
        Totals::new(self.subtotal(), self.order_type, flat_fee)
    }
}

/// Line of a new order as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub special_instructions: String,
}

/// Payload for creating a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub order_type: OrderType,
    /// Empty for collection orders.
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
}

/// Which orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl OrderFilter {
    pub fn as_query(self) -> &'static str {
        match self {
            OrderFilter::All => "all",
            OrderFilter::Active => "active",
            OrderFilter::Completed => "completed",
        }
    }
}
