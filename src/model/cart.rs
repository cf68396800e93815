//! The client-owned shopping cart.
//!
//! Unlike orders and deliveries, the cart has no server-side counterpart until checkout.
//! Every retained line has `quantity >= 1`; a line whose quantity reaches zero is removed.

use crate::model::{Money, NewOrderItem, OrderType, Totals};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(pub u64);

impl From<u64> for MenuItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for MenuItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Menu item details captured when the item is put in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Money,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn new(id: impl Into<MenuItemId>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: CartItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.item.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: MenuItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item.id == id)
    }

    /// Number of units across all lines (the cart badge).
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Adds `delta` units of `item`, inserting a new line if needed.
    ///
    /// The resulting quantity is clamped at zero and a zero line is dropped, so a
    /// negative delta for an absent item is a no-op.
    pub fn add_or_update(&mut self, item: CartItem, delta: i64) {
        if self.line(item.id).is_some() {
            self.update_quantity(item.id, delta);
        } else if delta > 0 {
            self.lines.push(CartLine {
                item,
                quantity: clamp_quantity(delta),
            });
        }
    }

    /// Adjusts an existing line. Absent items are ignored.
    pub fn update_quantity(&mut self, id: MenuItemId, delta: i64) {
        for line in self.lines.iter_mut().filter(|line| line.item.id == id) {
            line.quantity = clamp_quantity(i64::from(line.quantity).saturating_add(delta));
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    pub fn remove(&mut self, id: MenuItemId) {
        self.lines.retain(|line| line.item.id != id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn totals(&self, order_type: OrderType, flat_fee: Money) -> Totals {
        Totals::new(self.subtotal(), order_type, flat_fee)
    }

    pub fn order_items(&self) -> Vec<NewOrderItem> {
        self.lines
            .iter()
            .map(|line| NewOrderItem {
                menu_item_id: line.item.id,
                quantity: line.quantity,
                special_instructions: String::new(),
            })
            .collect()
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    quantity.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn burger() -> CartItem {
        CartItem::new(1, "Burger", dec!(8.99))
    }

    fn pizza() -> CartItem {
        CartItem::new(2, "Pizza", dec!(12.99))
    }

    #[test]
    fn test_two_line_delivery_totals() {
        let mut cart = Cart::default();
        cart.add_or_update(burger(), 2);
        cart.add_or_update(pizza(), 1);

        let totals = cart.totals(OrderType::Delivery, dec!(5.00));
        assert_eq!(totals.subtotal, dec!(30.97));
        assert_eq!(totals.delivery_fee, dec!(5.00));
        assert_eq!(totals.total, dec!(35.97));

        let collection = cart.totals(OrderType::Collection, dec!(5.00));
        assert_eq!(collection.delivery_fee, Decimal::ZERO);
        assert_eq!(collection.total, dec!(30.97));
    }

    #[test]
    fn test_quantities_never_drop_below_one() {
        let mut cart = Cart::default();
        cart.add_or_update(burger(), 1);
        cart.add_or_update(burger(), 2);
        assert_eq!(cart.line(MenuItemId(1)).unwrap().quantity, 3);

        for delta in [-1, 4, -10, 1, -1] {
            cart.add_or_update(burger(), delta);
            assert!(cart.lines.iter().all(|line| line.quantity >= 1));
        }
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add_or_update(burger(), 1);
        cart.add_or_update(pizza(), 2);

        cart.update_quantity(MenuItemId(1), -1);
        assert!(cart.line(MenuItemId(1)).is_none());
        assert_eq!(cart.lines.len(), 1);

        // Removing or decrementing an absent item is a no-op.
        cart.remove(MenuItemId(1));
        cart.update_quantity(MenuItemId(1), -3);
        cart.add_or_update(burger(), -1);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_order_items_carry_quantities() {
        let mut cart = Cart::default();
        cart.add_or_update(pizza(), 3);
        let items = cart.order_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].menu_item_id, MenuItemId(2));
        assert_eq!(items[0].quantity, 3);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let mut cart = Cart::default();
        cart.add_or_update(burger(), i64::MAX);
        cart.add_or_update(burger(), i64::MAX);
        cart.add_or_update(pizza(), i64::from(u32::MAX));
        assert_eq!(cart.line(MenuItemId(1)).unwrap().quantity, u32::MAX);
        assert_eq!(cart.item_count(), 2 * u64::from(u32::MAX));

        cart.update_quantity(MenuItemId(1), i64::MIN);
        assert!(cart.line(MenuItemId(1)).is_none());
    }
}
