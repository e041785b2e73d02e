//! The normalized event stream the reconciliation engine emits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of change an [`OrderEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// An order now rests in the book (real or fabricated).
    Add,
    /// An order was removed from the book without being filled.
    Cancel,
    /// An order (or part of one) was filled.
    Exec,
    /// An order's quantity or price changed.
    Modify,
}

/// A single normalized event describing what the engine now believes happened.
///
/// `order_id` is [`crate::order::SYNTHETIC_EVENT_ORDER_ID`] (`-1`) for events describing
/// inferred liquidity the engine has not yet seen a real order message for.
///
/// Two events are compared for equality on `(kind, order_id, quantity, price)` only;
/// `is_sell` is deliberately excluded, matching the comparison tests replay against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: EventKind,
    pub order_id: i64,
    pub is_sell: bool,
    pub quantity: u64,
    pub price: Decimal,
}

impl OrderEvent {
    #[inline]
    pub fn new(kind: EventKind, order_id: i64, is_sell: bool, quantity: u64, price: Decimal) -> Self {
        Self {
            kind,
            order_id,
            is_sell,
            quantity,
            price,
        }
    }
}

impl PartialEq for OrderEvent {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.order_id == other.order_id
            && self.quantity == other.quantity
            && self.price == other.price
    }
}

impl Eq for OrderEvent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_side() {
        let a = OrderEvent::new(EventKind::Exec, 5, true, 60, Decimal::from(100));
        let b = OrderEvent::new(EventKind::Exec, 5, false, 60, Decimal::from(100));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_considers_quantity_and_price() {
        let a = OrderEvent::new(EventKind::Exec, 5, true, 60, Decimal::from(100));
        let b = OrderEvent::new(EventKind::Exec, 5, true, 61, Decimal::from(100));
        assert_ne!(a, b);
    }
}
