//! Price level data structures: the L3 FIFO queue and its L2 aggregate projection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tinyvec::TinyVec;

use crate::order::Order;

/// The threshold at which a level's FIFO queue switches from inline array storage to
/// heap storage. Most levels in a liquid book hold well under this many resting orders.
const LEVEL_INNER_CAPACITY: usize = 16;

/// An aggregated, order-count-free view of one price level. This is the unit the
/// L2 projection and the snapshot-reconciliation queue both traffic in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct L2Level {
    pub price: Decimal,
    pub quantity: u64,
}

impl L2Level {
    #[inline]
    pub fn new(price: Decimal, quantity: u64) -> Self {
        Self { price, quantity }
    }
}

/// One price level of the L3 book: an aggregate quantity plus the FIFO queue of
/// resting orders that back it, in arrival (price-time priority) order.
#[derive(Debug, Default)]
pub struct L3Level {
    pub price: Decimal,
    aggregate_quantity: u64,
    orders: TinyVec<[Order; LEVEL_INNER_CAPACITY]>,
}

impl L3Level {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            aggregate_quantity: 0,
            orders: TinyVec::new(),
        }
    }

    #[inline]
    pub fn aggregate_quantity(&self) -> u64 {
        self.aggregate_quantity
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Iterate the FIFO queue in arrival (price-time priority) order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter()
    }

    #[inline]
    pub fn to_l2(&self) -> L2Level {
        L2Level::new(self.price, self.aggregate_quantity)
    }

    /// Appends `order` to the back of the FIFO. Caller has already checked the order
    /// isn't a duplicate and belongs at this level's price.
    pub fn add_order(&mut self, order: Order) {
        debug_assert_eq!(order.price, self.price);
        self.aggregate_quantity += order.remaining_quantity();
        self.orders.push(order);
    }

    /// Removes and returns the order with the given id, if present.
    pub fn remove_order(&mut self, order_id: i64) -> Option<Order> {
        let index = self.orders.iter().position(|o| o.order_id == order_id)?;
        let order = self.orders.remove(index);
        self.aggregate_quantity -= order.remaining_quantity();
        Some(order)
    }

    /// Pure quantity modification; `new_price` must equal this level's price.
    pub fn modify_order(&mut self, order_id: i64, new_quantity: u64) -> Option<Order> {
        let order = self.orders.iter_mut().find(|o| o.order_id == order_id)?;
        self.aggregate_quantity =
            self.aggregate_quantity + new_quantity - order.original_quantity;
        order.original_quantity = new_quantity;
        Some(*order)
    }

    /// Fills `qty` against the given order; `qty` must not exceed its remaining
    /// quantity. Does not remove the order even if it becomes fully filled — the
    /// caller decides whether and when to remove an exhausted order.
    pub fn fill_order(&mut self, order_id: i64, qty: u64) -> Option<Order> {
        let order = self.orders.iter_mut().find(|o| o.order_id == order_id)?;
        debug_assert!(qty <= order.remaining_quantity());
        order.filled_quantity += qty;
        self.aggregate_quantity -= qty;
        Some(*order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn add_order_updates_aggregate_and_count() {
        let mut level = L3Level::new(d(100));
        level.add_order(Order::new(1, true, 40, d(100)));
        level.add_order(Order::new(2, true, 60, d(100)));
        assert_eq!(level.aggregate_quantity(), 100);
        assert_eq!(level.order_count(), 2);
        let ids: Vec<_> = level.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2], "FIFO order preserved");
    }

    #[test]
    fn remove_order_updates_aggregate() {
        let mut level = L3Level::new(d(100));
        level.add_order(Order::new(1, true, 40, d(100)));
        level.add_order(Order::new(2, true, 60, d(100)));
        let removed = level.remove_order(1).unwrap();
        assert_eq!(removed.order_id, 1);
        assert_eq!(level.aggregate_quantity(), 60);
        assert_eq!(level.order_count(), 1);
        assert!(level.remove_order(99).is_none());
    }

    #[test]
    fn fill_order_does_not_remove() {
        let mut level = L3Level::new(d(100));
        level.add_order(Order::new(1, true, 40, d(100)));
        let order = level.fill_order(1, 40).unwrap();
        assert_eq!(order.remaining_quantity(), 0);
        assert_eq!(level.aggregate_quantity(), 0);
        assert_eq!(level.order_count(), 1, "fill never removes the order");
    }

    #[test]
    fn modify_order_changes_aggregate_by_delta() {
        let mut level = L3Level::new(d(100));
        level.add_order(Order::new(1, true, 40, d(100)));
        level.add_order(Order::new(2, true, 60, d(100)));
        level.modify_order(1, 80).unwrap();
        assert_eq!(level.aggregate_quantity(), 140);
    }
}
