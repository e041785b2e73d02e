//! The two-sided coordinator: routes each inbound message to the affected
//! [`BookSide`](crate::book_side::BookSide)s and stitches their event streams together.

use crate::book_side::BookSide;
use crate::config::ReconciliationPolicy;
use crate::event::{EventKind, OrderEvent};
use crate::l2::L2Book;
use crate::message::{OrderMessage, SnapshotMessage, TradeMessage};
use crate::order::Order;

/// §4.3. Owns both sides of one instrument's book and is the unit
/// [`crate::manager::BookManager`] drives per instrument.
pub struct OrderBook {
    bid: BookSide,
    ask: BookSide,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::with_policy(ReconciliationPolicy::default())
    }

    pub fn with_policy(policy: ReconciliationPolicy) -> Self {
        Self {
            bid: BookSide::with_policy(false, policy),
            ask: BookSide::with_policy(true, policy),
        }
    }

    fn side(&self, is_sell: bool) -> &BookSide {
        if is_sell {
            &self.ask
        } else {
            &self.bid
        }
    }

    fn side_mut(&mut self, is_sell: bool) -> &mut BookSide {
        if is_sell {
            &mut self.ask
        } else {
            &mut self.bid
        }
    }

    pub fn exist_order(&self, order_id: i64, is_sell: bool) -> bool {
        self.side(is_sell).exist_order(order_id)
    }

    /// §4.3: absorb against this side's own pending adds first, then uncross against
    /// the opposite side, then rest whatever remains. A duplicate `order_id` is a
    /// full no-op (§8, P4): nothing is matched, nothing crosses, nothing is emitted.
    pub fn process_order_add_message(&mut self, msg: OrderMessage) -> Vec<OrderEvent> {
        if self.side(msg.is_sell).exist_order(msg.order_id) {
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut order = Order::new(msg.order_id, msg.is_sell, msg.quantity, msg.price);

        let matched = self.side_mut(msg.is_sell).match_pending_liq_add(msg.quantity, msg.price);
        order.filled_quantity += matched;
        if order.remaining_quantity() == 0 {
            return events;
        }

        if self.side(!msg.is_sell).book_crossed_with_price(msg.price) {
            let uncross_events = self.side_mut(!msg.is_sell).process_crossed_order(&mut order);
            self.side_mut(msg.is_sell).add_pending_liq_remove_qty(&uncross_events);
            events.extend(uncross_events);
        }

        if order.remaining_quantity() == 0 {
            return events;
        }

        let remaining = order.remaining_quantity();
        self.side_mut(msg.is_sell).add_order(order);
        events.push(OrderEvent::new(EventKind::Add, msg.order_id, msg.is_sell, remaining, msg.price));
        events
    }

    pub fn process_order_cancel_message(&mut self, msg: OrderMessage) -> Vec<OrderEvent> {
        self.side_mut(msg.is_sell).process_order_cancel(msg.order_id, msg.quantity, msg.price)
    }

    /// §4.3: simulated as a cancel of the order's current remaining quantity followed
    /// by a fresh add at the new price/quantity. Only the synthetic `MODIFY` event is
    /// surfaced — the cancel/add steps are applied for their book mutation alone, not
    /// for the events they'd otherwise produce.
    pub fn process_order_modify_message(&mut self, msg: OrderMessage) -> Vec<OrderEvent> {
        let events = vec![OrderEvent::new(EventKind::Modify, msg.order_id, msg.is_sell, msg.quantity, msg.price)];

        if !self.side(msg.is_sell).exist_order(msg.order_id) {
            return events;
        }

        let current_remaining = self
            .side(msg.is_sell)
            .get_order(msg.order_id)
            .expect("exist_order just confirmed this")
            .remaining_quantity();

        let _ = self.process_order_cancel_message(OrderMessage::cancel(
            msg.order_id,
            msg.is_sell,
            current_remaining,
            msg.price,
        ));
        let _ = self.process_order_add_message(OrderMessage::add(msg.order_id, msg.is_sell, msg.quantity, msg.price));

        events
    }

    pub fn process_trade_message(&mut self, trade: TradeMessage) -> Vec<OrderEvent> {
        let mut events = self.bid.process_trade(trade);
        events.extend(self.ask.process_trade(trade));
        events
    }

    pub fn process_snapshot_message(&mut self, msg: &SnapshotMessage) -> Vec<OrderEvent> {
        let mut events = self.bid.process_l2_snapshot(&msg.bid_levels);
        events.extend(self.ask.process_l2_snapshot(&msg.ask_levels));
        events
    }

    pub fn l2_book(&self) -> L2Book {
        L2Book::new(self.bid.l2_levels(), self.ask.l2_levels())
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
