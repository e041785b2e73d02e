#![deny(unused_must_use)]
//! Cross-stream reconciliation for a limit order book. Merges an order-lifecycle
//! feed, a trade-print feed, and a periodic L2 snapshot feed, any of which may
//! arrive out of order relative to the others, into one consistent L3 book and a
//! normalized stream of the events that explain how it got there.

pub mod book_side;
pub use book_side::BookSide;

pub mod config;
pub use config::ReconciliationPolicy;

pub mod error;
pub use error::ReplayError;

pub mod event;
pub use event::{EventKind, OrderEvent};

pub mod l2;
pub use l2::L2Book;

pub mod manager;
pub use manager::{BookManager, BookManagerCallbacks};

pub mod message;
pub use message::{MessageKind, OrderMessage, SnapshotMessage, TradeMessage};

pub mod order;
pub use order::{Order, OrderSide};

pub mod orderbook;
pub use orderbook::OrderBook;

pub mod price_level;
pub use price_level::{L2Level, L3Level};

/// Cross-module checks that don't belong to any single component: the invariants a
/// reconciled book must hold regardless of message order.
#[cfg(test)]
mod invariants_tests {
    use super::*;
    use rust_decimal::Decimal;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn assert_no_empty_levels(book: &OrderBook) {
        let l2 = book.l2_book();
        assert!(l2.bid_levels.iter().all(|l| l.quantity > 0));
        assert!(l2.ask_levels.iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn p2_no_level_ever_left_empty() {
        let mut book = OrderBook::new();
        book.process_order_add_message(OrderMessage::add(1, true, 40, d(104)));
        book.process_order_add_message(OrderMessage::add(2, false, 40, d(104)));
        assert_no_empty_levels(&book);
    }

    #[test]
    fn p3_book_never_left_crossed() {
        let mut book = OrderBook::new();
        book.process_order_add_message(OrderMessage::add(1, true, 60, d(100)));
        book.process_order_add_message(OrderMessage::add(2, false, 100, d(102)));
        let l2 = book.l2_book();
        if let (Some(bid), Some(ask)) = (l2.best_bid(), l2.best_ask()) {
            assert!(bid.price < ask.price);
        }
    }

    #[test]
    fn p4_duplicate_add_is_fully_idempotent() {
        let mut manager = BookManager::new();
        manager.process_order_message(OrderMessage::add(1, true, 40, d(104)));
        let before = manager.l2_book();

        manager.process_order_message(OrderMessage::add(1, true, 999, d(1)));
        let after = manager.l2_book();

        assert_eq!(before, after);
        assert!(manager.pending_events().is_empty(), "no events for a duplicate id");
    }

    #[test]
    fn p5_cancel_of_unknown_id_is_noop() {
        let mut book = OrderBook::new();
        book.process_order_add_message(OrderMessage::add(1, true, 40, d(104)));
        let before = book.l2_book();

        let events = book.process_order_cancel_message(OrderMessage::cancel(999, true, 1, d(104)));

        assert!(events.is_empty());
        assert_eq!(before, book.l2_book());
    }

    struct Recorder {
        events: Vec<OrderEvent>,
    }

    impl BookManagerCallbacks for Recorder {
        fn on_order_add(&mut self, event: &OrderEvent) {
            self.events.push(*event);
        }
        fn on_order_cancel(&mut self, event: &OrderEvent) {
            self.events.push(*event);
        }
        fn on_order_execution(&mut self, event: &OrderEvent) {
            self.events.push(*event);
        }
        fn on_order_modify(&mut self, event: &OrderEvent) {
            self.events.push(*event);
        }
    }

    #[test]
    fn p7_round_trip_replays_to_the_same_l2_projection() {
        let mut manager = BookManager::new();
        manager.process_order_message(OrderMessage::add(1, true, 40, d(104)));
        manager.process_order_message(OrderMessage::add(2, true, 80, d(103)));
        manager.process_order_message(OrderMessage::add(3, false, 30, d(101)));
        manager.process_order_message(OrderMessage::cancel(2, true, 80, d(103)));

        let mut recorder = Recorder { events: Vec::new() };
        manager.flush_events(&mut recorder);

        let mut replay = OrderBook::new();
        for event in &recorder.events {
            match event.kind {
                EventKind::Add => {
                    replay.process_order_add_message(OrderMessage::add(
                        event.order_id,
                        event.is_sell,
                        event.quantity,
                        event.price,
                    ));
                }
                EventKind::Cancel => {
                    replay.process_order_cancel_message(OrderMessage::cancel(
                        event.order_id,
                        event.is_sell,
                        event.quantity,
                        event.price,
                    ));
                }
                EventKind::Exec | EventKind::Modify => {}
            }
        }

        assert_eq!(manager.l2_book(), replay.l2_book());
    }

    #[test]
    fn p8_pending_maps_are_erased_at_zero_not_merely_zeroed() {
        let mut book = OrderBook::new();
        book.process_trade_message(TradeMessage::new(30, d(99)));
        let events = book.process_order_add_message(OrderMessage::add(1, false, 30, d(99)));
        assert!(events.is_empty(), "fully absorbed by the pending add");
        assert!(book.l2_book().bid_levels.is_empty(), "no leftover phantom level");
    }

    #[test]
    fn boundary_empty_book_cancel_and_modify() {
        let mut book = OrderBook::new();
        assert!(book
            .process_order_cancel_message(OrderMessage::cancel(1, true, 10, d(100)))
            .is_empty());

        let events = book.process_order_modify_message(OrderMessage::modify(1, true, 10, d(100)));
        assert_eq!(events.len(), 1, "the synthetic MODIFY event is still emitted");
    }

    #[test]
    fn boundary_snapshot_with_no_levels_clears_the_reconciled_side() {
        let mut book = OrderBook::new();
        book.process_order_add_message(OrderMessage::add(1, true, 40, d(104)));

        let msg = SnapshotMessage::new(vec![], vec![]);
        book.process_snapshot_message(&msg);

        assert!(book.l2_book().ask_levels.is_empty());
    }

    #[test]
    fn boundary_trade_with_no_resting_liquidity_is_pure_phase_d() {
        let mut book = OrderBook::new();
        let events = book.process_trade_message(TradeMessage::new(15, d(50)));
        assert_eq!(events.len(), 4, "ADD+EXEC on each side, neither side has resting depth");
    }

    #[test]
    fn boundary_aggressive_order_exhausts_opposite_side_entirely() {
        let mut book = OrderBook::new();
        book.process_order_add_message(OrderMessage::add(1, true, 40, d(100)));
        let events = book.process_order_add_message(OrderMessage::add(2, false, 40, d(100)));

        assert_eq!(events, vec![OrderEvent::new(EventKind::Exec, 1, true, 40, d(100))]);
        assert!(book.l2_book().ask_levels.is_empty());
        assert!(!book.exist_order(2, false));
    }
}
