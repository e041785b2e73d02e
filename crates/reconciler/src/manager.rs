//! The embedding application's entry point: a thin facade over [`OrderBook`] that
//! buffers emitted events and dispatches them to caller-supplied callbacks.

use crate::event::{EventKind, OrderEvent};
use crate::l2::L2Book;
use crate::message::{MessageKind, OrderMessage, SnapshotMessage, TradeMessage};
use crate::orderbook::OrderBook;

/// One method per distinct book-state transition, implemented by whatever downstream
/// consumer embeds this engine. Mirrors the teacher's own callback-trait pattern for
/// its order-matching surface.
pub trait BookManagerCallbacks {
    fn on_order_add(&mut self, event: &OrderEvent);
    fn on_order_cancel(&mut self, event: &OrderEvent);
    fn on_order_execution(&mut self, event: &OrderEvent);
    fn on_order_modify(&mut self, event: &OrderEvent);
}

/// §4.4. Owns one instrument's [`OrderBook`] plus the buffer of events it has emitted
/// but not yet flushed to a [`BookManagerCallbacks`] implementation.
#[derive(Default)]
pub struct BookManager {
    book: OrderBook,
    pending_events: Vec<OrderEvent>,
}

impl BookManager {
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn with_book(book: OrderBook) -> Self {
        Self {
            book,
            pending_events: Vec::new(),
        }
    }

    /// Dispatches on `msg.kind`. A kind other than `Add`/`Cancel`/`Modify` is logged
    /// and dropped: this message type is shared with trade and snapshot messages at
    /// the wire level, and a decoder bug routing one of those here should not panic
    /// the engine (§7).
    pub fn process_order_message(&mut self, msg: OrderMessage) {
        let events = match msg.kind {
            MessageKind::Add => self.book.process_order_add_message(msg),
            MessageKind::Cancel => self.book.process_order_cancel_message(msg),
            MessageKind::Modify => self.book.process_order_modify_message(msg),
            other => {
                tracing::warn!(kind = ?other, order_id = msg.order_id, "dropping order message with unexpected kind");
                return;
            }
        };
        self.pending_events.extend(events);
    }

    pub fn process_trade_message(&mut self, msg: TradeMessage) {
        let events = self.book.process_trade_message(msg);
        self.pending_events.extend(events);
    }

    pub fn process_snapshot_message(&mut self, msg: &SnapshotMessage) {
        let events = self.book.process_snapshot_message(msg);
        self.pending_events.extend(events);
    }

    pub fn l2_book(&self) -> L2Book {
        self.book.l2_book()
    }

    /// Dispatches every buffered event to `callbacks`, in emission order, then clears
    /// the buffer. No reordering, no deduplication.
    pub fn flush_events(&mut self, callbacks: &mut impl BookManagerCallbacks) {
        for event in self.pending_events.drain(..) {
            match event.kind {
                EventKind::Add => callbacks.on_order_add(&event),
                EventKind::Cancel => callbacks.on_order_cancel(&event),
                EventKind::Exec => callbacks.on_order_execution(&event),
                EventKind::Modify => callbacks.on_order_modify(&event),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_events(&self) -> &[OrderEvent] {
        &self.pending_events
    }
}
