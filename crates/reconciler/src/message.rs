//! Inbound message types. Feed decoding, transport, and sequencing are out of scope
//! (§1) — these are the shapes a decoder hands to [`crate::manager::BookManager`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::price_level::L2Level;

/// The wire-level tag carried by an [`OrderMessage`].
///
/// This mirrors the source's single `MessageType` enum, which also carries tags
/// (`EXEC`, `TRADE`, `SNAPSHOT`) that never legally appear on an order message — those
/// variants exist so [`crate::manager::BookManager::process_order_message`] has a real
/// wildcard arm to log against (§7, "unknown message type") rather than that case
/// being ruled out by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Add,
    Cancel,
    Modify,
    Exec,
    Trade,
    Snapshot,
}

/// An inbound order-lifecycle message: add, cancel, or modify.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub kind: MessageKind,
    pub order_id: i64,
    pub is_sell: bool,
    pub quantity: u64,
    pub price: Decimal,
}

impl OrderMessage {
    pub fn add(order_id: i64, is_sell: bool, quantity: u64, price: Decimal) -> Self {
        Self {
            kind: MessageKind::Add,
            order_id,
            is_sell,
            quantity,
            price,
        }
    }

    pub fn cancel(order_id: i64, is_sell: bool, quantity: u64, price: Decimal) -> Self {
        Self {
            kind: MessageKind::Cancel,
            order_id,
            is_sell,
            quantity,
            price,
        }
    }

    pub fn modify(order_id: i64, is_sell: bool, quantity: u64, price: Decimal) -> Self {
        Self {
            kind: MessageKind::Modify,
            order_id,
            is_sell,
            quantity,
            price,
        }
    }
}

/// An inbound trade print. Trades are liquidity-removing events not tied to a
/// specific resting order id on arrival (§4.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub quantity: u64,
    pub price: Decimal,
}

impl TradeMessage {
    pub fn new(quantity: u64, price: Decimal) -> Self {
        Self { quantity, price }
    }
}

/// An inbound L2 depth snapshot. Each side's levels arrive already sorted in that
/// side's priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMessage {
    pub bid_levels: Vec<L2Level>,
    pub ask_levels: Vec<L2Level>,
}

impl SnapshotMessage {
    pub fn new(bid_levels: Vec<L2Level>, ask_levels: Vec<L2Level>) -> Self {
        Self {
            bid_levels,
            ask_levels,
        }
    }
}
