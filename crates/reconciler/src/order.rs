//! The order type tracked by a [`crate::book_side::BookSide`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of the book an order or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderSide {
    #[serde(rename = "buy")]
    Buy,
    #[serde(rename = "sell")]
    Sell,
}

impl OrderSide {
    /// The side that would be the resting counterparty to an order on `self`.
    #[inline]
    pub fn opposite(self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        matches!(self, OrderSide::Sell)
    }
}

impl From<bool> for OrderSide {
    #[inline]
    fn from(is_sell: bool) -> Self {
        if is_sell {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        }
    }
}

/// The order-id reserved for events describing liquidity the engine has inferred but
/// never seen a real order message for.
pub const SYNTHETIC_EVENT_ORDER_ID: i64 = -1;

/// The first id handed out to an order the engine fabricates internally to back
/// snapshot- or trade-inferred liquidity. Counts down from here so fabricated ids
/// never collide with a real venue-assigned id (which is always `>= 0`) or with
/// [`SYNTHETIC_EVENT_ORDER_ID`].
pub const FIRST_FABRICATED_ORDER_ID: i64 = -2;

/// A single resting (or about-to-rest) order.
///
/// `order_id` is `>= 0` for orders that arrived through a real `ADD` message, and
/// `< -1` for orders this engine fabricated itself while reconciling a snapshot or a
/// trade against an L3 book that had not yet heard about the liquidity (see
/// [`crate::book_side::BookSide::process_l2_snapshot`] and
/// [`crate::book_side::BookSide::process_trade`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub order_id: i64,
    pub is_sell: bool,
    pub original_quantity: u64,
    pub filled_quantity: u64,
    pub price: Decimal,
}

impl Order {
    #[inline]
    pub fn new(order_id: i64, is_sell: bool, quantity: u64, price: Decimal) -> Self {
        Self {
            order_id,
            is_sell,
            original_quantity: quantity,
            filled_quantity: 0,
            price,
        }
    }

    /// `original_quantity - filled_quantity`.
    #[inline]
    pub fn remaining_quantity(&self) -> u64 {
        self.original_quantity - self.filled_quantity
    }

    #[inline]
    pub fn side(&self) -> OrderSide {
        OrderSide::from(self.is_sell)
    }

    #[inline]
    pub fn is_fabricated(&self) -> bool {
        self.order_id < SYNTHETIC_EVENT_ORDER_ID
    }
}
