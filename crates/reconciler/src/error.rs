//! The crate's error taxonomy.
//!
//! Per the error handling design, routine feed noise (unknown order ids, duplicate
//! adds, unknown message kinds, corrupted snapshots) never produces an `Err` — it is
//! coerced to a defined, silent, benign outcome and logged via `tracing`. These types
//! exist for the narrower set of conditions that indicate the *caller* misused the
//! engine in a way that can't be coerced into a no-op, mirroring the shape of
//! `exchange::trading::pending_fill::ExecutePendingFillError`.

use thiserror::Error;

use crate::order::OrderSide;

/// An error surfaced when applying an event recorded by [`crate::manager::BookManager`]
/// fails to replay cleanly against a book — used by callers exercising the
/// round-trip property (§8, P7), not by the reconciliation engine itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("modify event referenced order {order_id} with side {attempted:?}, but it was originally added on the {original:?} side")]
    SideChanged {
        order_id: i64,
        original: OrderSide,
        attempted: OrderSide,
    },
}
