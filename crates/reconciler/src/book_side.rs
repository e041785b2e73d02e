//! The reconciliation core: one side (bid or ask) of the L3 book, its pending-liquidity
//! predictions, and the snapshot-reconciliation state machine.

use std::collections::{BTreeMap, VecDeque};

use ahash::{AHashMap, AHashSet};
use rust_decimal::Decimal;

use crate::config::ReconciliationPolicy;
use crate::event::{EventKind, OrderEvent};
use crate::message::TradeMessage;
use crate::order::{Order, FIRST_FABRICATED_ORDER_ID, SYNTHETIC_EVENT_ORDER_ID};
use crate::price_level::{L2Level, L3Level};

/// All state for one side of the book: the L3 level map, the order index, the two
/// pending-liquidity predictions, and the queue of L2 projections awaiting
/// confirmation by a venue snapshot.
pub struct BookSide {
    is_sell: bool,
    levels: BTreeMap<Decimal, L3Level>,
    order_map: AHashMap<i64, Decimal>,
    /// Exact-price expected removals: trades/cancels already reflected in the book
    /// that real feed messages have not yet confirmed.
    pending_liq_remove: AHashMap<Decimal, u64>,
    /// Expected additions at-or-better-than a price, ordered by this side's priority.
    pending_liq_add: BTreeMap<Decimal, u64>,
    l2_snapshot_queue: VecDeque<Vec<L2Level>>,
    next_fabricated_id: i64,
    policy: ReconciliationPolicy,
}

impl BookSide {
    pub fn new(is_sell: bool) -> Self {
        Self::with_policy(is_sell, ReconciliationPolicy::default())
    }

    pub fn with_policy(is_sell: bool, policy: ReconciliationPolicy) -> Self {
        Self {
            is_sell,
            levels: BTreeMap::new(),
            order_map: AHashMap::new(),
            pending_liq_remove: AHashMap::new(),
            pending_liq_add: BTreeMap::new(),
            l2_snapshot_queue: VecDeque::new(),
            next_fabricated_id: FIRST_FABRICATED_ORDER_ID,
            policy,
        }
    }

    #[inline]
    pub fn is_sell(&self) -> bool {
        self.is_sell
    }

    #[inline]
    pub fn exist_order(&self, order_id: i64) -> bool {
        self.order_map.contains_key(&order_id)
    }

    pub fn get_order(&self, order_id: i64) -> Option<Order> {
        let price = self.order_map.get(&order_id)?;
        self.levels
            .get(price)?
            .iter()
            .find(|o| o.order_id == order_id)
            .copied()
    }

    pub fn exist_level(&self, price: Decimal) -> bool {
        self.levels.contains_key(&price)
    }

    pub fn level_aggregate(&self, price: Decimal) -> Option<u64> {
        self.levels.get(&price).map(|l| l.aggregate_quantity())
    }

    /// This side's depth, in priority order (best price first).
    pub fn l2_levels(&self) -> Vec<L2Level> {
        if self.is_sell {
            self.levels.values().map(L3Level::to_l2).collect()
        } else {
            self.levels.values().rev().map(L3Level::to_l2).collect()
        }
    }

    pub fn pending_liq_remove(&self, price: Decimal) -> u64 {
        self.pending_liq_remove.get(&price).copied().unwrap_or(0)
    }

    pub fn pending_liq_add(&self, price: Decimal) -> u64 {
        self.pending_liq_add.get(&price).copied().unwrap_or(0)
    }

    /// Best-priority price currently resting on this side, if any.
    fn top_price(&self) -> Option<Decimal> {
        if self.is_sell {
            self.levels.keys().next().copied()
        } else {
            self.levels.keys().next_back().copied()
        }
    }

    /// Whether an incoming order at `price` (from the *opposite* side) would cross
    /// this side's top.
    pub fn book_crossed_with_price(&self, price: Decimal) -> bool {
        match self.top_price() {
            None => false,
            Some(top) => {
                if self.is_sell {
                    price >= top
                } else {
                    top >= price
                }
            }
        }
    }

    /// §4.2.1: no-op if `order.order_id` is already indexed.
    pub fn add_order(&mut self, order: Order) {
        if self.order_map.contains_key(&order.order_id) {
            return;
        }
        self.order_map.insert(order.order_id, order.price);
        self.levels
            .entry(order.price)
            .or_insert_with(|| L3Level::new(order.price))
            .add_order(order);
    }

    /// §4.2.1: no-op if `order_id` is unknown. Erases the level if it becomes empty.
    pub fn remove_order(&mut self, order_id: i64) -> Option<Order> {
        let price = self.order_map.remove(&order_id)?;
        let level = self.levels.get_mut(&price)?;
        let order = level.remove_order(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// §4.2.1: pure quantity change if the price is unchanged; otherwise a
    /// remove-then-add preserving `filled_quantity`. The side of an order never
    /// changes.
    pub fn modify_order(&mut self, order_id: i64, new_quantity: u64, new_price: Decimal) {
        let Some(&current_price) = self.order_map.get(&order_id) else {
            return;
        };

        if current_price == new_price {
            if let Some(level) = self.levels.get_mut(&current_price) {
                level.modify_order(order_id, new_quantity);
            }
            return;
        }

        if let Some(old) = self.remove_order(order_id) {
            let mut fresh = Order::new(order_id, old.is_sell, new_quantity, new_price);
            fresh.filled_quantity = old.filled_quantity;
            self.add_order(fresh);
        }
    }

    /// §4.2.2: uncross `aggressor` (from the opposite side) against this side's top,
    /// walking levels until the aggressor is filled or this side no longer crosses it.
    /// Fills on this side imply trade prints this engine hasn't seen yet, so every
    /// fill here bumps `pending_liq_remove` at the resting order's price.
    pub fn process_crossed_order(&mut self, aggressor: &mut Order) -> Vec<OrderEvent> {
        debug_assert_ne!(aggressor.is_sell, self.is_sell);
        let mut events = Vec::new();

        while aggressor.remaining_quantity() > 0 && self.book_crossed_with_price(aggressor.price) {
            let top_price = self
                .top_price()
                .expect("book_crossed_with_price(true) implies a resting level exists");

            let order_ids: Vec<i64> = self
                .levels
                .get(&top_price)
                .expect("top_price came from levels")
                .iter()
                .map(|o| o.order_id)
                .collect();

            let mut exhausted = Vec::new();
            for order_id in order_ids {
                if aggressor.remaining_quantity() == 0 {
                    break;
                }

                let resting_remaining = match self.levels.get(&top_price) {
                    Some(level) => match level.iter().find(|o| o.order_id == order_id) {
                        Some(o) => o.remaining_quantity(),
                        None => continue,
                    },
                    None => break,
                };

                let fill_qty = aggressor.remaining_quantity().min(resting_remaining);
                let resting_after = self
                    .levels
                    .get_mut(&top_price)
                    .and_then(|level| level.fill_order(order_id, fill_qty))
                    .expect("order just observed in this level");

                self.save_l2_snapshot_side();

                aggressor.filled_quantity += fill_qty;
                events.push(OrderEvent::new(
                    EventKind::Exec,
                    order_id,
                    self.is_sell,
                    fill_qty,
                    top_price,
                ));
                *self.pending_liq_remove.entry(top_price).or_insert(0) += fill_qty;

                if resting_after.remaining_quantity() == 0 {
                    exhausted.push(order_id);
                }
            }

            for order_id in exhausted {
                self.remove_order(order_id);
            }
        }

        events
    }

    /// §4.2.3. A cancel fully absorbed by a pending removal produces no event and no
    /// book mutation.
    pub fn process_order_cancel(&mut self, order_id: i64, quantity: u64, price: Decimal) -> Vec<OrderEvent> {
        let absorbed = self.match_pending_liq_remove(quantity, price);
        let residual = quantity - absorbed;

        let mut events = Vec::new();
        if residual > 0 && self.exist_order(order_id) {
            events.push(OrderEvent::new(EventKind::Cancel, order_id, self.is_sell, residual, price));
            self.remove_order(order_id);
        }
        events
    }

    /// §4.2.4, phases A-D.
    pub fn process_trade(&mut self, trade: TradeMessage) -> Vec<OrderEvent> {
        let mut events = Vec::new();

        // Phase A: absorb against what we already predicted.
        let absorbed = self.match_pending_liq_remove(trade.quantity, trade.price);
        let mut residual = trade.quantity - absorbed;

        // Phase B: a trade printing through a level means every resting order there
        // has vanished.
        loop {
            let Some(top) = self.top_price() else { break };
            let should_cancel = if self.is_sell {
                top < trade.price
            } else {
                top > trade.price
            };
            if !should_cancel {
                break;
            }

            let stale: Vec<(i64, u64, Decimal)> = self
                .levels
                .get(&top)
                .expect("top came from levels")
                .iter()
                .map(|o| (o.order_id, o.remaining_quantity(), o.price))
                .collect();

            for &(order_id, qty, price) in &stale {
                events.push(OrderEvent::new(EventKind::Cancel, order_id, self.is_sell, qty, price));
            }
            for &(order_id, _, _) in &stale {
                self.remove_order(order_id);
                self.save_l2_snapshot_side();
            }
        }

        // Phase C: match the residual against the level at the trade price itself.
        if self.levels.contains_key(&trade.price) {
            let candidates: Vec<(i64, u64)> = self
                .levels
                .get(&trade.price)
                .unwrap()
                .iter()
                .map(|o| (o.order_id, o.remaining_quantity()))
                .collect();

            let mut exhausted = Vec::new();
            for (order_id, resting_remaining) in candidates {
                if residual == 0 {
                    break;
                }
                let fill_qty = residual.min(resting_remaining);
                let resting_after = self
                    .levels
                    .get_mut(&trade.price)
                    .and_then(|level| level.fill_order(order_id, fill_qty))
                    .expect("order just observed in this level");

                self.save_l2_snapshot_side();
                residual -= fill_qty;
                events.push(OrderEvent::new(EventKind::Exec, order_id, self.is_sell, fill_qty, trade.price));

                if resting_after.remaining_quantity() == 0 {
                    exhausted.push(order_id);
                }
            }
            for order_id in exhausted {
                self.remove_order(order_id);
                self.save_l2_snapshot_side();
            }
        }

        // Phase D: anything left over is liquidity we haven't seen an ADD for yet.
        if residual > 0 {
            *self.pending_liq_add.entry(trade.price).or_insert(0) += residual;
            events.push(OrderEvent::new(
                EventKind::Add,
                SYNTHETIC_EVENT_ORDER_ID,
                self.is_sell,
                residual,
                trade.price,
            ));
            events.push(OrderEvent::new(
                EventKind::Exec,
                SYNTHETIC_EVENT_ORDER_ID,
                self.is_sell,
                residual,
                trade.price,
            ));
        }

        events
    }

    /// §4.2.5. Returns no events (and mutates nothing) on a corrupted snapshot.
    pub fn process_l2_snapshot(&mut self, snapshot: &[L2Level]) -> Vec<OrderEvent> {
        if let Some(front) = self.l2_snapshot_queue.front() {
            if front.as_slice() == snapshot {
                self.l2_snapshot_queue.pop_front();
                return Vec::new();
            }
            tracing::warn!(is_sell = self.is_sell, "dropping corrupted l2 snapshot");
            return Vec::new();
        }

        let mut events = Vec::new();
        let mut staged: Vec<(Order, u64)> = Vec::new();
        let mut snapshot_prices: AHashSet<Decimal> = AHashSet::default();

        for level in snapshot {
            snapshot_prices.insert(level.price);
            let existing_qty = self.levels.get(&level.price).map(L3Level::aggregate_quantity);

            match existing_qty {
                Some(l3_qty) if level.quantity < l3_qty => {
                    let mut deficit = l3_qty - level.quantity;
                    let l3_level = self.levels.get(&level.price).expect("checked above");
                    for order in l3_level.iter() {
                        if deficit == 0 {
                            break;
                        }
                        let take = deficit.min(order.remaining_quantity());
                        deficit -= take;
                        staged.push((*order, take));
                    }
                }
                Some(l3_qty) if level.quantity > l3_qty => {
                    let diff = level.quantity - l3_qty;
                    events.push(OrderEvent::new(
                        EventKind::Add,
                        SYNTHETIC_EVENT_ORDER_ID,
                        self.is_sell,
                        diff,
                        level.price,
                    ));
                    *self.pending_liq_add.entry(level.price).or_insert(0) += diff;
                    let fabricated_id = self.next_fabricated_id();
                    self.add_order(Order::new(fabricated_id, self.is_sell, diff, level.price));
                }
                Some(_) => {}
                None => {
                    events.push(OrderEvent::new(
                        EventKind::Add,
                        SYNTHETIC_EVENT_ORDER_ID,
                        self.is_sell,
                        level.quantity,
                        level.price,
                    ));
                    *self.pending_liq_add.entry(level.price).or_insert(0) += level.quantity;
                    let fabricated_id = self.next_fabricated_id();
                    self.add_order(Order::new(fabricated_id, self.is_sell, level.quantity, level.price));
                }
            }
        }

        let missing_prices: Vec<Decimal> = self
            .levels
            .keys()
            .filter(|price| !snapshot_prices.contains(price))
            .copied()
            .collect();
        for price in missing_prices {
            if let Some(level) = self.levels.get(&price) {
                for order in level.iter() {
                    staged.push((*order, order.remaining_quantity()));
                }
            }
        }

        let executed_count = self.policy.executed_count(staged.len());
        for (index, (order, qty)) in staged.iter().enumerate() {
            let kind = if index < executed_count {
                EventKind::Exec
            } else {
                EventKind::Cancel
            };
            events.push(OrderEvent::new(kind, order.order_id, self.is_sell, *qty, order.price));

            if *qty == order.remaining_quantity() {
                self.remove_order(order.order_id);
            } else if let Some(level) = self.levels.get_mut(&order.price) {
                level.fill_order(order.order_id, *qty);
            }
        }

        events
    }

    /// §4.2.7: exact-price match only.
    pub fn match_pending_liq_remove(&mut self, quantity: u64, price: Decimal) -> u64 {
        let Some(pending) = self.pending_liq_remove.get_mut(&price) else {
            return 0;
        };
        let matched = (*pending).min(quantity);
        *pending -= matched;
        if *pending == 0 {
            self.pending_liq_remove.remove(&price);
        }
        matched
    }

    /// §4.2.7: walks from the best-priority end, consuming entries that `price`
    /// beats-or-equals, until `quantity` is exhausted or the next entry no longer
    /// qualifies. Erases a fully-consumed entry by its own key (§9 — the source
    /// erases by the query `price`, which is wrong whenever the matched entry sits
    /// at a different price).
    pub fn match_pending_liq_add(&mut self, quantity: u64, price: Decimal) -> u64 {
        let mut matched = 0u64;

        loop {
            if matched == quantity {
                break;
            }

            let front = if self.is_sell {
                self.pending_liq_add.iter().next()
            } else {
                self.pending_liq_add.iter().next_back()
            };

            let Some((&entry_price, &entry_qty)) = front else {
                break;
            };

            let can_match = if self.is_sell {
                price <= entry_price
            } else {
                price >= entry_price
            };
            if !can_match {
                break;
            }

            let take = entry_qty.min(quantity - matched);
            matched += take;
            let remaining = entry_qty - take;

            if remaining == 0 {
                self.pending_liq_add.remove(&entry_price);
            } else {
                self.pending_liq_add.insert(entry_price, remaining);
            }
        }

        matched
    }

    /// Called by the coordinating [`crate::orderbook::OrderBook`] after an `ADD`
    /// uncrosses the opposite side: the fills it produced there are trade prints this
    /// side (the taker) should expect to see confirmed.
    pub fn add_pending_liq_remove_qty(&mut self, events: &[OrderEvent]) {
        for event in events {
            if event.kind == EventKind::Exec {
                *self.pending_liq_remove.entry(event.price).or_insert(0) += event.quantity;
            }
        }
    }

    /// §4.2.6: capture the current L2 projection so a later venue snapshot matching
    /// it can be recognized as a confirmation rather than reconciled against.
    pub fn save_l2_snapshot_side(&mut self) {
        self.l2_snapshot_queue.push_back(self.l2_levels());
    }

    fn next_fabricated_id(&mut self) -> i64 {
        let id = self.next_fabricated_id;
        self.next_fabricated_id -= 1;
        id
    }
}
