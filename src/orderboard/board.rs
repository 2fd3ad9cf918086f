//! # Order Board Data Structures
//!
//! This module defines the `OrderBoard` and the rows of its live view.
//! The OrderBoard manages:
//! - The list of live orders, in the order they were added
//! - One price-indexed level map per side, each entry holding a
//!   representative order that reaches the level's shared total
//! - Merging a new order into an existing level, or starting a new one
//! - Cancelling an order, which either shrinks its level or removes it
//!
//! A level map entry is *some* live holder of the level's total, not
//! necessarily the order that created it: every add makes the newest order
//! the representative.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::order::{Order, OrderId, SharedTotal, Side};
use super::BoardError;
use crate::util::{display_amount, round_two_places};

/// One line of the live board: the total quantity quoted at a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveRow {
    pub side: Side,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

impl fmt::Display for LiveRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} kg for £{}",
            self.side,
            display_amount(self.total),
            display_amount(self.price)
        )
    }
}

/// The OrderBoard holds every live order and, per side, a map from price to
/// a representative order at that price.
#[derive(Debug, Default)]
pub struct OrderBoard {
    /// Live orders in insertion order
    orders: Vec<Order>,

    /// Sell side price levels, keyed by price
    sell_levels: BTreeMap<Decimal, Order>,

    /// Buy side price levels, keyed by price
    buy_levels: BTreeMap<Decimal, Order>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn sell_levels(&self) -> &BTreeMap<Decimal, Order> {
        &self.sell_levels
    }

    pub fn buy_levels(&self) -> &BTreeMap<Decimal, Order> {
        &self.buy_levels
    }

    pub fn levels(&self, side: Side) -> &BTreeMap<Decimal, Order> {
        match side {
            Side::Buy => &self.buy_levels,
            Side::Sell => &self.sell_levels,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, Order> {
        match side {
            Side::Buy => &mut self.buy_levels,
            Side::Sell => &mut self.sell_levels,
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Finds a live order by id.
    pub fn find_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id() == id)
    }

    /// Shared total of the level at (side, price), if the level is live.
    pub fn level_total(&self, side: Side, price: Decimal) -> Option<&SharedTotal> {
        self.levels(side)
            .get(&round_two_places(price))
            .and_then(Order::shared_total)
    }

    /// Adds an order to the board. If there are other orders at the same side
    /// and price the order joins their shared total, otherwise it starts one.
    ///
    /// If the order cannot join its level (the total would overflow) it is
    /// rejected and the board is left unchanged.
    pub fn add_order(&mut self, mut order: Order) -> Result<(), BoardError> {
        trace!(
            "Order board: adding {} order {} for {} kg at {}",
            order.side(),
            order.id(),
            order.quantity(),
            order.price()
        );

        match self.levels(order.side()).get(&order.price()) {
            Some(representative) => {
                if let Err(e) = order.merge_into(representative) {
                    warn!(
                        "Order board: rejected {} order {} at {}: {}",
                        order.side(),
                        order.id(),
                        order.price(),
                        e
                    );
                    return Err(e);
                }
            }
            None => order.seed_own_total(),
        }

        let representative = order.share();
        self.levels_mut(order.side())
            .insert(order.price(), representative);
        self.orders.push(order);
        Ok(())
    }

    /// Removes an order from the board. Unknown ids are ignored.
    ///
    /// Returns true if an order was removed.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        let Some(position) = self.position_of(id) else {
            debug!("Order board: cancel of unknown order {}, ignoring", id);
            return false;
        };

        self.detach_from_level(position);
        let order = self.orders.remove(position);
        debug!(
            "Order board: cancelled {} order {} for {} kg at {}",
            order.side(),
            order.id(),
            order.quantity(),
            order.price()
        );
        true
    }

    /// Moves a live order to a new price, re-running aggregation at both the
    /// old and the new level. The order keeps its id and goes to the back of
    /// the order list. Returns false for an unknown id.
    ///
    /// If the order cannot join the level at the new price it stays where it
    /// is and the error is returned.
    pub fn reprice_order(&mut self, id: OrderId, new_price: Decimal) -> Result<bool, BoardError> {
        let Some(position) = self.position_of(id) else {
            debug!("Order board: reprice of unknown order {}, ignoring", id);
            return Ok(false);
        };

        let order = &self.orders[position];
        let target = round_two_places(new_price);
        if target != order.price() {
            if let Some(total) = self.level_total(order.side(), target) {
                if total.quantity().checked_add(order.quantity()).is_none() {
                    return Err(BoardError::QuantityOverflow {
                        total: total.quantity().to_string(),
                        quantity: order.quantity().to_string(),
                    });
                }
            }
        }

        self.detach_from_level(position);
        let mut order = self.orders.remove(position);
        let old_price = order.price();
        order.set_price(new_price);
        debug!(
            "Order board: repricing {} order {} from {} to {}",
            order.side(),
            order.id(),
            old_price,
            order.price()
        );
        // Joining was checked above; rejoining the old level restores what
        // detaching took away
        self.add_order(order)?;
        Ok(true)
    }

    /// The live board, one row per price level: sells ascending by price
    /// followed by buys descending by price.
    pub fn live_rows(&self) -> Vec<LiveRow> {
        let mut sells = Self::distinct_levels(&self.sell_levels);
        sells.sort_by(|a, b| a.compare(b));

        let mut buys = Self::distinct_levels(&self.buy_levels);
        buys.sort_by(|a, b| b.compare(a));

        sells
            .into_iter()
            .chain(buys)
            .filter_map(|order| {
                order.total_quantity().map(|total| LiveRow {
                    side: order.side(),
                    total,
                    price: order.price(),
                })
            })
            .collect()
    }

    /// The live board as display lines, e.g. "SELL 5.5 kg for £306".
    pub fn display_live_board(&self) -> Vec<String> {
        self.live_rows().iter().map(ToString::to_string).collect()
    }

    fn position_of(&self, id: OrderId) -> Option<usize> {
        self.orders.iter().position(|order| order.id() == id)
    }

    /// One representative per distinct shared total, compared by identity.
    fn distinct_levels(levels: &BTreeMap<Decimal, Order>) -> Vec<&Order> {
        let mut distinct: Vec<&Order> = Vec::with_capacity(levels.len());
        for order in levels.values() {
            let Some(total) = order.shared_total() else {
                continue;
            };
            let seen = distinct
                .iter()
                .any(|kept| kept.shared_total().is_some_and(|t| t.same_as(total)));
            if !seen {
                distinct.push(order);
            }
        }
        distinct
    }

    /// Takes the order at `position` out of its price level: the level's
    /// shared total shrinks if other orders still contribute, otherwise the
    /// level is removed.
    fn detach_from_level(&mut self, position: usize) {
        let order = &self.orders[position];
        let (side, price, quantity) = (order.side(), order.price(), order.quantity());

        let levels = match side {
            Side::Buy => &mut self.buy_levels,
            Side::Sell => &mut self.sell_levels,
        };
        let Some(representative) = levels.get(&price) else {
            warn!(
                "Order board: no {} level at {} for order {}",
                side,
                price,
                order.id()
            );
            return;
        };

        let (total, contributors) = match representative.shared_total() {
            Some(shared) => (shared.quantity(), shared.contributors()),
            None => (Decimal::ZERO, 0),
        };
        let others_remain = contributors > 1;
        if others_remain != (quantity < total) {
            warn!(
                "Order board: {} level at {} has {} contributors but total {} against order quantity {}",
                side, price, contributors, total, quantity
            );
        }

        if others_remain {
            order.decrement_shared_total(quantity);
        } else {
            levels.remove(&price);
        }
    }
}
