//! # Order Board Commands
//!
//! This module implements the commands a board can be fed with:
//! - Adding a new order
//! - Cancelling an order by id
//! - Moving an order to a new price
//!
//! Commands are plain serde types so a board can be driven from a JSON
//! script or a channel.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use anyhow::{Context, Result};
use tracing::{info, trace};

use super::board::OrderBoard;
use super::order::{Order, OrderId, OrderIdSource, Side};
use crate::util::{to_two_places, Amount};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardCommand {
    Add {
        quantity: Amount,
        price: Amount,
        side: Side,
    },
    Cancel {
        order_id: OrderId,
    },
    Reprice {
        order_id: OrderId,
        new_price: Amount,
    },
}

/// What a command did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Added(OrderId),
    Cancelled(OrderId),
    Repriced(OrderId),
    /// The command named an order that is not on the board
    Ignored(OrderId),
}

impl BoardCommand {
    /// A random command for demo feeds. Cancels and reprices pick one of
    /// `known_ids`; with no known ids an add is always produced.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, known_ids: &[OrderId]) -> Self {
        // 3 different command types
        let command_type: u8 = if known_ids.is_empty() {
            0
        } else {
            rng.gen_range(0..3)
        };

        match (command_type, known_ids.choose(&mut *rng)) {
            (1, Some(&order_id)) => BoardCommand::Cancel { order_id },
            (2, Some(&order_id)) => BoardCommand::Reprice {
                order_id,
                new_price: Amount::from(Decimal::from(rng.gen_range(300..=310_i64))), // 300..=310
            },
            _ => BoardCommand::Add {
                quantity: Amount::from(Decimal::new(rng.gen_range(10..=500), 2)), // 0.10..=5.00
                price: Amount::from(Decimal::from(rng.gen_range(300..=310_i64))),
                side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            },
        }
    }
}

impl OrderBoard {
    pub fn process_command(
        &mut self,
        ids: &mut impl OrderIdSource,
        command: BoardCommand,
    ) -> Result<CommandOutcome> {
        trace!("Order board: processing {:?}", command);
        match command {
            BoardCommand::Add {
                quantity,
                price,
                side,
            } => {
                let order = Order::new(ids, &quantity, &price, side, None).with_context(|| {
                    format!("Failed to add {side} order for {quantity:?} at {price:?}")
                })?;
                let order_id = order.id();
                self.add_order(order)
                    .with_context(|| format!("Failed to add {side} order {order_id} at {price:?}"))?;
                Ok(CommandOutcome::Added(order_id))
            }
            BoardCommand::Cancel { order_id } => {
                if self.cancel_order(order_id) {
                    Ok(CommandOutcome::Cancelled(order_id))
                } else {
                    info!("Order board: order {} not found, nothing to cancel", order_id);
                    Ok(CommandOutcome::Ignored(order_id))
                }
            }
            BoardCommand::Reprice {
                order_id,
                new_price,
            } => {
                let new_price = to_two_places(&new_price)
                    .with_context(|| format!("Failed to reprice order {order_id}"))?;
                let repriced = self
                    .reprice_order(order_id, new_price)
                    .with_context(|| format!("Failed to reprice order {order_id}"))?;
                if repriced {
                    Ok(CommandOutcome::Repriced(order_id))
                } else {
                    info!("Order board: order {} not found, nothing to reprice", order_id);
                    Ok(CommandOutcome::Ignored(order_id))
                }
            }
        }
    }
}
