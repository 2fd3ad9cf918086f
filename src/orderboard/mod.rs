//! # Order Board Module
//!
//! This module provides the quotation board for a single commodity traded by
//! weight. It includes:
//! - Buy and sell orders with 2 decimal place quantities and prices
//! - Price level aggregation, where every order at the same side and price
//!   shares one running total
//! - Cancellation that splits a shared total back apart
//! - A sorted live view of the board
//! - Board commands (add, cancel, reprice) for feeding a board from a script
//!
//! Orders are never matched against each other; the board only quotes.

use thiserror::Error;

pub mod board;
mod modifications;
pub mod order;

pub use board::{LiveRow, OrderBoard};
pub use modifications::{BoardCommand, CommandOutcome};
pub use order::{IdSequence, Order, OrderId, OrderIdSource, SharedTotal, Side};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// A quantity or price could not be read as a number
    #[error("the value must be a number, got {value:?}")]
    InvalidNumber { value: String },

    #[error("order quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: String },

    /// Adding the order to its level would overflow the level total
    #[error("level total {total} cannot take another {quantity}")]
    QuantityOverflow { total: String, quantity: String },

    /// The order being merged into has not been placed on a board yet
    #[error("order {order_id} has no shared total to merge into")]
    TotalUnset { order_id: OrderId },
}
