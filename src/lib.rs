//! A quotation board for a single commodity traded by weight.
//!
//! Orders are added and cancelled by id; orders on the same side at the same
//! price share one running total, and the board renders one row per price
//! level. Orders are never matched against each other.

pub mod config;
pub mod orderboard;
pub mod session;
pub mod util;

pub use orderboard::{
    BoardCommand, BoardError, CommandOutcome, IdSequence, LiveRow, Order, OrderBoard, OrderId,
    OrderIdSource, SharedTotal, Side,
};
pub use rust_decimal::Decimal;
