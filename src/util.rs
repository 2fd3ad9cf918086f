use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::orderboard::BoardError;

/// Number of decimal places every quantity and price is held at.
pub const PLACES: u32 = 2;

/// Converts a numeric value to a `Decimal` held at 2 decimal places,
/// rounding half-up so comparisons between prices work sensibly.
///
/// Examples:
/// - "2.0" -> 2.00
/// - "2.005" -> 2.01
/// - "306" -> 306.00
/// - "junk" -> `BoardError::InvalidNumber`
pub trait ToTwoPlaces {
    fn to_two_places(self) -> Result<Decimal, BoardError>;
}

pub fn to_two_places<T: ToTwoPlaces>(value: T) -> Result<Decimal, BoardError> {
    value.to_two_places()
}

/// Rounds an already-parsed decimal half-up to 2 places.
pub fn round_two_places(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(PLACES, RoundingStrategy::MidpointAwayFromZero);
    // Pad the scale so "2" and "2.00" carry the same representation
    rounded.rescale(PLACES);
    rounded
}

/// Canonical display form with trailing zeros trimmed: 5.50 -> "5.5", 306.00 -> "306".
pub fn display_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

fn parse_text(text: &str) -> Result<Decimal, BoardError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(round_two_places)
        .map_err(|_| BoardError::InvalidNumber {
            value: text.to_string(),
        })
}

impl ToTwoPlaces for &str {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        parse_text(self)
    }
}

impl ToTwoPlaces for &String {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        parse_text(self)
    }
}

impl ToTwoPlaces for String {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        parse_text(&self)
    }
}

impl ToTwoPlaces for Decimal {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        Ok(round_two_places(self))
    }
}

impl ToTwoPlaces for i64 {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        Ok(round_two_places(Decimal::from(self)))
    }
}

impl ToTwoPlaces for i32 {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        Ok(round_two_places(Decimal::from(self)))
    }
}

impl ToTwoPlaces for u64 {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        Ok(round_two_places(Decimal::from(self)))
    }
}

impl ToTwoPlaces for f64 {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        Decimal::try_from(self)
            .map(round_two_places)
            .map_err(|_| BoardError::InvalidNumber {
                value: self.to_string(),
            })
    }
}

/// A quantity or price as it arrives in a command: either a JSON string
/// (`"3.5"`) or a JSON number (`3.5`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Text(value.to_string())
    }
}

impl ToTwoPlaces for &Amount {
    fn to_two_places(self) -> Result<Decimal, BoardError> {
        match self {
            Amount::Text(text) => parse_text(text),
            // Go through the number's text so 0.1 stays exactly 0.1
            Amount::Number(number) => parse_text(&number.to_string()),
        }
    }
}
