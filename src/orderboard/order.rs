use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::BoardError;
use crate::util::{round_two_places, ToTwoPlaces};

pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Hands out order ids. Ids must never repeat for the lifetime of the source.
pub trait OrderIdSource {
    fn next_id(&mut self) -> OrderId;
}

/// Monotonically increasing id source, starting at 0 unless told otherwise.
#[derive(Debug, Default, Clone)]
pub struct IdSequence {
    next: OrderId,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first: OrderId) -> Self {
        Self { next: first }
    }

    /// Id the next call to `next_id` will return
    pub fn peek(&self) -> OrderId {
        self.next
    }
}

impl OrderIdSource for IdSequence {
    fn next_id(&mut self) -> OrderId {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LevelAggregate {
    quantity: Decimal,
    contributors: usize,
}

/// Total quantity at one price level, shared by every order at that level.
///
/// Cloning the handle shares the total, it does not copy it. The handle also
/// counts how many orders currently contribute to the total.
#[derive(Clone)]
pub struct SharedTotal(Rc<Cell<LevelAggregate>>);

impl SharedTotal {
    /// A fresh total with a single contributor.
    pub fn seed(quantity: Decimal) -> Self {
        SharedTotal(Rc::new(Cell::new(LevelAggregate {
            quantity,
            contributors: 1,
        })))
    }

    pub fn quantity(&self) -> Decimal {
        self.0.get().quantity
    }

    pub fn contributors(&self) -> usize {
        self.0.get().contributors
    }

    /// True when both handles denote the same underlying total.
    pub fn same_as(&self, other: &SharedTotal) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Adds a contributor. The total is left untouched if the sum overflows.
    fn join(&self, quantity: Decimal) -> Result<(), BoardError> {
        let mut aggregate = self.0.get();
        aggregate.quantity = aggregate.quantity.checked_add(quantity).ok_or_else(|| {
            BoardError::QuantityOverflow {
                total: aggregate.quantity.to_string(),
                quantity: quantity.to_string(),
            }
        })?;
        aggregate.contributors += 1;
        self.0.set(aggregate);
        Ok(())
    }

    fn leave(&self, quantity: Decimal) {
        let mut aggregate = self.0.get();
        aggregate.quantity -= quantity;
        aggregate.contributors = aggregate.contributors.saturating_sub(1);
        self.0.set(aggregate);
    }
}

impl fmt::Debug for SharedTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTotal")
            .field("quantity", &self.quantity())
            .field("contributors", &self.contributors())
            .finish()
    }
}

/// A single buy or sell order for a quantity in kilos at a price per kilo.
///
/// Orders at the same side and price share a `SharedTotal`, which holds the
/// total quantity of those orders. `seed_own_total` creates a new total from
/// this order's quantity, `merge_into` adds this order's quantity to another
/// order's total and shares it. When an order leaves a level the owner must
/// call `decrement_shared_total`. Only the board does any of this; outside
/// the crate a shared total can be read but not changed:
///
/// ```compile_fail
/// use commodity_board::{Decimal, IdSequence, Order, OrderBoard, Side};
///
/// let mut ids = IdSequence::new();
/// let mut board = OrderBoard::new();
/// let order = Order::new(&mut ids, "2", "300", Side::Buy, None).unwrap();
/// let id = order.id();
/// board.add_order(order).unwrap();
/// board.find_order(id).unwrap().decrement_shared_total(Decimal::ONE);
/// ```
#[derive(Debug)]
pub struct Order {
    id: OrderId,
    quantity: Decimal,
    price: Decimal,
    side: Side,
    total: Option<SharedTotal>,
}

impl Order {
    /// Creates an order, taking its id from `ids`.
    ///
    /// Quantity and price are rounded half-up to 2 places. `initial_total` is
    /// only for rebuilding known state; normally the total stays unset until
    /// the order is added to a board.
    pub fn new<Q, P>(
        ids: &mut impl OrderIdSource,
        quantity: Q,
        price: P,
        side: Side,
        initial_total: Option<Decimal>,
    ) -> Result<Self, BoardError>
    where
        Q: ToTwoPlaces,
        P: ToTwoPlaces,
    {
        let quantity = quantity.to_two_places()?;
        let price = price.to_two_places()?;
        if quantity <= Decimal::ZERO {
            return Err(BoardError::NonPositiveQuantity {
                quantity: quantity.to_string(),
            });
        }

        Ok(Self {
            id: ids.next_id(),
            quantity,
            price,
            side,
            total: initial_total.map(SharedTotal::seed),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn shared_total(&self) -> Option<&SharedTotal> {
        self.total.as_ref()
    }

    /// Current value of the shared total, if the order has one
    pub fn total_quantity(&self) -> Option<Decimal> {
        self.total.as_ref().map(SharedTotal::quantity)
    }

    /// Overwrites the price. The shared total is left alone, so this is only
    /// meaningful before the order is added to a board.
    pub fn set_price(&mut self, price: Decimal) {
        self.price = round_two_places(price);
    }

    /// Starts a new shared total holding just this order's quantity.
    pub(crate) fn seed_own_total(&mut self) {
        self.total = Some(SharedTotal::seed(self.quantity));
    }

    /// Adds this order's quantity to `existing`'s shared total and shares it.
    /// On error neither order nor the total is changed.
    pub(crate) fn merge_into(&mut self, existing: &Order) -> Result<(), BoardError> {
        let total = existing.total.as_ref().ok_or(BoardError::TotalUnset {
            order_id: existing.id,
        })?;
        total.join(self.quantity)?;
        self.total = Some(total.clone());
        Ok(())
    }

    /// Removes `amount` and one contributor from the shared total. Every order
    /// sharing the total sees the change.
    pub(crate) fn decrement_shared_total(&self, amount: Decimal) {
        if let Some(total) = &self.total {
            total.leave(amount);
        }
    }

    /// Orders compare by price alone, ascending.
    pub fn compare(&self, other: &Order) -> Ordering {
        self.price.cmp(&other.price)
    }

    /// Another handle on this order: same id, quantity, price and shared total.
    pub(crate) fn share(&self) -> Order {
        Order {
            id: self.id,
            quantity: self.quantity,
            price: self.price,
            side: self.side,
            total: self.total.clone(),
        }
    }
}
