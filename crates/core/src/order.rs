//! Child orders, their lifecycle state machine, and algorithm commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Fill, Price, Quantity, SequenceNumber, Side};

/// Identifier of a child order, unique and stable within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Submitted by the algorithm, not yet accepted by the book.
    New,
    /// Accepted and working, nothing filled yet.
    Active,
    /// Working with some quantity filled.
    PartiallyFilled,
    /// Completely filled (terminal).
    Filled,
    /// Cancelled by the algorithm (terminal).
    Cancelled,
}

impl OrderState {
    /// Is this a terminal state?
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Filled | OrderState::Cancelled)
    }

    /// Is the order working in the book (eligible for matching)?
    #[inline]
    pub fn is_working(self) -> bool {
        matches!(self, OrderState::Active | OrderState::PartiallyFilled)
    }
}

/// One order the algorithm has submitted.
///
/// Fields are only reachable through getters. Every mutation goes through a
/// transition method that either succeeds or leaves the order untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildOrder {
    id: OrderId,
    side: Side,
    price: Price,
    quantity: Quantity,
    filled_quantity: Quantity,
    state: OrderState,
    created_seq: SequenceNumber,
    fills: Vec<Fill>,
}

impl ChildOrder {
    /// Create a new order in state `New`.
    pub fn new(
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
        created_seq: SequenceNumber,
    ) -> Result<Self> {
        if price <= 0 {
            return Err(Error::validation(format!(
                "order {id}: price must be positive, got {price}"
            )));
        }
        if quantity <= 0 {
            return Err(Error::validation(format!(
                "order {id}: quantity must be positive, got {quantity}"
            )));
        }

        Ok(Self {
            id,
            side,
            price,
            quantity,
            filled_quantity: 0,
            state: OrderState::New,
            created_seq,
            fills: Vec::new(),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Limit price.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Requested quantity.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    /// Requested minus filled.
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Sequence number of the tick on which the order was created.
    pub fn created_seq(&self) -> SequenceNumber {
        self.created_seq
    }

    /// Executions in the order they happened.
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn is_working(&self) -> bool {
        self.state.is_working()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Average execution price, `None` if nothing has filled.
    pub fn avg_fill_price(&self) -> Option<f64> {
        if self.filled_quantity == 0 {
            return None;
        }
        let notional: i128 = self
            .fills
            .iter()
            .map(|f| f.price as i128 * f.quantity as i128)
            .sum();
        Some(notional as f64 / self.filled_quantity as f64)
    }

    /// New -> Active.
    pub fn accept(&mut self) -> Result<()> {
        if self.state != OrderState::New {
            return Err(Error::invalid_transition(self.id, self.state, "accept"));
        }
        self.state = OrderState::Active;
        Ok(())
    }

    /// Apply an execution. Moves to `PartiallyFilled` or `Filled`.
    pub fn apply_fill(&mut self, fill: Fill) -> Result<()> {
        if !self.state.is_working() {
            return Err(Error::invalid_transition(self.id, self.state, "fill"));
        }
        if fill.quantity <= 0 || fill.quantity > self.remaining_quantity() {
            return Err(Error::validation(format!(
                "order {}: fill of {} outside remaining quantity {}",
                self.id,
                fill.quantity,
                self.remaining_quantity()
            )));
        }

        self.filled_quantity += fill.quantity;
        self.fills.push(fill);
        self.state = if self.filled_quantity == self.quantity {
            OrderState::Filled
        } else {
            OrderState::PartiallyFilled
        };
        Ok(())
    }

    /// New/Active/PartiallyFilled -> Cancelled.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::invalid_transition(self.id, self.state, "cancel"));
        }
        self.state = OrderState::Cancelled;
        Ok(())
    }
}

/// Order action emitted by an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Create a limit child order.
    Create {
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    /// Cancel a child order.
    Cancel { id: OrderId },
}

impl Command {
    pub fn buy(price: Price, quantity: Quantity) -> Self {
        Command::Create {
            side: Side::Buy,
            price,
            quantity,
        }
    }

    pub fn sell(price: Price, quantity: Quantity) -> Self {
        Command::Create {
            side: Side::Sell,
            price,
            quantity,
        }
    }

    pub fn cancel(id: OrderId) -> Self {
        Command::Cancel { id }
    }
}
