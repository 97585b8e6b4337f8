//! Run summary metrics.
//!
//! Aggregates the final Algo State and the simulator's counters.

use algo_core::{AlgoState, OrderState, Quantity, Side};
use algo_signals::{execution_vwap, state_vwap};
use serde::Serialize;

/// Summary of one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks applied to the book.
    pub ticks_processed: u64,
    /// Ticks rejected (malformed or out of sequence).
    pub ticks_rejected: u64,
    /// Commands rejected (validation, invalid transition, unknown order).
    pub commands_rejected: u64,
    /// Child orders created.
    pub orders_created: usize,
    /// Orders in `Filled`.
    pub orders_filled: usize,
    /// Orders in `PartiallyFilled`.
    pub orders_partially_filled: usize,
    /// Orders in `Cancelled`.
    pub orders_cancelled: usize,
    /// Orders still working (`Active` or `PartiallyFilled`).
    pub orders_active: usize,
    /// Filled quantity across every order.
    pub total_filled_quantity: Quantity,
    /// Filled quantity on buy orders.
    pub buy_filled_quantity: Quantity,
    /// Filled quantity on sell orders.
    pub sell_filled_quantity: Quantity,
    /// VWAP over limit prices, `None` if nothing filled.
    pub vwap: Option<f64>,
    /// VWAP over execution prices, `None` if nothing filled.
    pub execution_vwap: Option<f64>,
}

impl RunSummary {
    /// Fraction of created orders that completely filled.
    pub fn fill_rate(&self) -> f64 {
        if self.orders_created > 0 {
            self.orders_filled as f64 / self.orders_created as f64
        } else {
            0.0
        }
    }
}

/// Simulator-side counters that the Algo State cannot provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub ticks_processed: u64,
    pub ticks_rejected: u64,
    pub commands_rejected: u64,
}

/// Summary calculator.
pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Calculate the summary for a state and its run counters.
    pub fn calculate(state: &AlgoState, counters: RunCounters) -> RunSummary {
        RunSummary {
            ticks_processed: counters.ticks_processed,
            ticks_rejected: counters.ticks_rejected,
            commands_rejected: counters.commands_rejected,
            orders_created: state.len(),
            orders_filled: state.count_in_state(OrderState::Filled),
            orders_partially_filled: state.count_in_state(OrderState::PartiallyFilled),
            orders_cancelled: state.count_in_state(OrderState::Cancelled),
            orders_active: state.active_child_orders().len(),
            total_filled_quantity: state.total_filled_quantity(),
            buy_filled_quantity: state.filled_quantity_for(Side::Buy),
            sell_filled_quantity: state.filled_quantity_for(Side::Sell),
            vwap: state_vwap(state),
            execution_vwap: execution_vwap(state.child_orders()),
        }
    }
}
