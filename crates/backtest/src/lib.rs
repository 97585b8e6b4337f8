//! Backtest driver for child-order algorithms.
//!
//! This crate provides:
//! - Tick-by-tick replay against a simulated order book
//! - Price-priority matching that never exceeds advertised liquidity
//! - The decision-maker interface and reference strategies
//! - Run summary metrics

pub mod metrics;
pub mod order_book;
pub mod simulator;
pub mod strategy;

pub use metrics::{RunCounters, RunSummary, SummaryCalculator};
pub use order_book::{sweep, LevelMatch, OrderBook, Sweep};
pub use simulator::{BacktestSimulator, Rejection, RejectionKind, TickReport};
pub use strategy::{DecisionMaker, ImbalanceStrategy, ScriptedStrategy};
