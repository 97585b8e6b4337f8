//! Core types and configuration for the child-order backtest.
//!
//! This crate provides shared types used across all other crates:
//! - Market data ticks (validated bid/ask depth snapshots)
//! - Child orders and their lifecycle state machine
//! - The per-run Algo State container
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod order;
pub mod state;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use order::{ChildOrder, Command, OrderId, OrderState};
pub use state::AlgoState;
pub use types::*;
