//! Signal computations for algorithms under test.
//!
//! This crate handles:
//! - VWAP over child orders (limit-price and execution-price flavours)
//! - Volume imbalance over top-of-book or top-N depth
//! - Rolling imbalance tracking
//!
//! A zero denominator never produces NaN: every signal returns `None` instead.

pub mod imbalance;
pub mod vwap;

pub use imbalance::{top_of_book_imbalance, volume_imbalance, ImbalanceTracker};
pub use vwap::{execution_vwap, state_vwap, vwap, VwapAccumulator};
