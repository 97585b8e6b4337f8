//! Error types for the backtest core.

use thiserror::Error;

use crate::order::{OrderId, OrderState};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the backtest core.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed tick, order parameters or fill.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal order state-machine transition. The order is left unchanged.
    #[error("Invalid transition for order {id}: cannot {action} from {from:?}")]
    InvalidTransition {
        id: OrderId,
        from: OrderState,
        action: &'static str,
    },

    /// Command referenced an order that does not exist in this run.
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(id: OrderId, from: OrderState, action: &'static str) -> Self {
        Error::InvalidTransition { id, from, action }
    }

    /// Is this a validation error?
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Is this an invalid transition error?
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Error::InvalidTransition { .. })
    }
}
