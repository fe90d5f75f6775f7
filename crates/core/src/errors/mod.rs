//! Error types and Result alias for the CoupUp core

use thiserror::Error;

/// Main error type for the CoupUp core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Coupon is on cooldown for {remaining_days} more day(s)")]
    OnCooldown { remaining_days: i64 },

    #[error("Shared store write failed: {0}")]
    StoreWrite(String),

    #[error("Shared store read failed: {0}")]
    StoreRead(String),

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Shared store operation timed out: {op}")]
    StoreTimeout { op: &'static str },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
