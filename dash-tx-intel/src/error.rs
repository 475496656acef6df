//! Error types for the transaction intelligence layer.
//!
//! Almost every operation in this crate degrades to a deterministic fallback
//! instead of failing. The variants below cover the few conditions that must
//! reach the caller.

use thiserror::Error;

use crate::transaction::Txid;

/// Main error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bus receiver lagged {0} events")]
    EventBusLagged(u64),

    #[error("Event bus closed")]
    EventBusClosed,

    #[error("Transaction {txid} accepted by both wrapper {first} and wrapper {second}")]
    InvariantViolation {
        txid: Txid,
        first: String,
        second: String,
    },
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
