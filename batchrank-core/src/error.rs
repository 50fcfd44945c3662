/// Error types for ranking sessions.
use thiserror::Error;

use crate::types::ItemId;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, RankError>;

/// Error reported by an [`OrderOracle`](crate::oracle::OrderOracle) implementation.
pub type OracleError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RankError {
    /// Bad session parameters. Not retryable without new parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The submitted order does not match the requested group. The session is
    /// unchanged and the same group can be submitted again.
    #[error("malformed order: {0}")]
    MalformedOrder(#[from] OrderViolation),

    /// Result requested before the session terminated.
    #[error("result not ready: session has not terminated")]
    NotReady,

    /// Order submitted to a session that has already produced its result.
    #[error("session already terminated")]
    SessionTerminated,

    /// The oracle could not produce an order.
    #[error("order oracle failed: {0}")]
    Oracle(#[source] OracleError),
}

/// Ways a submitted order can fail to be a permutation of its group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderViolation {
    #[error("expected {expected} items, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("item {0} is not in the group")]
    UnexpectedItem(ItemId),

    #[error("item {0} appears more than once")]
    DuplicateItem(ItemId),

    #[error("group {index} of round {round} is not pending")]
    GroupNotPending { round: usize, index: usize },
}
