use thiserror::Error;

/// error taxonomy for the mining core.
///
/// `NumericUnderflow` deliberately has no variant here: per the design, an
/// element whose joined log-probability drops to or below `LOG_EPSILON` is a
/// silent prune, not an error.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("mining run cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

pub type MiningResult<T> = Result<T, MiningError>;
