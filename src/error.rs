//! Crate-wide error taxonomy.
//!
//! Propagator/search failure is *not* represented here: it is recovered
//! locally by backtracking and never escapes as an `Error` (see
//! `fd::propagator::Failed`). `Error` is reserved for conditions a caller
//! must be told about: bad constructor arguments, cancellation, and
//! definite infeasibility detected before any search begins.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument to {constructor}: {reason}")]
    InvalidArgument {
        constructor: &'static str,
        reason: String,
    },

    #[error("model is infeasible at the root: {reason}")]
    InfeasibleAtRoot { reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(constructor: &'static str, reason: impl Into<String>) -> Error {
        Error::InvalidArgument {
            constructor,
            reason: reason.into(),
        }
    }
}
