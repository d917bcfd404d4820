//! Error taxonomy for relay operations.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Everything that can go wrong between receiving a request and answering it.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The caller-supplied value is not something we are willing to pass on.
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The external program could not be started at all.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program did not finish before the deadline and was killed.
    #[error("{program} timed out after {}s", .after.as_secs_f64())]
    Timeout { program: String, after: Duration },

    /// The external program exited unsuccessfully.
    #[error("{program} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} wrote more than {limit} bytes to stdout")]
    OutputTooLarge { program: String, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// True when the caller, not the relay or its collaborators, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
