use stampede_core::ErrorKind;
use thiserror::Error;

/// Failure of a single operation. Never leaves the workload: it is folded into a
/// [`stampede_core::RequestOutcome`] by the transaction hook.
#[derive(Debug, Error)]
pub(crate) enum OperationError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status}")]
    Status { status: u16 },

    #[error("Failed to decode response body: {source}")]
    Body {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("Capture `{var}` found nothing at `{pointer}`")]
    MissingCapture {
        status: u16,
        var: String,
        pointer: String,
    },
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Transport(err) if err.is_decode() => ErrorKind::Decode,
            OperationError::Transport(_) => ErrorKind::Network,
            OperationError::Status { .. } => ErrorKind::HttpStatus,
            OperationError::Body { .. } | OperationError::MissingCapture { .. } => ErrorKind::Decode,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            OperationError::Transport(err) => err.status().map(|s| s.as_u16()),
            OperationError::Status { status }
            | OperationError::Body { status, .. }
            | OperationError::MissingCapture { status, .. } => Some(*status),
        }
    }
}
