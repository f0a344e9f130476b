use thiserror::Error;

/// Errors surfaced by the gateway.
///
/// Nothing here is fatal: the worst case for any classified turn is a fall
/// back to plain-text rendering of the backend's `answer`.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The backend did not answer within the configured deadline.
    #[error("The request timed out after {0} seconds. Please try again.")]
    Timeout(u64),

    /// Transport-level failure other than a timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend reported an explicit error in its payload.
    #[error("{0}")]
    Backend(String),

    /// The backend answered with `authorized: false`.
    #[error("Access denied: {0}")]
    Unauthorized(String),

    /// A question is already in flight; concurrent sends are rejected, not queued.
    #[error("A question is already being processed. Please wait for it to finish.")]
    RequestPending,

    /// Table extraction failed. Log-only: callers degrade to text rendering.
    #[error("Malformed analytics payload: {0}")]
    MalformedData(String),

    /// The requested chart type cannot render the current table.
    #[error("'{chart}' is not compatible with this data: {reason}")]
    IncompatibleChart { chart: String, reason: String },
}

impl GatewayError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Timeout(_) => 504,
            GatewayError::Network(_) => 502,
            GatewayError::Backend(_) => 502,
            GatewayError::Unauthorized(_) => 403,
            GatewayError::RequestPending => 429,
            GatewayError::MalformedData(_) => 422,
            GatewayError::IncompatibleChart { .. } => 409,
        }
    }
}
