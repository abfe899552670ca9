use std::time::Duration;
use thiserror::Error;

/// Errors from the completion provider call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The bounded wait elapsed before the provider responded. The
    /// in-flight request is abandoned, not cancelled at the transport
    /// level.
    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider was reachable but returned a non-success status.
    #[error("completion provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider responded 2xx but the payload shape was unexpected.
    #[error("unexpected completion payload: {0}")]
    MalformedPayload(String),
}
