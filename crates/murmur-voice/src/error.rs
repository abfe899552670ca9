use std::time::Duration;
use thiserror::Error;

/// Errors from the synthesis provider call.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The bounded wait elapsed before the provider responded.
    #[error("synthesis request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider was reachable but returned a non-success status.
    #[error("synthesis provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Transport-level failure (connect, TLS, body read).
    #[error("synthesis request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The text exceeds the synthesis input limit.
    #[error("synthesis input exceeds maximum size: {0} bytes")]
    InputTooLarge(usize),
}
