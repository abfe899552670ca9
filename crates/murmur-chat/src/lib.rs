//! LLM completion client for the Murmur backend.
//!
//! Wraps the Anthropic Messages API behind a small client that issues one
//! completion request per call, bounded by an explicit deadline. The raw
//! provider payload is kept alongside the extracted text so callers can
//! pass it through to their own clients unchanged.

mod client;
mod error;

pub use client::{extract_completion, Completion, CompletionClient, CompletionConfig};
pub use error::ChatError;
