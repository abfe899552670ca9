//! Speech synthesis for the Murmur backend.
//!
//! Renders completion text to audio through the ElevenLabs text-to-speech
//! API, and derives the spoken portion of a completion by stripping fenced
//! code regions. Synthesis is best-effort by design: callers treat every
//! failure here as "no audio", never as a request failure.

mod error;
mod spoken;
mod tts;

pub use error::VoiceError;
pub use spoken::spoken_text;
pub use tts::{TtsClient, TtsConfig, VoiceSettings};
