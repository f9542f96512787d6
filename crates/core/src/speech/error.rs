//! Error types for speech playback.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("Speech backend error: {0}")]
    Backend(String),

    #[error("Playback cancelled")]
    Cancelled,

    #[error("Speech synthesis is not supported: {0}")]
    Unsupported(String),
}
