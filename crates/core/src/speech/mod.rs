//! Serialized text-to-speech playback.
//!
//! - [`SpeechBackend`]: the synthesizer seam (platform engine, console, fake)
//! - [`SpeechQueue`]: FIFO queue playing at most one item at a time
//! - [`Narrator`]: narrates agent results once per run

pub mod backend;
pub mod error;
pub mod mock;
pub mod narrator;
pub mod queue;

pub use backend::{select_voice, SpeechBackend, Utterance, Voice};
pub use error::SpeechError;
pub use mock::MockSpeechBackend;
pub use narrator::Narrator;
pub use queue::{SpeechCallbacks, SpeechQueue};
