//! Speech synthesizer abstraction.

use crate::speech::error::SpeechError;
use async_trait::async_trait;

/// A voice offered by a backend, tagged with a BCP-47 language (`es-ES`, `en-US`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// One piece of text to speak with its voice parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// `None` uses the backend's default voice.
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// A text-to-speech engine.
///
/// `speak` resolves when playback of the utterance has finished. The queue
/// guarantees it is never called while another utterance is playing.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Abort the utterance currently playing, if any.
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);
}

/// English and native names used to recognize a language from a voice name.
fn language_names(language: &str) -> &'static [&'static str] {
    match language {
        "es" => &["spanish", "español"],
        "en" => &["english"],
        "fr" => &["french", "français"],
        "de" => &["german", "deutsch"],
        "it" => &["italian", "italiano"],
        "pt" => &["portuguese", "português"],
        _ => &[],
    }
}

/// Pick a voice for `language`.
///
/// Prefers a voice whose language tag starts with `language`, then one whose
/// name mentions the language. `None` means the platform default.
pub fn select_voice(voices: &[Voice], language: &str) -> Option<Voice> {
    let language = language.to_lowercase();
    let primary = language.split(['-', '_']).next().unwrap_or_default();

    voices
        .iter()
        .find(|v| v.language.to_lowercase().starts_with(&language))
        .or_else(|| {
            let names = language_names(primary);
            voices.iter().find(|v| {
                let name = v.name.to_lowercase();
                names.iter().any(|n| name.contains(n))
            })
        })
        .cloned()
}
