//! Speech backend that "reads" text on the console.
//!
//! Words are printed to stderr at a steady pace so that narration keeps the
//! same timing and ordering as a real synthesizer would.

use async_trait::async_trait;
use colored::Colorize;
use of_core::speech::{SpeechBackend, SpeechError, Utterance, Voice};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Speaking pace at `rate == 1.0`.
const WORDS_PER_MINUTE: f32 = 180.0;

pub struct ConsoleSpeech {
    paused: AtomicBool,
    cancel: Notify,
}

impl ConsoleSpeech {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            cancel: Notify::new(),
        }
    }
}

/// Time spent on one word at `rate`.
fn word_duration(rate: f32) -> Duration {
    let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    Duration::from_secs_f32(60.0 / (WORDS_PER_MINUTE * rate))
}

#[async_trait]
impl SpeechBackend for ConsoleSpeech {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Console", "und")]
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let per_word = word_duration(utterance.rate);
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{} ", "»".dimmed());

        for word in utterance.text.split_whitespace() {
            loop {
                tokio::select! {
                    _ = self.cancel.notified() => {
                        let _ = writeln!(stderr);
                        return Err(SpeechError::Cancelled);
                    }
                    _ = tokio::time::sleep(per_word) => {}
                }
                if !self.paused.load(Ordering::SeqCst) {
                    break;
                }
            }
            let _ = write!(stderr, "{} ", word.italic());
            let _ = stderr.flush();
        }

        let _ = writeln!(stderr);
        Ok(())
    }

    fn cancel(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.cancel.notify_waiters();
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}
