//! In-memory speech backend for testing.

use crate::speech::backend::{SpeechBackend, Utterance, Voice};
use crate::speech::error::SpeechError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    max_active: AtomicUsize,
    cancels: AtomicUsize,
    pauses: AtomicUsize,
    resumes: AtomicUsize,
}

/// Decrements the active count even when the speak future is dropped mid-playback.
struct ActiveGuard<'a>(&'a Counters);

impl<'a> ActiveGuard<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_active.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// "Speaks" by sleeping for a fixed duration and recording the text.
#[derive(Clone)]
pub struct MockSpeechBackend {
    duration: Duration,
    voices: Vec<Voice>,
    failing: HashSet<String>,
    spoken: Arc<Mutex<Vec<String>>>,
    counters: Arc<Counters>,
}

impl MockSpeechBackend {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            voices: vec![Voice::new("Test voice", "es-ES")],
            failing: HashSet::new(),
            spoken: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Make playback of `text` fail with a backend error.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Texts whose playback ran to completion, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Highest number of utterances observed playing at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.counters.cancels.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.counters.pauses.load(Ordering::SeqCst)
    }

    pub fn resume_count(&self) -> usize {
        self.counters.resumes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for MockSpeechBackend {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let _active = ActiveGuard::enter(&self.counters);
        tokio::time::sleep(self.duration).await;

        if self.failing.contains(&utterance.text) {
            return Err(SpeechError::Backend(format!("cannot speak '{}'", utterance.text)));
        }

        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(utterance.text);
        Ok(())
    }

    fn cancel(&self) {
        self.counters.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.counters.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.counters.resumes.fetch_add(1, Ordering::SeqCst);
    }
}
