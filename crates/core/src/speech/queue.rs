//! FIFO speech queue.
//!
//! Items are spoken one at a time in arrival order by a worker task that is
//! spawned on demand and exits once the queue drains. Every item that starts
//! playing receives `on_start` followed by exactly one of `on_end` or
//! `on_error`. Items discarded by `clear`/`stop` before playing receive none.

use crate::speech::backend::{select_voice, SpeechBackend, Utterance};
use crate::speech::error::SpeechError;
use of_protocol::config_models::SpeechSettings;
use of_protocol::ipc::Event;
use of_protocol::speech_models::{SpeechItemInfo, SpeechStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::sync::Notify;
use uuid::Uuid;

type Callback = Box<dyn FnOnce() + Send>;
type ErrorCallback = Box<dyn FnOnce(SpeechError) + Send>;

/// Lifecycle hooks for one queued item.
#[derive(Default)]
pub struct SpeechCallbacks {
    on_start: Option<Callback>,
    on_end: Option<Callback>,
    on_error: Option<ErrorCallback>,
}

impl SpeechCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_end(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(SpeechError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

struct QueuedItem {
    info: SpeechItemInfo,
    callbacks: SpeechCallbacks,
}

#[derive(Default)]
struct QueueState {
    enabled: bool,
    worker_active: bool,
    paused: bool,
    current: Option<SpeechItemInfo>,
    /// Signals the playing item to stop. Holds a permit if `stop` races ahead of playback.
    current_stop: Option<Arc<Notify>>,
    items: VecDeque<QueuedItem>,
    /// Bumped by `stop` so a worker finishing a cancelled item leaves newer state alone.
    generation: u64,
}

struct Inner {
    backend: Arc<dyn SpeechBackend>,
    settings: SpeechSettings,
    state: Mutex<QueueState>,
    events_tx: Option<Sender<Event>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self) -> SpeechStatus {
        let state = self.lock();
        SpeechStatus {
            enabled: state.enabled,
            playing: state.current.is_some(),
            paused: state.paused,
            queue_length: state.items.len(),
            current: state.current.clone(),
        }
    }

    fn publish_status(&self) {
        if let Some(tx) = &self.events_tx {
            // Status updates are advisory; a full channel drops them.
            let _ = tx.try_send(Event::SpeechStatusChanged(self.status()));
        }
    }

    fn utterance(&self, text: String) -> Utterance {
        Utterance {
            text,
            voice: select_voice(&self.backend.voices(), &self.settings.language),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        }
    }

    async fn run_worker(self: Arc<Self>) {
        loop {
            let next = {
                let mut state = self.lock();
                match state.items.pop_front() {
                    Some(item) => {
                        let stop = Arc::new(Notify::new());
                        state.current = Some(item.info.clone());
                        state.current_stop = Some(stop.clone());
                        state.paused = false;
                        Some((item, stop, state.generation))
                    }
                    None => {
                        state.worker_active = false;
                        state.current = None;
                        state.current_stop = None;
                        None
                    }
                }
            };

            let Some((item, stop, generation)) = next else {
                self.publish_status();
                return;
            };
            self.publish_status();

            let QueuedItem { info, callbacks } = item;
            tracing::debug!(id = %info.id, label = %info.label, "speech started");
            if let Some(on_start) = callbacks.on_start {
                on_start();
            }

            let utterance = self.utterance(info.text);
            let outcome = tokio::select! {
                result = self.backend.speak(utterance) => result,
                _ = stop.notified() => Err(SpeechError::Cancelled),
            };

            match outcome {
                Ok(()) => {
                    if let Some(on_end) = callbacks.on_end {
                        on_end();
                    }
                }
                Err(e) => {
                    tracing::warn!(id = %info.id, error = %e, "speech item failed");
                    if let Some(on_error) = callbacks.on_error {
                        on_error(e);
                    }
                }
            }

            {
                let mut state = self.lock();
                if state.generation == generation {
                    state.current = None;
                    state.current_stop = None;
                    state.paused = false;
                }
            }
            self.publish_status();

            tokio::time::sleep(Duration::from_millis(self.settings.gap_ms)).await;
        }
    }
}

/// Sequential playback queue over a [`SpeechBackend`].
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct SpeechQueue {
    inner: Arc<Inner>,
}

impl SpeechQueue {
    pub fn new(backend: Arc<dyn SpeechBackend>, settings: SpeechSettings) -> Self {
        Self::build(backend, settings, None)
    }

    /// Like [`SpeechQueue::new`], also publishing `SpeechStatusChanged` events.
    pub fn with_events(
        backend: Arc<dyn SpeechBackend>,
        settings: SpeechSettings,
        events_tx: Sender<Event>,
    ) -> Self {
        Self::build(backend, settings, Some(events_tx))
    }

    fn build(
        backend: Arc<dyn SpeechBackend>,
        settings: SpeechSettings,
        events_tx: Option<Sender<Event>>,
    ) -> Self {
        let state = QueueState {
            enabled: settings.enabled,
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                state: Mutex::new(state),
                events_tx,
            }),
        }
    }

    /// Append an item and start playback if idle.
    ///
    /// Returns the item id, or `None` when the queue is disabled or the text is blank.
    /// Must be called from within a tokio runtime.
    pub fn enqueue(
        &self,
        text: impl Into<String>,
        label: impl Into<String>,
        callbacks: SpeechCallbacks,
    ) -> Option<String> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }

        let id = format!("tts-{}", Uuid::new_v4());
        let spawn_worker = {
            let mut state = self.inner.lock();
            if !state.enabled {
                return None;
            }
            state.items.push_back(QueuedItem {
                info: SpeechItemInfo {
                    id: id.clone(),
                    label: label.into(),
                    text,
                },
                callbacks,
            });
            !std::mem::replace(&mut state.worker_active, true)
        };

        if spawn_worker {
            tokio::spawn(self.inner.clone().run_worker());
        } else {
            self.inner.publish_status();
        }
        Some(id)
    }

    /// Cancel the playing item and discard the whole queue.
    pub fn stop(&self) {
        {
            let mut state = self.inner.lock();
            state.items.clear();
            state.generation += 1;
            state.current = None;
            state.paused = false;
            if let Some(stop) = state.current_stop.take() {
                stop.notify_one();
            }
        }
        self.inner.backend.cancel();
        tracing::debug!("speech stopped and queue cleared");
        self.inner.publish_status();
    }

    /// Pause the playing item. No effect when idle.
    pub fn pause(&self) {
        let paused = {
            let mut state = self.inner.lock();
            if state.current.is_some() && !state.paused {
                state.paused = true;
                true
            } else {
                false
            }
        };
        if paused {
            self.inner.backend.pause();
            self.inner.publish_status();
        }
    }

    pub fn resume(&self) {
        let resumed = {
            let mut state = self.inner.lock();
            if state.current.is_some() && state.paused {
                state.paused = false;
                true
            } else {
                false
            }
        };
        if resumed {
            self.inner.backend.resume();
            self.inner.publish_status();
        }
    }

    /// Discard queued items without touching the one playing.
    pub fn clear(&self) {
        self.inner.lock().items.clear();
        self.inner.publish_status();
    }

    /// Disabling also stops playback and clears the queue.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.lock().enabled = enabled;
        if enabled {
            self.inner.publish_status();
        } else {
            self.stop();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    pub fn status(&self) -> SpeechStatus {
        self.inner.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::mock::MockSpeechBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn enabled_settings() -> SpeechSettings {
        SpeechSettings {
            enabled: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_enqueue_when_disabled_is_ignored() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_millis(10)));
        let queue = SpeechQueue::new(backend.clone(), SpeechSettings::default());

        assert!(queue.enqueue("hola", "tutor", SpeechCallbacks::new()).is_none());
        assert_eq!(queue.status().queue_length, 0);
    }

    #[tokio::test]
    async fn test_blank_text_is_ignored() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_millis(10)));
        let queue = SpeechQueue::new(backend, enabled_settings());
        assert!(queue.enqueue("   ", "tutor", SpeechCallbacks::new()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_play_in_fifo_order_one_at_a_time() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_secs(1)));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        for text in ["first", "second", "third"] {
            queue.enqueue(text, "agent", SpeechCallbacks::new());
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        let status = queue.status();
        assert!(status.playing);
        assert_eq!(status.queue_length, 2);
        assert_eq!(status.current.map(|c| c.text), Some("first".to_string()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.spoken(), vec!["first", "second", "third"]);
        assert_eq!(backend.max_concurrent(), 1);
        assert!(!queue.status().playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keeps_current_item() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_secs(1)));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        queue.enqueue("first", "a", SpeechCallbacks::new());
        queue.enqueue("second", "b", SpeechCallbacks::new());
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.clear();
        let status = queue.status();
        assert!(status.playing);
        assert_eq!(status.queue_length, 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.spoken(), vec!["first"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_current_and_empties_queue() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_secs(1)));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        let errors = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(AtomicUsize::new(0));
        let (e, n) = (errors.clone(), ends.clone());
        queue.enqueue(
            "first",
            "a",
            SpeechCallbacks::new()
                .on_end(move || {
                    n.fetch_add(1, Ordering::SeqCst);
                })
                .on_error(move |err| {
                    assert_eq!(err, SpeechError::Cancelled);
                    e.fetch_add(1, Ordering::SeqCst);
                }),
        );
        queue.enqueue("second", "b", SpeechCallbacks::new());
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.stop();
        let status = queue.status();
        assert!(!status.playing);
        assert_eq!(status.queue_length, 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(ends.load(Ordering::SeqCst), 0);
        assert!(backend.spoken().is_empty());
        assert_eq!(backend.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_error_advances_queue() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_millis(500)).failing_on("bad"));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        let errors = Arc::new(AtomicUsize::new(0));
        let e = errors.clone();
        queue.enqueue(
            "bad",
            "a",
            SpeechCallbacks::new().on_error(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            }),
        );
        queue.enqueue("good", "b", SpeechCallbacks::new());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(backend.spoken(), vec!["good"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume_only_affect_playing_item() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_secs(1)));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        queue.pause();
        assert!(!queue.status().paused);

        queue.enqueue("first", "a", SpeechCallbacks::new());
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.pause();
        assert!(queue.status().paused);
        queue.resume();
        assert!(!queue.status().paused);
        assert_eq!(backend.pause_count(), 1);
        assert_eq!(backend.resume_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_enabled_false_stops_everything() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_secs(1)));
        let queue = SpeechQueue::new(backend.clone(), enabled_settings());

        queue.enqueue("first", "a", SpeechCallbacks::new());
        queue.enqueue("second", "b", SpeechCallbacks::new());
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.set_enabled(false);
        let status = queue.status();
        assert!(!status.enabled);
        assert!(!status.playing);
        assert_eq!(status.queue_length, 0);
        assert!(queue.enqueue("third", "c", SpeechCallbacks::new()).is_none());
    }

    #[tokio::test]
    async fn test_status_events_are_published() {
        let backend = Arc::new(MockSpeechBackend::new(Duration::from_millis(1)));
        let (tx, mut rx) = tokio::sync::mpsc::channel(64);
        let queue = SpeechQueue::with_events(backend, enabled_settings(), tx);

        queue.enqueue("hello", "a", SpeechCallbacks::new());

        match rx.recv().await {
            Some(Event::SpeechStatusChanged(status)) => assert!(status.enabled),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
