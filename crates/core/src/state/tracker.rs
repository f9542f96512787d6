//! Run-state transitions.
//!
//! A [`RunTracker`] is the only writer of per-run state: image statuses,
//! step statuses and agent results. Each transition updates the shared
//! [`WorkflowState`] and then emits the matching [`Event`].
//!
//! Transitions are forward-only. Once a run is cancelled, or superseded by a
//! newer run, further updates from it are dropped.

use crate::speech::Narrator;
use chrono::Utc;
use of_protocol::image_models::{ImageStatus, OcrResult};
use of_protocol::ipc::Event;
use of_protocol::workflow_models::{
    AgentCallResult, FailureScope, StepId, StepStatus, WorkflowState, WorkflowStep,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Error recorded on steps and images interrupted by a cancellation.
pub const CANCELLED_REASON: &str = "Cancelled by user";

#[derive(Clone)]
pub struct RunTracker {
    run_id: Uuid,
    state: Arc<Mutex<WorkflowState>>,
    events_tx: Sender<Event>,
    narrator: Option<Arc<Narrator>>,
}

impl RunTracker {
    pub fn new(
        state: Arc<Mutex<WorkflowState>>,
        events_tx: Sender<Event>,
        narrator: Option<Arc<Narrator>>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state,
            events_tx,
            narrator,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }

    /// Apply `f` if this run is still the live one. Returns `f`'s verdict.
    async fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut WorkflowState) -> bool,
    {
        let mut state = self.state.lock().await;
        if state.run_id != Some(self.run_id) || state.cancelled {
            return false;
        }
        f(&mut state)
    }

    /// Reset per-run state and mark the run as started.
    pub async fn begin(&self) {
        let image_count = {
            let mut state = self.state.lock().await;
            state.run_id = Some(self.run_id);
            state.steps = WorkflowStep::initial_steps();
            state.compiled_text.clear();
            state.compiler_result = None;
            state.responder_results.clear();
            state.direct_results.clear();
            state.is_running = true;
            state.cancelled = false;
            for image in &mut state.images {
                image.status = ImageStatus::Pending;
                image.ocr_result = None;
            }
            state.images.len()
        };

        tracing::info!(run_id = %self.run_id, images = image_count, "workflow started");
        self.emit(Event::WorkflowStarted {
            run_id: self.run_id,
            image_count,
        })
        .await;
    }

    /// True once the run was cancelled or replaced by a newer one.
    pub async fn is_cancelled(&self) -> bool {
        let state = self.state.lock().await;
        state.run_id != Some(self.run_id) || state.cancelled
    }

    async fn set_image_status(&self, image_id: &str, next: ImageStatus, result: Option<&OcrResult>) -> bool {
        self.update(|state| match state.image_mut(image_id) {
            Some(image) if image.status.can_transition_to(next) => {
                image.status = next;
                if let Some(result) = result {
                    image.ocr_result = Some(result.clone());
                }
                true
            }
            _ => false,
        })
        .await
    }

    pub async fn image_started(&self, image_id: &str) {
        if self.set_image_status(image_id, ImageStatus::Processing, None).await {
            self.emit(Event::ImageOcrStarted {
                run_id: self.run_id,
                image_id: image_id.to_string(),
            })
            .await;
        }
    }

    pub async fn image_completed(&self, image_id: &str, result: &OcrResult) {
        if self
            .set_image_status(image_id, ImageStatus::Completed, Some(result))
            .await
        {
            self.emit(Event::ImageOcrCompleted {
                run_id: self.run_id,
                image_id: image_id.to_string(),
                result: result.clone(),
            })
            .await;
        }
    }

    pub async fn image_failed(&self, image_id: &str, result: &OcrResult) {
        if self
            .set_image_status(image_id, ImageStatus::Error, Some(result))
            .await
        {
            let error = result.error.clone().unwrap_or_default();
            tracing::warn!(image = image_id, error = %error, "OCR failed");
            self.emit(Event::ImageOcrFailed {
                run_id: self.run_id,
                image_id: image_id.to_string(),
                error,
            })
            .await;
        }
    }

    pub async fn step_started(&self, step: StepId) {
        let started = self
            .update(|state| match state.step_mut(step) {
                Some(s) if s.status == StepStatus::Pending => {
                    s.status = StepStatus::Processing;
                    s.started_at = Some(Utc::now());
                    true
                }
                _ => false,
            })
            .await;

        if started {
            tracing::info!(run_id = %self.run_id, step = %step, "step started");
            self.emit(Event::StepStarted {
                run_id: self.run_id,
                step,
            })
            .await;
            self.emit(Event::Progress {
                run_id: self.run_id,
                current: step.ordinal(),
                total: StepId::ALL.len(),
                message: step.display_name().to_string(),
            })
            .await;
        }
    }

    pub async fn step_completed(&self, step: StepId, result: Option<Value>) {
        let completed = self
            .update(|state| match state.step_mut(step) {
                Some(s) if s.status == StepStatus::Processing => {
                    s.status = StepStatus::Completed;
                    s.ended_at = Some(Utc::now());
                    s.result = result.clone();
                    true
                }
                _ => false,
            })
            .await;

        if completed {
            tracing::info!(run_id = %self.run_id, step = %step, "step completed");
            self.emit(Event::StepCompleted {
                run_id: self.run_id,
                step,
                result,
            })
            .await;
        }
    }

    pub async fn step_failed(&self, step: StepId, error: impl Into<String>, scope: FailureScope) {
        let error = error.into();
        let failed = self
            .update(|state| match state.step_mut(step) {
                Some(s) if !s.status.is_terminal() => {
                    s.status = StepStatus::Error;
                    s.ended_at = Some(Utc::now());
                    s.error = Some(error.clone());
                    s.failure_scope = Some(scope);
                    true
                }
                _ => false,
            })
            .await;

        if failed {
            tracing::warn!(run_id = %self.run_id, step = %step, error = %error, "step failed");
            self.emit(Event::StepFailed {
                run_id: self.run_id,
                step,
                error,
                scope,
            })
            .await;
        }
    }

    pub async fn compiled_text(&self, text: &str) {
        let stored = self
            .update(|state| {
                state.compiled_text = text.to_string();
                true
            })
            .await;
        if stored {
            self.emit(Event::CompiledTextReady {
                run_id: self.run_id,
                text: text.to_string(),
            })
            .await;
        }
    }

    pub async fn compiler_result(&self, result: &AgentCallResult) {
        let stored = self
            .update(|state| {
                state.compiler_result = Some(result.clone());
                true
            })
            .await;
        if stored {
            self.emit(Event::CompilerResultReady {
                run_id: self.run_id,
                result: result.clone(),
            })
            .await;
        }
    }

    fn narrate(&self, agent_id: &str, label: &str, result: &AgentCallResult) {
        if let Some(narrator) = &self.narrator {
            narrator.narrate(agent_id, label, result);
        }
    }

    /// Record one responder outcome as soon as it resolves.
    pub async fn responder_result(&self, agent_id: &str, label: &str, result: &AgentCallResult) {
        let stored = self
            .update(|state| {
                state
                    .responder_results
                    .insert(agent_id.to_string(), result.clone());
                true
            })
            .await;
        if stored {
            self.emit(Event::ResponderAgentCompleted {
                run_id: self.run_id,
                agent_id: agent_id.to_string(),
                result: result.clone(),
            })
            .await;
            self.narrate(agent_id, label, result);
        }
    }

    pub async fn direct_started(&self, agent_count: usize) {
        if !self.is_cancelled().await {
            tracing::info!(run_id = %self.run_id, agents = agent_count, "direct agents started");
            self.emit(Event::DirectAgentsStarted {
                run_id: self.run_id,
                agent_count,
            })
            .await;
        }
    }

    /// Record one direct-agent outcome as soon as it resolves.
    pub async fn direct_result(&self, agent_id: &str, label: &str, result: &AgentCallResult) {
        let stored = self
            .update(|state| {
                state
                    .direct_results
                    .insert(agent_id.to_string(), result.clone());
                true
            })
            .await;
        if stored {
            self.emit(Event::DirectAgentCompleted {
                run_id: self.run_id,
                agent_id: agent_id.to_string(),
                result: result.clone(),
            })
            .await;
            self.narrate(agent_id, label, result);
        }
    }

    pub async fn direct_finished(&self, failed: usize, total: usize) {
        if !self.is_cancelled().await {
            tracing::info!(run_id = %self.run_id, failed, total, "direct agents finished");
            self.emit(Event::DirectAgentsFinished {
                run_id: self.run_id,
                failed,
                total,
            })
            .await;
        }
    }

    /// Mark the run as no longer running. No-op after a cancellation.
    pub async fn finish(&self, success: bool, error: Option<String>) {
        let finished = self
            .update(|state| {
                state.is_running = false;
                true
            })
            .await;
        if finished {
            tracing::info!(run_id = %self.run_id, success, "workflow finished");
            self.emit(Event::WorkflowFinished {
                run_id: self.run_id,
                success,
                error,
            })
            .await;
        }
    }

    /// Cancel the run.
    ///
    /// Steps and images still processing move to `Error` with
    /// [`CANCELLED_REASON`]; completed ones are left untouched. In-flight calls
    /// keep running but their results are discarded. Returns `false` if the
    /// run had already finished or been cancelled.
    pub async fn cancel(&self) -> bool {
        let interrupted = {
            let mut state = self.state.lock().await;
            if state.run_id != Some(self.run_id) || state.cancelled || !state.is_running {
                return false;
            }
            state.cancelled = true;
            state.is_running = false;

            let now = Utc::now();
            let mut interrupted = Vec::new();
            for step in &mut state.steps {
                if step.status == StepStatus::Processing {
                    step.status = StepStatus::Error;
                    step.ended_at = Some(now);
                    step.error = Some(CANCELLED_REASON.to_string());
                    step.failure_scope = Some(FailureScope::Total);
                    interrupted.push(step.id);
                }
            }
            for image in &mut state.images {
                if image.status == ImageStatus::Processing {
                    image.status = ImageStatus::Error;
                    image.ocr_result = Some(OcrResult::failure(0, CANCELLED_REASON));
                }
            }
            interrupted
        };

        tracing::info!(run_id = %self.run_id, "workflow cancelled");
        for step in interrupted {
            self.emit(Event::StepFailed {
                run_id: self.run_id,
                step,
                error: CANCELLED_REASON.to_string(),
                scope: FailureScope::Total,
            })
            .await;
        }
        self.emit(Event::WorkflowCancelled { run_id: self.run_id }).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use of_protocol::image_models::ImageItem;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn tracker_with_images(count: usize) -> (RunTracker, Arc<Mutex<WorkflowState>>, mpsc::Receiver<Event>) {
        let images = (0..count)
            .map(|i| ImageItem::new(format!("img-{i}"), format!("p{i}.png"), "image/png", vec![1]))
            .collect();
        let state = Arc::new(Mutex::new(WorkflowState {
            images,
            ..Default::default()
        }));
        let (tx, rx) = mpsc::channel(256);
        (RunTracker::new(state.clone(), tx, None), state, rx)
    }

    #[tokio::test]
    async fn test_begin_resets_run_state() {
        let (tracker, state, mut rx) = tracker_with_images(2);
        state.lock().await.compiled_text = "stale".to_string();

        tracker.begin().await;

        let state = state.lock().await;
        assert_eq!(state.run_id, Some(tracker.run_id()));
        assert!(state.is_running);
        assert!(state.compiled_text.is_empty());
        assert_eq!(state.steps.len(), 4);
        assert!(matches!(rx.recv().await, Some(Event::WorkflowStarted { image_count: 2, .. })));
    }

    #[tokio::test]
    async fn test_image_status_only_moves_forward() {
        let (tracker, state, _rx) = tracker_with_images(1);
        tracker.begin().await;

        tracker.image_started("img-0").await;
        tracker
            .image_completed("img-0", &OcrResult::success(200, json!("x")))
            .await;
        tracker
            .image_failed("img-0", &OcrResult::failure(500, "late"))
            .await;

        let state = state.lock().await;
        let image = state.image("img-0").unwrap();
        assert_eq!(image.status, ImageStatus::Completed);
        assert!(!image.ocr_result.as_ref().unwrap().is_error());
    }

    #[tokio::test]
    async fn test_step_transitions_emit_progress() {
        let (tracker, state, mut rx) = tracker_with_images(1);
        tracker.begin().await;
        let _ = rx.recv().await;

        tracker.step_started(StepId::OcrCompilation).await;
        assert!(matches!(rx.recv().await, Some(Event::StepStarted { step: StepId::OcrCompilation, .. })));
        match rx.recv().await {
            Some(Event::Progress { current, total, .. }) => {
                assert_eq!(current, 2);
                assert_eq!(total, 4);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        tracker.step_completed(StepId::OcrCompilation, None).await;
        // Completed steps cannot fail afterwards.
        tracker
            .step_failed(StepId::OcrCompilation, "late", FailureScope::Total)
            .await;

        let state = state.lock().await;
        assert_eq!(
            state.step(StepId::OcrCompilation).unwrap().status,
            StepStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_cancel_errors_processing_and_keeps_completed() {
        let (tracker, state, _rx) = tracker_with_images(2);
        tracker.begin().await;

        tracker.step_started(StepId::OcrProcessing).await;
        tracker.step_completed(StepId::OcrProcessing, None).await;
        tracker.step_started(StepId::OcrCompilation).await;
        tracker.image_started("img-1").await;

        assert!(tracker.cancel().await);
        assert!(!tracker.cancel().await);

        {
            let state = state.lock().await;
            assert!(state.cancelled);
            assert!(!state.is_running);
            assert_eq!(state.step(StepId::OcrProcessing).unwrap().status, StepStatus::Completed);
            let compiling = state.step(StepId::OcrCompilation).unwrap();
            assert_eq!(compiling.status, StepStatus::Error);
            assert_eq!(compiling.error.as_deref(), Some(CANCELLED_REASON));
            assert_eq!(state.step(StepId::QuestionCompiler).unwrap().status, StepStatus::Pending);
            assert_eq!(state.image("img-1").unwrap().status, ImageStatus::Error);
            assert_eq!(state.image("img-0").unwrap().status, ImageStatus::Pending);
        }

        // Late results are dropped.
        tracker
            .responder_result("tutor", "Tutor", &AgentCallResult::success(json!("late")))
            .await;
        assert!(state.lock().await.responder_results.is_empty());
    }

    #[tokio::test]
    async fn test_superseded_run_is_ignored() {
        let (old, state, _rx) = tracker_with_images(0);
        old.begin().await;

        let (tx, _rx2) = mpsc::channel(16);
        let new = RunTracker::new(state.clone(), tx, None);
        new.begin().await;

        old.compiled_text("old text").await;
        assert!(old.is_cancelled().await);
        assert!(state.lock().await.compiled_text.is_empty());
    }
}
