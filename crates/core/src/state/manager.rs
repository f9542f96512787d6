//! Session manager for a single workflow.
//!
//! The WorkflowSession owns the image collection and the observable
//! [`WorkflowState`]. It validates the configuration, starts runs on the
//! [`WorkflowEngine`], forwards cancellation, and dispatches protocol
//! [`Op`]s coming from a UI.

use crate::agents::upload::detect_mime_type;
use crate::engine::{WorkflowEngine, WorkflowOutcome, WorkflowRequest};
use crate::speech::{Narrator, SpeechQueue};
use crate::state::error::{WorkflowError, WorkflowResult};
use crate::state::tracker::RunTracker;
use of_protocol::config_models::{OcrSettings, WorkflowConfig};
use of_protocol::image_models::ImageItem;
use of_protocol::ipc::{Event, Op};
use of_protocol::workflow_models::WorkflowState;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// An image supplied by the caller (file upload or camera capture).
#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub data: Vec<u8>,
    /// Detected from the file extension when `None`.
    pub mime_type: Option<String>,
}

impl NewImage {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            mime_type: None,
        }
    }
}

/// A run executing in the background.
pub struct StartedRun {
    pub run_id: Uuid,
    pub handle: JoinHandle<WorkflowOutcome>,
}

/// Manages one workflow: its images, its runs and its speech output.
pub struct WorkflowSession {
    engine: Arc<WorkflowEngine>,
    config: WorkflowConfig,
    ocr: OcrSettings,

    /// Shared with every run tracker.
    state: Arc<Mutex<WorkflowState>>,

    /// The latest run. Also serializes run starts.
    current: Mutex<Option<RunTracker>>,

    narrator: Option<Arc<Narrator>>,

    events_tx: mpsc::Sender<Event>,
}

impl WorkflowSession {
    pub fn new(
        engine: WorkflowEngine,
        config: WorkflowConfig,
        ocr: OcrSettings,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        let state = WorkflowState {
            steps: of_protocol::workflow_models::WorkflowStep::initial_steps(),
            ..Default::default()
        };
        Self {
            engine: Arc::new(engine),
            config,
            ocr,
            state: Arc::new(Mutex::new(state)),
            current: Mutex::new(None),
            narrator: None,
            events_tx,
        }
    }

    /// Narrate agent results through `queue`.
    pub fn with_speech(mut self, queue: SpeechQueue) -> Self {
        self.narrator = Some(Arc::new(Narrator::new(queue)));
        self
    }

    pub fn speech(&self) -> Option<&SpeechQueue> {
        self.narrator.as_ref().map(|n| n.queue())
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.state.lock().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_running
    }

    /// Add images up to `max_images`. Returns the ids of the images kept.
    pub async fn add_images(&self, images: Vec<NewImage>) -> WorkflowResult<Vec<String>> {
        let mut state = self.state.lock().await;
        if state.is_running {
            return Err(WorkflowError::AlreadyRunning);
        }

        let room = self.config.max_images.saturating_sub(state.images.len());
        let offered = images.len();
        let mut added = Vec::new();

        for image in images.into_iter().take(room) {
            let mime_type = image
                .mime_type
                .unwrap_or_else(|| detect_mime_type(&image.name).to_string());
            let id = Uuid::new_v4().to_string();
            state
                .images
                .push(ImageItem::new(id.clone(), image.name, mime_type, image.data));
            added.push(id);
        }

        if added.len() < offered {
            tracing::warn!(
                dropped = offered - added.len(),
                max = self.config.max_images,
                "image limit reached"
            );
        }
        Ok(added)
    }

    pub async fn remove_image(&self, image_id: &str) -> WorkflowResult<()> {
        let mut state = self.state.lock().await;
        if state.is_running {
            return Err(WorkflowError::AlreadyRunning);
        }
        let before = state.images.len();
        state.images.retain(|i| i.id != image_id);
        if state.images.len() == before {
            return Err(WorkflowError::ImageNotFound(image_id.to_string()));
        }
        Ok(())
    }

    pub async fn clear_images(&self) -> WorkflowResult<()> {
        let mut state = self.state.lock().await;
        if state.is_running {
            return Err(WorkflowError::AlreadyRunning);
        }
        state.images.clear();
        Ok(())
    }

    /// Cancel any running workflow and return to an empty session.
    pub async fn reset_all(&self) {
        self.cancel().await;
        if let Some(narrator) = &self.narrator {
            narrator.reset();
        }
        let mut state = self.state.lock().await;
        *state = WorkflowState {
            steps: of_protocol::workflow_models::WorkflowStep::initial_steps(),
            ..Default::default()
        };
    }

    /// Every problem preventing a run, or an empty list.
    pub async fn problems(&self) -> Vec<String> {
        let image_count = self.state.lock().await.images.len();
        let agents = self.engine.agents();
        let config = &self.config;
        let mut problems = Vec::new();

        if image_count == 0 {
            problems.push("Add at least one image".to_string());
        }

        if !config.compiled_enabled() && !config.direct_enabled() {
            problems.push("Configure a compiler agent or direct agents with a prompt".to_string());
        }

        if let Some(compiler) = &config.compiler_agent {
            if !self.ocr.has_credentials() {
                problems.push("OCR credentials are missing".to_string());
            }
            if !agents.contains(compiler) {
                problems.push(format!("Unknown compiler agent: {compiler}"));
            }
            if config.responder_agents.is_empty() {
                problems.push("Select at least one response agent".to_string());
            }
        }

        for id in &config.responder_agents {
            if !agents.contains(id) {
                problems.push(format!("Unknown response agent: {id}"));
            }
        }
        for id in repeated(&config.responder_agents) {
            problems.push(format!("Duplicate response agent: {id}"));
        }

        if !config.direct_agents.is_empty() && !config.direct_enabled() {
            problems.push("Direct agents need a prompt".to_string());
        }
        for id in &config.direct_agents {
            if !agents.contains(id) {
                problems.push(format!("Unknown direct agent: {id}"));
            }
        }
        for id in repeated(&config.direct_agents) {
            problems.push(format!("Duplicate direct agent: {id}"));
        }

        problems
    }

    pub async fn validate(&self) -> WorkflowResult<()> {
        let problems = self.problems().await;
        if problems.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidConfiguration(problems))
        }
    }

    /// Validate, reset per-run state and begin a new run.
    async fn prepare(&self) -> WorkflowResult<(RunTracker, WorkflowRequest)> {
        self.validate().await?;

        let mut current = self.current.lock().await;
        if self.state.lock().await.is_running {
            return Err(WorkflowError::AlreadyRunning);
        }

        if let Some(narrator) = &self.narrator {
            narrator.reset();
        }

        let tracker = RunTracker::new(
            self.state.clone(),
            self.events_tx.clone(),
            self.narrator.clone(),
        );
        tracker.begin().await;
        *current = Some(tracker.clone());

        let request = WorkflowRequest {
            images: self.state.lock().await.images.clone(),
            config: self.config.clone(),
            ocr: self.ocr.clone(),
        };
        Ok((tracker, request))
    }

    /// Run the workflow to completion.
    pub async fn run(&self) -> WorkflowResult<WorkflowOutcome> {
        let (tracker, request) = self.prepare().await?;
        Ok(self.engine.execute(&request, &tracker).await)
    }

    /// Start the workflow on a background task.
    pub async fn start(&self) -> WorkflowResult<StartedRun> {
        let (tracker, request) = self.prepare().await?;
        let engine = Arc::clone(&self.engine);
        let run_id = tracker.run_id();

        let handle = tokio::spawn(async move { engine.execute(&request, &tracker).await });
        Ok(StartedRun { run_id, handle })
    }

    /// Cancel the running workflow. Returns `false` when nothing was running.
    pub async fn cancel(&self) -> bool {
        let tracker = self.current.lock().await.clone();
        match tracker {
            Some(tracker) => tracker.cancel().await,
            None => false,
        }
    }

    fn queue(&self) -> WorkflowResult<&SpeechQueue> {
        self.speech().ok_or(WorkflowError::SpeechUnavailable)
    }

    /// Dispatch one protocol operation.
    pub async fn handle(&self, op: Op) -> WorkflowResult<()> {
        tracing::debug!(?op, "handling op");
        match op {
            Op::StartWorkflow => {
                self.start().await?;
            }
            Op::CancelWorkflow => {
                if !self.cancel().await {
                    return Err(WorkflowError::NotRunning);
                }
            }
            Op::ResetImages => self.clear_images().await?,
            Op::ResetAll => self.reset_all().await,
            Op::RemoveImage { image_id } => self.remove_image(&image_id).await?,
            Op::SpeakAgentResult { agent_id } => {
                let narrator = self.narrator.as_ref().ok_or(WorkflowError::SpeechUnavailable)?;
                let result = {
                    let state = self.state.lock().await;
                    state
                        .responder_results
                        .get(&agent_id)
                        .or_else(|| state.direct_results.get(&agent_id))
                        .cloned()
                }
                .ok_or_else(|| WorkflowError::AgentResultNotFound(agent_id.clone()))?;
                let label = self.engine.agents().display_name(&agent_id);
                if narrator.speak_now(&label, &result).is_none() {
                    return Err(WorkflowError::AgentResultNotFound(agent_id));
                }
            }
            Op::SpeechStop => self.queue()?.stop(),
            Op::SpeechPause => self.queue()?.pause(),
            Op::SpeechResume => self.queue()?.resume(),
            Op::SpeechClear => self.queue()?.clear(),
            Op::SpeechSetEnabled { enabled } => self.queue()?.set_enabled(enabled),
            Op::GetState => {
                let snapshot = self.snapshot().await;
                if let Err(e) = self.events_tx.try_send(Event::StateSnapshot(snapshot)) {
                    tracing::debug!("Dropped state snapshot: {e}");
                }
            }
        }
        Ok(())
    }
}

/// Ids that appear more than once, each reported once in first-seen order.
fn repeated(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for id in ids {
        if !seen.insert(id.as_str()) && !repeated.contains(&id.as_str()) {
            repeated.push(id.as_str());
        }
    }
    repeated
}
