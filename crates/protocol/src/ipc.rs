//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a user interface and the workflow core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the UI to the core
//! - `Event`: Progress and status updates sent from the core to the UI
//!
//! Every run-scoped event carries the `run_id` so that late updates from a
//! previous run can be told apart from the current one.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::image_models::OcrResult;
use crate::speech_models::SpeechStatus;
use crate::workflow_models::{AgentCallResult, FailureScope, StepId, WorkflowState};

/// Operations sent from the UI to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// { "type": "removeImage", "payload": { "image_id": "..." } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Run both pipelines with the session's images and configuration.
    StartWorkflow,

    /// Mark in-flight steps as cancelled. Completed steps are kept.
    CancelWorkflow,

    /// Drop all images, keep steps and results.
    ResetImages,

    /// Drop images, steps and results.
    ResetAll,

    RemoveImage { image_id: String },

    /// Queue the stored result of an agent for narration.
    SpeakAgentResult { agent_id: String },

    SpeechStop,
    SpeechPause,
    SpeechResume,
    SpeechClear,
    SpeechSetEnabled { enabled: bool },

    /// Ask for a full `StateSnapshot`.
    GetState,
}

/// Events sent from the core to the UI.
///
/// ```json
/// {
///   "type": "stepFailed",
///   "payload": { "run_id": "…", "step": "response-agents", "error": "…", "scope": { "kind": "partial", "failed": 1, "total": 3 } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    WorkflowStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        image_count: usize,
    },

    /// Coarse progress of the compiled pipeline (`current` of `total` steps).
    Progress {
        #[ts(type = "string")]
        run_id: Uuid,
        current: usize,
        total: usize,
        message: String,
    },

    ImageOcrStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        image_id: String,
    },

    ImageOcrCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        image_id: String,
        result: OcrResult,
    },

    ImageOcrFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        image_id: String,
        error: String,
    },

    StepStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        step: StepId,
    },

    StepCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        step: StepId,
        result: Option<serde_json::Value>,
    },

    StepFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        step: StepId,
        error: String,
        scope: FailureScope,
    },

    /// The compiled OCR text, published before the agents run.
    CompiledTextReady {
        #[ts(type = "string")]
        run_id: Uuid,
        text: String,
    },

    CompilerResultReady {
        #[ts(type = "string")]
        run_id: Uuid,
        result: AgentCallResult,
    },

    /// One responder finished; siblings may still be in flight.
    ResponderAgentCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        agent_id: String,
        result: AgentCallResult,
    },

    DirectAgentsStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        agent_count: usize,
    },

    /// One direct agent finished; siblings may still be in flight.
    DirectAgentCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        agent_id: String,
        result: AgentCallResult,
    },

    DirectAgentsFinished {
        #[ts(type = "string")]
        run_id: Uuid,
        failed: usize,
        total: usize,
    },

    WorkflowFinished {
        #[ts(type = "string")]
        run_id: Uuid,
        success: bool,
        error: Option<String>,
    },

    WorkflowCancelled {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    StateSnapshot(WorkflowState),

    SpeechStatusChanged(SpeechStatus),
}

impl Event {
    /// The run this event belongs to, if it is run-scoped.
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            Event::WorkflowStarted { run_id, .. }
            | Event::Progress { run_id, .. }
            | Event::ImageOcrStarted { run_id, .. }
            | Event::ImageOcrCompleted { run_id, .. }
            | Event::ImageOcrFailed { run_id, .. }
            | Event::StepStarted { run_id, .. }
            | Event::StepCompleted { run_id, .. }
            | Event::StepFailed { run_id, .. }
            | Event::CompiledTextReady { run_id, .. }
            | Event::CompilerResultReady { run_id, .. }
            | Event::ResponderAgentCompleted { run_id, .. }
            | Event::DirectAgentsStarted { run_id, .. }
            | Event::DirectAgentCompleted { run_id, .. }
            | Event::DirectAgentsFinished { run_id, .. }
            | Event::WorkflowFinished { run_id, .. }
            | Event::WorkflowCancelled { run_id } => Some(*run_id),
            Event::StateSnapshot(state) => state.run_id,
            Event::SpeechStatusChanged(_) => None,
        }
    }
}
