//! Runtime workflow state models.
//!
//! This module defines the structures for tracking the state of a workflow
//! run: the fixed step list of the compiled pipeline, per-agent outcomes and
//! the aggregate [`WorkflowState`] observed by the UI.

use crate::image_models::ImageItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

/// Normalized outcome of one remote agent call.
///
/// Exactly one of `data` / `error` is meaningful: failed calls carry an
/// error message and no data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AgentCallResult {
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentCallResult {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcomes keyed by agent id.
pub type AgentResultMap = BTreeMap<String, AgentCallResult>;

/// The fixed steps of the compiled pipeline, in execution order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    OcrProcessing,
    OcrCompilation,
    QuestionCompiler,
    ResponseAgents,
}

impl StepId {
    pub const ALL: [StepId; 4] = [
        StepId::OcrProcessing,
        StepId::OcrCompilation,
        StepId::QuestionCompiler,
        StepId::ResponseAgents,
    ];

    /// Wire identifier, e.g. `ocr-processing`.
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::OcrProcessing => "ocr-processing",
            StepId::OcrCompilation => "ocr-compilation",
            StepId::QuestionCompiler => "question-compiler",
            StepId::ResponseAgents => "response-agents",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StepId::OcrProcessing => "OCR processing of images",
            StepId::OcrCompilation => "OCR result compilation",
            StepId::QuestionCompiler => "Question compiler agent",
            StepId::ResponseAgents => "Response agents",
        }
    }

    /// 1-based position, used for progress reporting.
    pub fn ordinal(self) -> usize {
        match self {
            StepId::OcrProcessing => 1,
            StepId::OcrCompilation => 2,
            StepId::QuestionCompiler => 3,
            StepId::ResponseAgents => 4,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a workflow step.
///
/// Steps only move forward; `Completed` and `Error` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }
}

/// How much of a fan-out step failed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FailureScope {
    /// Some calls failed; the successful results are still available.
    Partial { failed: usize, total: usize },
    /// Nothing usable was produced.
    Total,
}

impl FailureScope {
    /// Scope for `failed` out of `total` sibling calls.
    pub fn of(failed: usize, total: usize) -> Self {
        if failed >= total {
            FailureScope::Total
        } else {
            FailureScope::Partial { failed, total }
        }
    }
}

/// One step of the compiled pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct WorkflowStep {
    pub id: StepId,
    pub name: String,
    pub status: StepStatus,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub result: Option<serde_json::Value>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub failure_scope: Option<FailureScope>,
}

impl WorkflowStep {
    pub fn pending(id: StepId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            status: StepStatus::Pending,
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
            failure_scope: None,
        }
    }

    /// The full step list for a fresh run.
    pub fn initial_steps() -> Vec<WorkflowStep> {
        StepId::ALL.iter().copied().map(WorkflowStep::pending).collect()
    }
}

/// Everything a UI needs to render a workflow session.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
pub struct WorkflowState {
    /// Identifier of the most recent run, if any.
    #[ts(type = "string | null")]
    pub run_id: Option<Uuid>,

    pub images: Vec<ImageItem>,

    pub steps: Vec<WorkflowStep>,

    #[serde(default)]
    pub compiled_text: String,

    #[serde(default)]
    pub compiler_result: Option<AgentCallResult>,

    #[serde(default)]
    pub responder_results: AgentResultMap,

    #[serde(default)]
    pub direct_results: AgentResultMap,

    pub is_running: bool,

    pub cancelled: bool,
}

impl WorkflowState {
    pub fn step(&self, id: StepId) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut WorkflowStep> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageItem> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn image_mut(&mut self, id: &str) -> Option<&mut ImageItem> {
        self.images.iter_mut().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_steps_are_pending_and_ordered() {
        let steps = WorkflowStep::initial_steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].id, StepId::OcrProcessing);
        assert_eq!(steps[3].id, StepId::ResponseAgents);
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[test]
    fn test_failure_scope_of() {
        assert_eq!(
            FailureScope::of(1, 3),
            FailureScope::Partial { failed: 1, total: 3 }
        );
        assert_eq!(FailureScope::of(3, 3), FailureScope::Total);
        assert_eq!(FailureScope::of(0, 0), FailureScope::Total);
    }

    #[test]
    fn test_step_id_wire_names() {
        for id in StepId::ALL {
            let json = serde_json::to_value(id).unwrap();
            assert_eq!(json, id.as_str());
        }
    }

    #[test]
    fn test_agent_call_result_constructors() {
        let ok = AgentCallResult::success(serde_json::json!({"text": "hi"}));
        assert!(!ok.is_error());
        let err = AgentCallResult::failure("boom");
        assert!(err.is_error());
        assert!(err.data.is_none());
    }
}
