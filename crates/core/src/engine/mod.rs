//! Workflow execution engine.
//!
//! The WorkflowEngine runs two independent pipelines over one set of images:
//!
//! - **compiled**: OCR every image → compile the texts → call the compiler
//!   agent → fan the compiler's answer out to the responder agents
//! - **direct**: send every image plus a shared prompt to each direct agent
//!
//! Both pipelines run concurrently and report progress through a
//! [`RunTracker`]. A failure in one never affects the other.

use crate::agents::manager::AgentManager;
use crate::agents::upload::Upload;
use crate::compiler::compile_ocr_results;
use crate::extract::question_text;
use crate::ocr::OcrService;
use crate::state::tracker::RunTracker;
use futures::future::join_all;
use of_protocol::config_models::{OcrSettings, WorkflowConfig};
use of_protocol::image_models::{ImageItem, OcrResult};
use of_protocol::workflow_models::{AgentCallResult, AgentResultMap, FailureScope, StepId};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Everything one run needs. Images are cheap to clone (shared bytes).
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub images: Vec<ImageItem>,
    pub config: WorkflowConfig,
    pub ocr: OcrSettings,
}

/// How the compiled pipeline ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledOutcome {
    /// Reached the responder step. Some responders may still have failed.
    Completed {
        compiled_text: String,
        compiler_result: AgentCallResult,
        responder_results: AgentResultMap,
        failed_responders: usize,
    },
    /// Halted at `step`.
    Failed {
        step: StepId,
        error: String,
        scope: FailureScope,
    },
    Cancelled {
        step: StepId,
    },
    /// No compiler agent configured.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectOutcome {
    pub results: AgentResultMap,
    pub failed: usize,
}

impl DirectOutcome {
    pub fn all_failed(&self) -> bool {
        self.failed >= self.results.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    pub run_id: Uuid,
    pub compiled: CompiledOutcome,
    /// `None` when the direct pipeline is not configured.
    pub direct: Option<DirectOutcome>,
    pub cancelled: bool,
}

impl WorkflowOutcome {
    /// A run succeeds when it was not cancelled and the compiled pipeline
    /// reached its last step, or, without a compiled pipeline, when at least
    /// one direct agent answered.
    pub fn success(&self) -> bool {
        if self.cancelled {
            return false;
        }
        match &self.compiled {
            CompiledOutcome::Completed { .. } => true,
            CompiledOutcome::Failed { .. } | CompiledOutcome::Cancelled { .. } => false,
            CompiledOutcome::Skipped => self.direct.as_ref().is_some_and(|d| !d.all_failed()),
        }
    }

    pub fn error(&self) -> Option<String> {
        if self.cancelled {
            return Some(crate::state::tracker::CANCELLED_REASON.to_string());
        }
        match &self.compiled {
            CompiledOutcome::Failed { error, .. } => Some(error.clone()),
            CompiledOutcome::Skipped if !self.success() => {
                Some("All direct agents failed".to_string())
            }
            _ => None,
        }
    }
}

/// The main workflow execution engine.
pub struct WorkflowEngine {
    ocr: Arc<dyn OcrService>,
    agents: AgentManager,
}

impl WorkflowEngine {
    pub fn new(ocr: Arc<dyn OcrService>, agents: AgentManager) -> Self {
        Self { ocr, agents }
    }

    pub fn agents(&self) -> &AgentManager {
        &self.agents
    }

    /// Begin a run on `tracker` and execute it to completion.
    pub async fn run(&self, request: &WorkflowRequest, tracker: &RunTracker) -> WorkflowOutcome {
        tracker.begin().await;
        self.execute(request, tracker).await
    }

    /// Execute a run that `tracker` has already begun.
    ///
    /// Both pipelines are awaited before the run is reported finished.
    pub async fn execute(&self, request: &WorkflowRequest, tracker: &RunTracker) -> WorkflowOutcome {
        let (compiled, direct) = tokio::join!(
            self.run_compiled(request, tracker),
            self.run_direct(request, tracker)
        );

        let outcome = WorkflowOutcome {
            run_id: tracker.run_id(),
            cancelled: tracker.is_cancelled().await,
            compiled,
            direct,
        };

        tracker.finish(outcome.success(), outcome.error()).await;
        outcome
    }

    async fn run_compiled(&self, request: &WorkflowRequest, tracker: &RunTracker) -> CompiledOutcome {
        let Some(compiler_id) = request.config.compiler_agent.as_deref() else {
            return CompiledOutcome::Skipped;
        };

        // Step 1: OCR every image concurrently.
        tracker.step_started(StepId::OcrProcessing).await;
        let ocr_results = self.recognize_all(request, tracker).await;
        if tracker.is_cancelled().await {
            return CompiledOutcome::Cancelled {
                step: StepId::OcrProcessing,
            };
        }

        let total = ocr_results.len();
        let failed = ocr_results.iter().filter(|r| r.is_error()).count();
        if failed > 0 {
            let error = format!("OCR failed for {failed} of {total} images");
            let scope = FailureScope::of(failed, total);
            tracker
                .step_failed(StepId::OcrProcessing, error.clone(), scope)
                .await;
            return CompiledOutcome::Failed {
                step: StepId::OcrProcessing,
                error,
                scope,
            };
        }
        tracker
            .step_completed(StepId::OcrProcessing, Some(json!({ "processed": total })))
            .await;

        // Step 2: compile.
        tracker.step_started(StepId::OcrCompilation).await;
        let compiled_text = compile_ocr_results(&ocr_results);
        tracker.compiled_text(&compiled_text).await;
        tracker
            .step_completed(StepId::OcrCompilation, Some(Value::String(compiled_text.clone())))
            .await;

        // Step 3: compiler agent.
        if tracker.is_cancelled().await {
            return CompiledOutcome::Cancelled {
                step: StepId::OcrCompilation,
            };
        }
        tracker.step_started(StepId::QuestionCompiler).await;
        let compiler_result = self.agents.call(compiler_id, &compiled_text, &[]).await;
        if tracker.is_cancelled().await {
            return CompiledOutcome::Cancelled {
                step: StepId::QuestionCompiler,
            };
        }
        tracker.compiler_result(&compiler_result).await;

        if let Some(error) = &compiler_result.error {
            tracker
                .step_failed(StepId::QuestionCompiler, error.clone(), FailureScope::Total)
                .await;
            return CompiledOutcome::Failed {
                step: StepId::QuestionCompiler,
                error: error.clone(),
                scope: FailureScope::Total,
            };
        }
        tracker
            .step_completed(StepId::QuestionCompiler, compiler_result.data.clone())
            .await;

        // Step 4: responders.
        let question = question_text(compiler_result.data.as_ref().unwrap_or(&Value::Null));
        let responder_ids = &request.config.responder_agents;
        tracker.step_started(StepId::ResponseAgents).await;

        let results = self
            .agents
            .call_all(responder_ids, &question, &[], |id, result| async move {
                let label = self.agents.display_name(&id);
                tracker.responder_result(&id, &label, &result).await;
            })
            .await;
        if tracker.is_cancelled().await {
            return CompiledOutcome::Cancelled {
                step: StepId::ResponseAgents,
            };
        }

        let total = results.len();
        let failed_responders = results.iter().filter(|(_, r)| r.is_error()).count();
        if failed_responders > 0 {
            tracker
                .step_failed(
                    StepId::ResponseAgents,
                    format!("{failed_responders} of {total} response agents failed"),
                    FailureScope::of(failed_responders, total),
                )
                .await;
        } else {
            tracker
                .step_completed(StepId::ResponseAgents, Some(json!({ "completed": total })))
                .await;
        }

        CompiledOutcome::Completed {
            compiled_text,
            compiler_result,
            responder_results: results.into_iter().collect(),
            failed_responders,
        }
    }

    async fn recognize_all(&self, request: &WorkflowRequest, tracker: &RunTracker) -> Vec<OcrResult> {
        let calls = request.images.iter().map(|image| async move {
            tracker.image_started(&image.id).await;
            let result = self.ocr.recognize(image, &request.ocr).await;
            if result.is_error() {
                tracker.image_failed(&image.id, &result).await;
            } else {
                tracker.image_completed(&image.id, &result).await;
            }
            result
        });
        join_all(calls).await
    }

    async fn run_direct(&self, request: &WorkflowRequest, tracker: &RunTracker) -> Option<DirectOutcome> {
        if !request.config.direct_enabled() {
            return None;
        }

        let prompt = request.config.direct_prompt.as_deref().unwrap_or_default();
        let uploads: Vec<Upload> = request.images.iter().map(Upload::from_image).collect();
        let agent_ids = &request.config.direct_agents;

        let agent_count = agent_ids.iter().collect::<HashSet<_>>().len();

        tracker.direct_started(agent_count).await;
        let results = self
            .agents
            .call_all(agent_ids, prompt, &uploads, |id, result| async move {
                let label = self.agents.display_name(&id);
                tracker.direct_result(&id, &label, &result).await;
            })
            .await;

        let failed = results.iter().filter(|(_, r)| r.is_error()).count();
        tracker.direct_finished(failed, results.len()).await;

        Some(DirectOutcome {
            results: results.into_iter().collect(),
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::adapters::MockAgentCaller;
    use crate::ocr::MockOcr;
    use of_protocol::agent_models::AgentDescriptor;
    use of_protocol::ipc::Event;
    use of_protocol::workflow_models::{StepStatus, WorkflowState};
    use tokio::sync::{mpsc, Mutex};

    fn descriptors() -> Vec<AgentDescriptor> {
        ["compiler", "tutor", "checker", "vision"]
            .iter()
            .map(|id| AgentDescriptor::new(*id, *id, format!("http://localhost/{id}")))
            .collect()
    }

    fn request(image_names: &[&str], config: WorkflowConfig) -> WorkflowRequest {
        WorkflowRequest {
            images: image_names
                .iter()
                .enumerate()
                .map(|(i, name)| ImageItem::new(format!("img-{i}"), *name, "image/png", vec![i as u8]))
                .collect(),
            config,
            ocr: OcrSettings::default(),
        }
    }

    fn compiled_config() -> WorkflowConfig {
        WorkflowConfig {
            compiler_agent: Some("compiler".to_string()),
            responder_agents: vec!["tutor".to_string(), "checker".to_string()],
            ..Default::default()
        }
    }

    fn tracker_for(request: &WorkflowRequest) -> (RunTracker, Arc<Mutex<WorkflowState>>, mpsc::Receiver<Event>) {
        let state = Arc::new(Mutex::new(WorkflowState {
            images: request.images.clone(),
            ..Default::default()
        }));
        let (tx, rx) = mpsc::channel(1024);
        (RunTracker::new(state.clone(), tx, None), state, rx)
    }

    #[tokio::test]
    async fn test_compiled_pipeline_success() {
        let caller = MockAgentCaller::new().succeeding("compiler", json!({"text": "What is 2+2?"}));
        let engine = WorkflowEngine::new(
            Arc::new(MockOcr::new()),
            AgentManager::new(descriptors(), Arc::new(caller.clone())),
        );
        let request = request(&["a.png", "b.png"], compiled_config());
        let (tracker, state, _rx) = tracker_for(&request);

        let outcome = engine.run(&request, &tracker).await;

        assert!(outcome.success());
        assert!(outcome.direct.is_none());
        match &outcome.compiled {
            CompiledOutcome::Completed {
                compiled_text,
                responder_results,
                failed_responders,
                ..
            } => {
                assert!(compiled_text.starts_with("OCR #1 text of a.png FIN OCR #1"));
                assert_eq!(responder_results.len(), 2);
                assert_eq!(*failed_responders, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert_eq!(caller.calls_to("tutor")[0].question, "What is 2+2?");

        let state = state.lock().await;
        assert!(!state.is_running);
        assert!(state.steps.iter().all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn test_ocr_failure_halts_before_compiler() {
        let caller = MockAgentCaller::new();
        let engine = WorkflowEngine::new(
            Arc::new(MockOcr::new().failing("b.png", "unreadable")),
            AgentManager::new(descriptors(), Arc::new(caller.clone())),
        );
        let request = request(&["a.png", "b.png"], compiled_config());
        let (tracker, state, _rx) = tracker_for(&request);

        let outcome = engine.run(&request, &tracker).await;

        assert!(!outcome.success());
        assert_eq!(outcome.error().as_deref(), Some("OCR failed for 1 of 2 images"));
        assert!(caller.calls().is_empty());

        let state = state.lock().await;
        assert_eq!(state.step(StepId::OcrProcessing).unwrap().status, StepStatus::Error);
        assert_eq!(state.step(StepId::OcrCompilation).unwrap().status, StepStatus::Pending);
        assert!(state.compiled_text.is_empty());
    }

    #[tokio::test]
    async fn test_compiler_failure_skips_responders() {
        let caller = MockAgentCaller::new().failing("compiler", "Error 500: Internal Server Error");
        let engine = WorkflowEngine::new(
            Arc::new(MockOcr::new()),
            AgentManager::new(descriptors(), Arc::new(caller.clone())),
        );
        let request = request(&["a.png"], compiled_config());
        let (tracker, _state, _rx) = tracker_for(&request);

        let outcome = engine.run(&request, &tracker).await;

        assert!(matches!(
            outcome.compiled,
            CompiledOutcome::Failed {
                step: StepId::QuestionCompiler,
                scope: FailureScope::Total,
                ..
            }
        ));
        assert_eq!(caller.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_direct_only_run() {
        let caller = MockAgentCaller::new();
        let engine = WorkflowEngine::new(
            Arc::new(MockOcr::new()),
            AgentManager::new(descriptors(), Arc::new(caller.clone())),
        );
        let config = WorkflowConfig {
            direct_agents: vec!["vision".to_string()],
            direct_prompt: Some("Describe the images".to_string()),
            ..Default::default()
        };
        let request = request(&["a.png", "b.png"], config);
        let (tracker, state, _rx) = tracker_for(&request);

        let outcome = engine.run(&request, &tracker).await;

        assert_eq!(outcome.compiled, CompiledOutcome::Skipped);
        assert!(outcome.success());
        let calls = caller.calls_to("vision");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].upload_count, 2);
        assert_eq!(calls[0].question, "Describe the images");
        assert!(state.lock().await.direct_results.contains_key("vision"));
    }
}
