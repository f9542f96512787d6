//! Console rendering of workflow events and final state.

use colored::Colorize;
use of_core::extract::display_text;
use of_protocol::image_models::ImageStatus;
use of_protocol::ipc::Event;
use of_protocol::workflow_models::{AgentCallResult, FailureScope, StepStatus, WorkflowState};
use std::collections::HashMap;

/// Turns events into progress lines using human-readable names.
#[derive(Default)]
pub struct Renderer {
    agent_labels: HashMap<String, String>,
    image_names: HashMap<String, String>,
}

impl Renderer {
    pub fn new(
        agent_labels: impl IntoIterator<Item = (String, String)>,
        image_names: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            agent_labels: agent_labels.into_iter().collect(),
            image_names: image_names.into_iter().collect(),
        }
    }

    fn agent<'a>(&'a self, id: &'a str) -> &'a str {
        self.agent_labels.get(id).map(String::as_str).unwrap_or(id)
    }

    fn image<'a>(&'a self, id: &'a str) -> &'a str {
        self.image_names.get(id).map(String::as_str).unwrap_or(id)
    }

    fn agent_line(&self, agent_id: &str, result: &AgentCallResult) -> String {
        match &result.error {
            Some(error) => format!("  {} {}: {}", "✗".red(), self.agent(agent_id), error.red()),
            None => format!("  {} {} answered", "✓".green(), self.agent(agent_id)),
        }
    }

    /// One line per event worth showing. Status-only events yield `None`.
    pub fn line(&self, event: &Event) -> Option<String> {
        let line = match event {
            Event::WorkflowStarted { image_count, .. } => {
                format!("{} workflow with {} image(s)", "Starting".bold(), image_count)
            }
            Event::Progress {
                current,
                total,
                message,
                ..
            } => format!("{} {}", format!("[{current}/{total}]").cyan(), message),
            Event::ImageOcrCompleted { image_id, .. } => {
                format!("  {} OCR {}", "✓".green(), self.image(image_id))
            }
            Event::ImageOcrFailed { image_id, error, .. } => {
                format!("  {} OCR {}: {}", "✗".red(), self.image(image_id), error.red())
            }
            Event::StepFailed { step, error, scope, .. } => {
                let scope = match scope {
                    FailureScope::Partial { .. } => "partial",
                    FailureScope::Total => "total",
                };
                format!(
                    "  {} {} ({}): {}",
                    "!".yellow().bold(),
                    step.display_name(),
                    scope,
                    error.yellow()
                )
            }
            Event::CompiledTextReady { text, .. } => {
                format!("  compiled {} characters of OCR text", text.chars().count())
            }
            Event::CompilerResultReady { result, .. } if result.is_error() => return None,
            Event::CompilerResultReady { .. } => format!("  {} question compiled", "✓".green()),
            Event::ResponderAgentCompleted { agent_id, result, .. }
            | Event::DirectAgentCompleted { agent_id, result, .. } => self.agent_line(agent_id, result),
            Event::DirectAgentsStarted { agent_count, .. } => {
                format!("{} {} direct agent(s)", "Calling".bold(), agent_count)
            }
            Event::DirectAgentsFinished { failed, total, .. } => {
                format!("  direct agents done, {failed} of {total} failed")
            }
            Event::WorkflowFinished { success: true, .. } => format!("{}", "Workflow finished".green().bold()),
            Event::WorkflowFinished { error, .. } => format!(
                "{} {}",
                "Workflow failed:".red().bold(),
                error.as_deref().unwrap_or("unknown error")
            ),
            Event::WorkflowCancelled { .. } => format!("{}", "Workflow cancelled".yellow().bold()),
            Event::ImageOcrStarted { .. }
            | Event::StepStarted { .. }
            | Event::StepCompleted { .. }
            | Event::StateSnapshot(_)
            | Event::SpeechStatusChanged(_) => return None,
        };
        Some(line)
    }
}

fn step_marker(status: StepStatus) -> String {
    match status {
        StepStatus::Pending => "·".dimmed().to_string(),
        StepStatus::Processing => "…".cyan().to_string(),
        StepStatus::Completed => "✓".green().to_string(),
        StepStatus::Error => "✗".red().to_string(),
    }
}

/// Step list with statuses, then per-image and per-agent outcomes.
pub fn summary(state: &WorkflowState, renderer: &Renderer) -> String {
    let mut out = Vec::new();

    out.push(format!("{}", "Steps".bold().underline()));
    for step in &state.steps {
        let mut line = format!("  {} {}", step_marker(step.status), step.name);
        if let Some(error) = &step.error {
            line.push_str(&format!(" ({error})"));
        }
        out.push(line);
    }

    if !state.images.is_empty() {
        out.push(format!("{}", "Images".bold().underline()));
        for image in &state.images {
            let status = match image.status {
                ImageStatus::Pending => "pending".dimmed().to_string(),
                ImageStatus::Processing => "processing".cyan().to_string(),
                ImageStatus::Completed => "ok".green().to_string(),
                ImageStatus::Error => "error".red().to_string(),
            };
            out.push(format!("  {} {}", image.name, status));
        }
    }

    let sections = [
        ("Responses", &state.responder_results),
        ("Direct answers", &state.direct_results),
    ];
    for (title, results) in sections {
        if results.is_empty() {
            continue;
        }
        out.push(format!("{}", title.bold().underline()));
        for (agent_id, result) in results {
            out.push(format!("  {}", renderer.agent(agent_id).bold()));
            for text_line in display_text(result).lines() {
                out.push(format!("    {text_line}"));
            }
        }
    }

    out.join("\n")
}
