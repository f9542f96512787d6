//! Agent descriptor models for `.ocrflow/agents/*`.
//!
//! Agents are remote HTTP endpoints that accept a question (and optionally
//! inline file uploads) and answer with arbitrary JSON.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A remote agent endpoint.
///
/// Agents are defined in `.ocrflow/agents/*.md` files with YAML front matter
/// (or plain `*.yaml` files) and are read-only for the workflow engine.
///
/// # Example
///
/// ```markdown
/// ---
/// id: compiler
/// name: Question compiler
/// url: https://flow.example.com/api/v1/prediction/abc
/// ---
///
/// Turns raw OCR output into a clean list of questions.
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct AgentDescriptor {
    /// Unique identifier, referenced from `config.toml`.
    pub id: String,

    /// Human-readable name used in progress output and narration labels.
    pub name: String,

    /// Endpoint that receives the POST request.
    pub url: String,

    /// Free-form notes about the agent.
    ///
    /// For Markdown definitions this is the file body.
    #[serde(default)]
    pub description: String,
}

impl AgentDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            description: String::new(),
        }
    }
}
