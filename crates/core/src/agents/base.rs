//! Base AgentCaller trait and supporting types.

use crate::agents::upload::Upload;
use async_trait::async_trait;
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::workflow_models::AgentCallResult;
use serde::Serialize;
use thiserror::Error;

/// Request body sent to every agent endpoint.
///
/// ```json
/// { "question": "…", "uploads": [{ "type": "file", "name": "p1.png", "mime": "image/png", "data": "data:image/png;base64,…" }] }
/// ```
#[derive(Debug, Serialize)]
pub struct AgentRequest<'a> {
    pub question: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads: Option<&'a [Upload]>,
}

impl<'a> AgentRequest<'a> {
    /// The question is trimmed; an empty upload list is omitted.
    pub fn new(question: &'a str, uploads: &'a [Upload]) -> Self {
        Self {
            question: question.trim(),
            uploads: (!uploads.is_empty()).then_some(uploads),
        }
    }
}

/// Reasons a single agent call can fail.
///
/// These never escape an [`AgentCaller`]; they are rendered into
/// [`AgentCallResult::error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Error {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// One POST to a remote agent.
///
/// Implementations must not fail: transport and HTTP errors are folded into
/// the returned [`AgentCallResult`] so that calls can be awaited in bulk
/// without one failure aborting its siblings.
#[async_trait]
pub trait AgentCaller: Send + Sync {
    async fn call(
        &self,
        agent: &AgentDescriptor,
        question: &str,
        uploads: &[Upload],
    ) -> AgentCallResult;
}
