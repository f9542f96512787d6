//! HTTP adapter for remote agent endpoints.
//!
//! Every agent is a single URL that accepts a JSON POST and answers with a
//! JSON document (or plain text).

use crate::agents::base::{AgentCaller, AgentError, AgentRequest};
use crate::agents::upload::Upload;
use async_trait::async_trait;
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::workflow_models::AgentCallResult;
use reqwest::Client;
use serde_json::Value;

/// Calls agents over HTTP using a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpAgentCaller {
    client: Client,
}

impl HttpAgentCaller {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post(
        &self,
        agent: &AgentDescriptor,
        question: &str,
        uploads: &[Upload],
    ) -> Result<Value, AgentError> {
        let request = AgentRequest::new(question, uploads);

        let response = self
            .client
            .post(&agent.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Decode(e.to_string()))?;

        // Non-JSON bodies are kept verbatim as a string value.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

#[async_trait]
impl AgentCaller for HttpAgentCaller {
    async fn call(
        &self,
        agent: &AgentDescriptor,
        question: &str,
        uploads: &[Upload],
    ) -> AgentCallResult {
        tracing::debug!(agent = %agent.id, uploads = uploads.len(), "calling agent");

        match self.post(agent, question, uploads).await {
            Ok(data) => AgentCallResult::success(data),
            Err(e) => {
                tracing::warn!(agent = %agent.id, error = %e, "agent call failed");
                AgentCallResult::failure(e.to_string())
            }
        }
    }
}
