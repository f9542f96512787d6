//! Mock agent caller for testing.

use crate::agents::base::AgentCaller;
use crate::agents::upload::Upload;
use async_trait::async_trait;
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::workflow_models::AgentCallResult;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Scripted reply for one agent.
#[derive(Clone, Debug)]
pub enum MockReply {
    Success(Value),
    Failure(String),
    Delayed(Duration, Box<MockReply>),
}

/// A call observed by [`MockAgentCaller`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub agent_id: String,
    pub question: String,
    pub upload_count: usize,
}

/// Replies from a per-agent script and records every call it receives.
///
/// Agents without a scripted reply answer with `{"text": "<id> answer"}`.
#[derive(Clone, Default)]
pub struct MockAgentCaller {
    replies: HashMap<String, MockReply>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockAgentCaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, agent_id: impl Into<String>, reply: MockReply) -> Self {
        self.replies.insert(agent_id.into(), reply);
        self
    }

    pub fn succeeding(self, agent_id: impl Into<String>, data: Value) -> Self {
        self.with_reply(agent_id, MockReply::Success(data))
    }

    pub fn failing(self, agent_id: impl Into<String>, error: impl Into<String>) -> Self {
        self.with_reply(agent_id, MockReply::Failure(error.into()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls_to(&self, agent_id: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.agent_id == agent_id)
            .collect()
    }

    async fn resolve(reply: MockReply) -> AgentCallResult {
        let mut reply = reply;
        loop {
            match reply {
                MockReply::Success(data) => return AgentCallResult::success(data),
                MockReply::Failure(error) => return AgentCallResult::failure(error),
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}

#[async_trait]
impl AgentCaller for MockAgentCaller {
    async fn call(
        &self,
        agent: &AgentDescriptor,
        question: &str,
        uploads: &[Upload],
    ) -> AgentCallResult {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                agent_id: agent.id.clone(),
                question: question.to_string(),
                upload_count: uploads.len(),
            });

        let reply = self
            .replies
            .get(&agent.id)
            .cloned()
            .unwrap_or_else(|| MockReply::Success(json!({ "text": format!("{} answer", agent.id) })));

        Self::resolve(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> AgentDescriptor {
        AgentDescriptor::new(id, id, format!("http://localhost/{id}"))
    }

    #[tokio::test]
    async fn test_mock_caller_default_reply() {
        let caller = MockAgentCaller::new();
        let result = caller.call(&agent("tutor"), "question", &[]).await;
        assert_eq!(result.data, Some(json!({"text": "tutor answer"})));
        assert_eq!(caller.calls_to("tutor").len(), 1);
    }

    #[tokio::test]
    async fn test_mock_caller_failure_reply() {
        let caller = MockAgentCaller::new().failing("checker", "Error 500: Internal Server Error");
        let result = caller.call(&agent("checker"), "q", &[]).await;
        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some("Error 500: Internal Server Error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_caller_delayed_reply() {
        let caller = MockAgentCaller::new().with_reply(
            "slow",
            MockReply::Delayed(Duration::from_secs(5), Box::new(MockReply::Success(json!("done")))),
        );
        let result = caller.call(&agent("slow"), "q", &[]).await;
        assert_eq!(result.data, Some(json!("done")));
    }
}
