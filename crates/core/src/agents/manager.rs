//! Agent manager for resolving and calling configured agents.
//!
//! The `AgentManager` is responsible for:
//! - Holding the registry of configured agent descriptors
//! - Looking up agents by id
//! - Fanning one question out to several agents concurrently

use crate::agents::base::AgentCaller;
use crate::agents::upload::Upload;
use futures::future::join_all;
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::workflow_models::AgentCallResult;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

/// Manages all registered agents and the caller used to reach them.
#[derive(Clone)]
pub struct AgentManager {
    agents: HashMap<String, AgentDescriptor>,
    caller: Arc<dyn AgentCaller>,
}

impl AgentManager {
    /// Create a new AgentManager.
    ///
    /// # Arguments
    ///
    /// * `agents` - Agent descriptors from `.ocrflow/agents/`
    /// * `caller` - The transport used for every call
    pub fn new(agents: Vec<AgentDescriptor>, caller: Arc<dyn AgentCaller>) -> Self {
        let agents = agents.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self { agents, caller }
    }

    pub fn get_agent(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Display name for an agent, falling back to `Agent <id>`.
    pub fn display_name(&self, id: &str) -> String {
        self.get_agent(id)
            .map(|a| a.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Agent {id}"))
    }

    pub fn list_agents(&self) -> Vec<&AgentDescriptor> {
        let mut agents: Vec<_> = self.agents.values().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    /// Call one agent by id. Unknown ids yield an error result.
    pub async fn call(&self, id: &str, question: &str, uploads: &[Upload]) -> AgentCallResult {
        match self.get_agent(id) {
            Some(agent) => self.caller.call(agent, question, uploads).await,
            None => AgentCallResult::failure(format!("Agent not found: {id}")),
        }
    }

    /// Call every agent in `ids` concurrently and wait for all of them.
    ///
    /// `on_result` runs as soon as each individual call resolves, before the
    /// slower siblings finish. Results are returned in the order of `ids`; one
    /// failing agent never prevents the others from completing. Repeated ids
    /// are called once, at their first position.
    pub async fn call_all<F, Fut>(
        &self,
        ids: &[String],
        question: &str,
        uploads: &[Upload],
        on_result: F,
    ) -> Vec<(String, AgentCallResult)>
    where
        F: Fn(String, AgentCallResult) -> Fut,
        Fut: Future<Output = ()>,
    {
        let on_result = &on_result;
        let mut seen = HashSet::new();
        let calls = ids.iter().filter(|id| seen.insert(id.as_str())).map(|id| async move {
            let result = self.call(id, question, uploads).await;
            on_result(id.clone(), result.clone()).await;
            (id.clone(), result)
        });
        join_all(calls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::adapters::MockAgentCaller;
    use serde_json::json;

    fn manager(caller: MockAgentCaller) -> AgentManager {
        AgentManager::new(
            vec![
                AgentDescriptor::new("tutor", "Math tutor", "http://localhost/tutor"),
                AgentDescriptor::new("checker", "", "http://localhost/checker"),
            ],
            Arc::new(caller),
        )
    }

    #[tokio::test]
    async fn test_call_unknown_agent_fails() {
        let manager = manager(MockAgentCaller::new());
        let result = manager.call("missing", "q", &[]).await;
        assert_eq!(result.error.as_deref(), Some("Agent not found: missing"));
    }

    #[tokio::test]
    async fn test_call_all_keeps_order_and_isolates_failures() {
        let caller = MockAgentCaller::new()
            .succeeding("tutor", json!({"text": "4"}))
            .failing("checker", "Error 502: Bad Gateway");
        let manager = manager(caller.clone());

        let ids = vec!["tutor".to_string(), "checker".to_string()];
        let seen = std::sync::Mutex::new(Vec::new());
        let results = manager
            .call_all(&ids, "2+2?", &[], |id, _| {
                seen.lock().unwrap().push(id);
                async {}
            })
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(results[0].0, "tutor");
        assert!(!results[0].1.is_error());
        assert!(results[1].1.is_error());
        assert_eq!(caller.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_call_all_calls_repeated_id_once() {
        let caller = MockAgentCaller::new()
            .succeeding("tutor", json!({"text": "4"}))
            .succeeding("checker", json!({"text": "ok"}));
        let manager = manager(caller.clone());

        let ids = vec![
            "tutor".to_string(),
            "checker".to_string(),
            "tutor".to_string(),
        ];
        let results = manager.call_all(&ids, "2+2?", &[], |_, _| async {}).await;

        let order: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["tutor", "checker"]);
        assert_eq!(caller.calls_to("tutor").len(), 1);
        assert_eq!(caller.calls().len(), 2);
    }

    #[test]
    fn test_display_name_fallback() {
        let manager = manager(MockAgentCaller::new());
        assert_eq!(manager.display_name("tutor"), "Math tutor");
        assert_eq!(manager.display_name("checker"), "Agent checker");
        assert_eq!(manager.display_name("nope"), "Agent nope");
    }
}
