//! Controllable services for deterministic integration tests.

use async_trait::async_trait;
use of_core::agents::{AgentCaller, Upload};
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::workflow_models::AgentCallResult;
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// An agent caller whose `gated` agents block until [`GatedAgentCaller::open`].
///
/// Lets a test observe a run while calls are still in flight.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct GatedAgentCaller {
    gated: HashSet<String>,
    gate: Arc<Notify>,
    opened: Arc<Mutex<bool>>,
    completed: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl GatedAgentCaller {
    pub fn new(gated: &[&str]) -> Self {
        Self {
            gated: gated.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn open(&self) {
        *self.opened.lock().unwrap() = true;
        self.gate.notify_waiters();
    }

    /// Agent ids in completion order.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentCaller for GatedAgentCaller {
    async fn call(&self, agent: &AgentDescriptor, _question: &str, _uploads: &[Upload]) -> AgentCallResult {
        if self.gated.contains(&agent.id) {
            loop {
                let notified = self.gate.notified();
                if *self.opened.lock().unwrap() {
                    break;
                }
                notified.await;
            }
        }
        self.completed.lock().unwrap().push(agent.id.clone());
        AgentCallResult::success(json!({ "text": format!("{} answer", agent.id) }))
    }
}
