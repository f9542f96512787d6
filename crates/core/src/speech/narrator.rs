//! Narration of agent results through the speech queue.

use crate::extract::reading_text;
use crate::speech::queue::{SpeechCallbacks, SpeechQueue};
use of_protocol::workflow_models::AgentCallResult;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Queues each agent's reading text at most once per run.
pub struct Narrator {
    queue: SpeechQueue,
    spoken: Mutex<HashSet<String>>,
}

impl Narrator {
    pub fn new(queue: SpeechQueue) -> Self {
        Self {
            queue,
            spoken: Mutex::new(HashSet::new()),
        }
    }

    pub fn queue(&self) -> &SpeechQueue {
        &self.queue
    }

    /// Queue `result` for `agent_id` unless it was already narrated this run.
    ///
    /// Failed or empty results are never narrated. An agent only counts as
    /// narrated once the queue accepted its text.
    pub fn narrate(&self, agent_id: &str, label: &str, result: &AgentCallResult) -> Option<String> {
        let text = reading_text(result)?;

        let mut spoken = self.spoken.lock().unwrap_or_else(PoisonError::into_inner);
        if spoken.contains(agent_id) {
            tracing::debug!(agent = agent_id, "result already narrated");
            return None;
        }

        // Only an accepted item counts as narrated; a disabled queue leaves
        // the agent eligible for a later attempt.
        let id = self.queue.enqueue(text, label, SpeechCallbacks::new())?;
        spoken.insert(agent_id.to_string());
        Some(id)
    }

    /// Queue `result` regardless of earlier narration.
    pub fn speak_now(&self, label: &str, result: &AgentCallResult) -> Option<String> {
        let text = reading_text(result)?;
        self.queue.enqueue(text, label, SpeechCallbacks::new())
    }

    /// Forget narrated agents and stop the queue. Called when a new run starts.
    pub fn reset(&self) {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.queue.stop();
    }
}
