//! Custom assertion helpers for integration tests.

use of_protocol::ipc::Event;
use of_protocol::workflow_models::StepId;
use std::time::Duration;
use tokio::sync::mpsc;

/// Collect events until the run finishes or is cancelled, or `timeout` elapses.
#[allow(dead_code)]
pub async fn collect_until_finished(rx: &mut mpsc::Receiver<Event>, timeout: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;

    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        let terminal = matches!(
            event,
            Event::WorkflowFinished { .. } | Event::WorkflowCancelled { .. }
        );
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

/// Wait for the first event matching `predicate`.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut mpsc::Receiver<Event>, timeout: Duration, predicate: F) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        if predicate(&event) {
            return Some(event);
        }
    }
    None
}

/// Index of the first event matching `predicate`.
#[allow(dead_code)]
pub fn position<F>(events: &[Event], predicate: F) -> Option<usize>
where
    F: Fn(&Event) -> bool,
{
    events.iter().position(predicate)
}

#[allow(dead_code)]
pub fn has_step_started(events: &[Event], step: StepId) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::StepStarted { step: s, .. } if *s == step))
}

#[allow(dead_code)]
pub fn has_step_failed(events: &[Event], step: StepId) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::StepFailed { step: s, .. } if *s == step))
}

/// Every run-scoped event carries `run_id`.
#[allow(dead_code)]
pub fn assert_single_run(events: &[Event]) {
    let ids: std::collections::HashSet<_> = events.iter().filter_map(Event::run_id).collect();
    assert_eq!(ids.len(), 1, "events span several runs: {:?}", ids);
}
