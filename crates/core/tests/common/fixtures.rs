//! Test fixtures for creating sample configurations and test data.

use of_core::agents::{AgentCaller, AgentManager};
use of_core::engine::WorkflowEngine;
use of_core::ocr::OcrService;
use of_core::state::{NewImage, WorkflowSession};
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::config_models::{OcrSettings, WorkflowConfig};
use of_protocol::ipc::Event;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Agents used across the integration tests.
#[allow(dead_code)]
pub fn test_agents() -> Vec<AgentDescriptor> {
    ["compiler", "tutor", "checker", "explainer", "vision", "reader"]
        .iter()
        .map(|id| {
            AgentDescriptor::new(*id, format!("{id} agent"), format!("http://127.0.0.1:1/{id}"))
        })
        .collect()
}

/// OCR settings with credentials present.
#[allow(dead_code)]
pub fn test_ocr_settings() -> OcrSettings {
    OcrSettings {
        app_id: "test-app".to_string(),
        app_key: "test-key".to_string(),
        ..Default::default()
    }
}

/// Compiled pipeline with the given responders.
#[allow(dead_code)]
pub fn compiled_config(responders: &[&str]) -> WorkflowConfig {
    WorkflowConfig {
        compiler_agent: Some("compiler".to_string()),
        responder_agents: responders.iter().map(|s| s.to_string()).collect(),
        max_images: 5,
        ..Default::default()
    }
}

/// `n` small PNG-named images.
#[allow(dead_code)]
pub fn test_images(n: usize) -> Vec<NewImage> {
    (0..n)
        .map(|i| NewImage::new(format!("page-{}.png", i + 1), vec![0x89, 0x50, 0x4E, 0x47, i as u8]))
        .collect()
}

/// Build a session over the given services with a generous event channel.
#[allow(dead_code)]
pub fn build_session(
    ocr: Arc<dyn OcrService>,
    caller: Arc<dyn AgentCaller>,
    config: WorkflowConfig,
) -> (WorkflowSession, mpsc::Receiver<Event>) {
    let engine = WorkflowEngine::new(ocr, AgentManager::new(test_agents(), caller));
    let (tx, rx) = mpsc::channel(4096);
    (WorkflowSession::new(engine, config, test_ocr_settings(), tx), rx)
}

/// Create a temporary project directory with `.ocrflow` configuration.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project(config_toml: &str) -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let of_dir = temp_dir.path().join(".ocrflow");
    std::fs::create_dir_all(of_dir.join("agents"))?;
    std::fs::write(of_dir.join("config.toml"), config_toml)?;

    for agent in test_agents() {
        let md = format!(
            "---\nid: {}\nname: {}\nurl: {}\n---\n\nTest agent.\n",
            agent.id, agent.name, agent.url
        );
        std::fs::write(of_dir.join(format!("agents/{}.md", agent.id)), md)?;
    }

    Ok(temp_dir)
}
