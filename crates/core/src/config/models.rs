//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings and agent definitions into a single configuration object.

use of_protocol::agent_models::AgentDescriptor;
use of_protocol::config_models::GlobalConfig;

/// Unified application configuration loaded from `.ocrflow/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Workflow, OCR, speech and HTTP settings
/// - `agents/*.md`, `agents/*.yaml`: Agent definitions
///
/// # Example
///
/// ```rust,no_run
/// use of_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} agents", config.agents.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// All agent definitions, sorted by id.
    pub agents: Vec<AgentDescriptor>,
}

impl AppConfig {
    pub fn agent(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Role of an agent in the configured workflow, for display.
    pub fn role_of(&self, id: &str) -> Vec<&'static str> {
        let workflow = &self.global.workflow;
        let mut roles = Vec::new();
        if workflow.compiler_agent.as_deref() == Some(id) {
            roles.push("compiler");
        }
        if workflow.responder_agents.iter().any(|a| a == id) {
            roles.push("responder");
        }
        if workflow.direct_agents.iter().any(|a| a == id) {
            roles.push("direct");
        }
        roles
    }
}
