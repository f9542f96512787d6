//! Configuration file loader for `.ocrflow/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.ocrflow/` directory, including:
//! - `config.toml`: Global settings
//! - `agents/*.md`: Agent definitions with YAML front matter
//! - `agents/*.yaml`, `agents/*.yml`: Agent definitions as plain YAML

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use of_protocol::agent_models::AgentDescriptor;
use of_protocol::config_models::GlobalConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".ocrflow";

pub const ENV_OCR_APP_ID: &str = "OCRFLOW_OCR_APP_ID";
pub const ENV_OCR_APP_KEY: &str = "OCRFLOW_OCR_APP_KEY";
pub const ENV_OCR_ENDPOINT: &str = "OCRFLOW_OCR_ENDPOINT";

/// Agent definition as written on disk. `id` defaults to the file stem.
#[derive(Debug, Deserialize)]
struct AgentFile {
    id: Option<String>,
    name: Option<String>,
    url: String,
    #[serde(default)]
    description: String,
}

impl AgentFile {
    fn into_descriptor(self, path: &Path) -> ConfigResult<AgentDescriptor> {
        let id = match self.id {
            Some(id) => id,
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .ok_or_else(|| ConfigError::InvalidAgent {
                    path: path.to_path_buf(),
                    reason: "Cannot derive agent id from file name".to_string(),
                })?,
        };

        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidAgent {
                path: path.to_path_buf(),
                reason: format!("Agent '{id}' has an empty url"),
            });
        }

        Ok(AgentDescriptor {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            url: self.url,
            description: self.description,
        })
    }
}

/// Loads all configuration from the `.ocrflow/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.ocrflow/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing, returns a default configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML, YAML, or Markdown front matter)
/// - Two agents share an id
/// - The workflow references agents that are not defined
///
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let of_dir = root.join(CONFIG_DIR);

    if !of_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&of_dir)?;
    let agents = load_agents(&of_dir)?;
    validate_references(&of_dir, &global, &agents)?;

    tracing::debug!(dir = %of_dir.display(), agents = agents.len(), "configuration loaded");
    Ok(AppConfig { global, agents })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(of_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = of_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: config_path,
            source,
        })?;

    Ok(config)
}

fn parse_markdown_agent(path: &Path, content: &str) -> ConfigResult<AgentDescriptor> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let mut file: AgentFile = result
        .data
        .ok_or_else(|| ConfigError::FrontMatter {
            path: path.to_path_buf(),
            reason: "Missing YAML front matter".to_string(),
        })?
        .deserialize()
        .map_err(|e| ConfigError::FrontMatter {
            path: path.to_path_buf(),
            reason: format!("Failed to deserialize front matter: {e}"),
        })?;

    // The Markdown body describes the agent.
    let body = result.content.trim();
    if !body.is_empty() {
        file.description = body.to_string();
    }

    file.into_descriptor(path)
}

fn parse_yaml_agent(path: &Path, content: &str) -> ConfigResult<AgentDescriptor> {
    let file: AgentFile = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    file.into_descriptor(path)
}

/// Loads all agent definitions from `agents/`.
fn load_agents(of_dir: &Path) -> ConfigResult<Vec<AgentDescriptor>> {
    let agents_dir = of_dir.join("agents");

    if !agents_dir.exists() {
        return Ok(Vec::new());
    }

    let mut agents = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(&agents_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|source| ConfigError::Walk {
            path: agents_dir.clone(),
            source,
        })?;

        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if !matches!(ext, Some("md" | "yaml" | "yml")) {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let agent = if ext == Some("md") {
            parse_markdown_agent(path, &content)?
        } else {
            parse_yaml_agent(path, &content)?
        };

        if !seen.insert(agent.id.clone()) {
            return Err(ConfigError::DuplicateAgent {
                id: agent.id,
                path: path.to_path_buf(),
            });
        }
        agents.push(agent);
    }

    agents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(agents)
}

/// Every agent id named in `[workflow]` must be defined.
fn validate_references(
    of_dir: &Path,
    global: &GlobalConfig,
    agents: &[AgentDescriptor],
) -> ConfigResult<()> {
    let known: HashSet<&str> = agents.iter().map(|a| a.id.as_str()).collect();
    let workflow = &global.workflow;

    let missing: Vec<&str> = workflow
        .compiler_agent
        .iter()
        .chain(&workflow.responder_agents)
        .chain(&workflow.direct_agents)
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect();

    if !missing.is_empty() {
        return Err(ConfigError::UnknownAgents {
            path: of_dir.join("config.toml"),
            ids: missing.into_iter().map(str::to_string).collect(),
        });
    }

    for (list, ids) in [
        ("responder_agents", &workflow.responder_agents),
        ("direct_agents", &workflow.direct_agents),
    ] {
        let mut seen = HashSet::new();
        if let Some(id) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ConfigError::RepeatedReference {
                path: of_dir.join("config.toml"),
                list,
                id: id.clone(),
            });
        }
    }

    Ok(())
}

/// Apply OCR overrides from `lookup` (normally the process environment).
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut GlobalConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(app_id) = get(ENV_OCR_APP_ID) {
        config.ocr.app_id = app_id;
    }
    if let Some(app_key) = get(ENV_OCR_APP_KEY) {
        config.ocr.app_key = app_key;
    }
    if let Some(endpoint) = get(ENV_OCR_ENDPOINT) {
        config.ocr.endpoint = endpoint;
    }
}

/// Apply `OCRFLOW_OCR_*` environment variables to `config`.
pub fn apply_env_overrides(config: &mut GlobalConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}
