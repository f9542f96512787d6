//! Errors raised while reading `.ocrflow/`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid agent YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The Markdown agent file has no usable front matter.
    #[error("Invalid front matter in {path}: {reason}")]
    FrontMatter { path: PathBuf, reason: String },

    #[error("Cannot list agents in {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// The agent file parsed but describes an unusable agent.
    #[error("Invalid agent in {path}: {reason}")]
    InvalidAgent { path: PathBuf, reason: String },

    #[error("Duplicate agent id '{id}' in {path}")]
    DuplicateAgent { id: String, path: PathBuf },

    /// `[workflow]` names agents that no file defines.
    #[error("{path} references undefined agent(s): {}", .ids.join(", "))]
    UnknownAgents { path: PathBuf, ids: Vec<String> },

    /// The same agent appears twice in one `[workflow]` list.
    #[error("{path} lists agent '{id}' more than once in {list}")]
    RepeatedReference {
        path: PathBuf,
        list: &'static str,
        id: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
