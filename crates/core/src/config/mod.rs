//! Configuration loading and management.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.ocrflow/` directory structure.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, apply_overrides, load_config, CONFIG_DIR};
pub use models::AppConfig;
