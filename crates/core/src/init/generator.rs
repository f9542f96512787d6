//! Directory structure and file generation for `.ocrflow` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Agents written in minimal mode: just what the compiled pipeline needs.
const MINIMAL_AGENTS: [&str; 2] = ["agents/compiler.md", "agents/tutor.md"];

/// Options for initializing a `.ocrflow` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.ocrflow` will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing `.ocrflow` directory if it exists.
    pub force: bool,

    /// Skip the direct-pipeline sample agent.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.ocrflow` directory structure with templates.
///
/// ```text
/// .ocrflow/
/// ├── config.toml
/// └── agents/
///     ├── compiler.md
///     ├── tutor.md
///     └── vision.md (unless minimal)
/// ```
///
/// Returns the paths written, relative to `.ocrflow/`.
///
/// # Errors
/// - The `.ocrflow` directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_ocrflow_structure(options: InitOptions) -> InitResult<Vec<String>> {
    let of_dir = options.target_dir.join(CONFIG_DIR);

    if of_dir.exists() && !options.force {
        return Err(InitError::AlreadyInitialized(of_dir));
    }

    fs::create_dir_all(of_dir.join("agents")).map_err(|source| InitError::Write {
        path: of_dir.join("agents"),
        source,
    })?;

    let mut files = vec!["config.toml".to_string()];
    if options.minimal {
        files.extend(MINIMAL_AGENTS.iter().map(|p| p.to_string()));
    } else {
        files.extend(list_templates("agents/"));
    }

    for file in &files {
        write_template_file(&of_dir, file)?;
    }

    tracing::info!(dir = %of_dir.display(), files = files.len(), "initialized ocrflow directory");
    Ok(files)
}

fn write_template_file(of_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::MissingTemplate(template_path.to_string()))?;

    let target_path = of_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::Write {
        path: target_path,
        source,
    })?;

    Ok(())
}
