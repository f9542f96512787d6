//! Errors raised while scaffolding `.ocrflow/`.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// Refusing to overwrite without `force`.
    #[error("{0} already exists (pass --force to overwrite it)")]
    AlreadyInitialized(PathBuf),

    /// An embedded template is missing from the binary.
    #[error("No embedded template named {0}")]
    MissingTemplate(String),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
