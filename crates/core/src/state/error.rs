//! Error types for workflow sessions.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Every problem found by validation, in a stable order.
    #[error("Invalid workflow configuration: {}", .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    #[error("A workflow is already running")]
    AlreadyRunning,

    #[error("No workflow is running")]
    NotRunning,

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("No result available for agent: {0}")]
    AgentResultNotFound(String),

    #[error("Speech is not available in this session")]
    SpeechUnavailable,
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
