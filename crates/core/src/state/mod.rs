//! Workflow session state.
//!
//! This module provides:
//! - `RunTracker`: forward-only run-state transitions and event emission
//! - `WorkflowSession`: image collection, validation, run control and Op dispatch

pub mod error;
pub mod manager;
pub mod tracker;

pub use error::{WorkflowError, WorkflowResult};
pub use manager::{NewImage, StartedRun, WorkflowSession};
pub use tracker::{RunTracker, CANCELLED_REASON};
