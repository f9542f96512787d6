//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality across all integration tests including:
//! - Test fixtures (agents, images, sessions, `.ocrflow/` projects)
//! - Event assertions
//! - Controllable mock services

pub mod assertions;
pub mod fixtures;
pub mod mock_services;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_services::*;
