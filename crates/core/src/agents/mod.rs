//! Remote agent calls.
//!
//! This module provides the `AgentCaller` trait (Adapter Pattern), the HTTP
//! adapter that talks to real agent endpoints, and the `AgentManager` which
//! resolves agent ids and fans a question out to several agents at once.

pub mod adapters;
pub mod base;
pub mod manager;
pub mod upload;

pub use adapters::{HttpAgentCaller, MockAgentCaller, MockReply};
pub use base::{AgentCaller, AgentError, AgentRequest};
pub use manager::AgentManager;
pub use upload::{detect_mime_type, Upload};
