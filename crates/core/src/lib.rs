//! # of-core
//!
//! Workflow core for ocrflow: OCR, remote agents, and narrated results.
//!
//! This crate provides:
//! - Configuration loading from `.ocrflow/` directory
//! - OCR and remote agent adapters that never fail past their boundary
//! - The workflow engine running the compiled and direct pipelines
//! - Run-state tracking and the session manager
//! - A serialized speech queue for reading results aloud
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`agents`]: Agent caller trait, HTTP adapter and agent manager
//! - [`ocr`]: OCR service trait, Mathpix client and confidence helpers
//! - [`compiler`]: Merges OCR results into one text block
//! - [`extract`]: Bounded text extraction from agent responses
//! - [`engine`]: Workflow execution engine
//! - [`state`]: Run tracking and session management
//! - [`speech`]: Speech queue and narration
//! - [`init`]: `.ocrflow/` scaffolding

pub mod agents;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod extract;
pub mod http;
pub mod init;
pub mod ocr;
pub mod speech;
pub mod state;

use crate::agents::{AgentManager, HttpAgentCaller};
use crate::config::AppConfig;
use crate::engine::WorkflowEngine;
use crate::ocr::MathpixOcr;
use std::sync::Arc;

/// Build an engine backed by the real HTTP adapters.
pub fn http_engine(config: &AppConfig) -> reqwest::Result<WorkflowEngine> {
    let client = http::build_client(&config.global.http)?;
    let agents = AgentManager::new(
        config.agents.clone(),
        Arc::new(HttpAgentCaller::new(client.clone())),
    );
    Ok(WorkflowEngine::new(Arc::new(MathpixOcr::new(client)), agents))
}
