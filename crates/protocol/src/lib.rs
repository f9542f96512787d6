//! # of-protocol
//!
//! Core protocol definitions and data models for ocrflow.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (TOML config, Markdown/YAML agents)
//! - Runtime workflow state (images, steps, agent results)
//! - Communication between a UI and the workflow core
//!
//! ## Modules
//!
//! - [`agent_models`]: Remote agent descriptors
//! - [`config_models`]: Global configuration from config.toml
//! - [`image_models`]: Image items and OCR results
//! - [`workflow_models`]: Steps, agent outcomes and the session state
//! - [`speech_models`]: Speech queue status
//! - [`ipc`]: Operations and Events between UI and core
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for web clients
//! - Independent compilation: No dependencies on other ocrflow crates

pub mod agent_models;
pub mod config_models;
pub mod image_models;
pub mod ipc;
pub mod speech_models;
pub mod workflow_models;

// Re-export all public types for convenience
pub use agent_models::*;
pub use config_models::*;
pub use image_models::*;
pub use ipc::*;
pub use speech_models::*;
pub use workflow_models::*;
