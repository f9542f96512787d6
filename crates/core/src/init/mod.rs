//! Project scaffolding.
//!
//! `ocrflow init` writes a `.ocrflow/` directory from templates embedded in
//! the binary: `config.toml` wiring a compiled pipeline, plus sample agent
//! definitions under `agents/`.
//!
//! ```no_run
//! use of_core::init::{generate_ocrflow_structure, InitOptions};
//!
//! # async fn example() -> Result<(), of_core::init::InitError> {
//! let written = generate_ocrflow_structure(InitOptions {
//!     minimal: true,
//!     ..Default::default()
//! })
//! .await?;
//! assert!(written.contains(&"config.toml".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_ocrflow_structure, InitOptions};
pub use templates::{get_template, list_templates};
