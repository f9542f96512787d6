//! Embedded template files for `.ocrflow` initialization.
//!
//! Files under the workspace `templates/` directory are embedded at compile
//! time with `rust-embed`, so `ocrflow init` works without any files on disk.
//! With the `debug-embed` feature they are still read from the embedded copy
//! in debug builds.

use rust_embed::RustEmbed;

/// `CARGO_MANIFEST_DIR` is `crates/core`; the templates live two levels up.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path, e.g. `"agents/compiler.md"`.
///
/// ```
/// use of_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("[workflow]"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files whose path starts with `prefix`, sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
