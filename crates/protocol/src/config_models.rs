//! Global configuration models for `.ocrflow/config.toml`.
//!
//! Every section is optional; missing values fall back to the defaults
//! below.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// Default OCR endpoint (Mathpix v3 text API).
pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.mathpix.com/v3/text";

/// Which agents take part in a run and with what prompt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Agent id of the question compiler (compiled pipeline, step 3).
    pub compiler_agent: Option<String>,

    /// Agent ids that receive the compiler's answer (step 4).
    pub responder_agents: Vec<String>,

    /// Agent ids that receive the raw images plus `direct_prompt`.
    pub direct_agents: Vec<String>,

    /// Prompt sent along with the images on the direct pipeline.
    pub direct_prompt: Option<String>,

    /// Maximum number of images held by a session.
    pub max_images: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            compiler_agent: None,
            responder_agents: Vec::new(),
            direct_agents: Vec::new(),
            direct_prompt: None,
            max_images: 3,
        }
    }
}

impl WorkflowConfig {
    /// The direct pipeline runs only with at least one agent and a non-blank prompt.
    pub fn direct_enabled(&self) -> bool {
        !self.direct_agents.is_empty()
            && self
                .direct_prompt
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty())
    }

    pub fn compiled_enabled(&self) -> bool {
        self.compiler_agent.is_some()
    }
}

/// Credentials and format flags for the OCR service.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct OcrSettings {
    pub endpoint: String,
    pub app_id: String,
    pub app_key: String,
    /// Also request LaTeX output for math content.
    pub include_math: bool,
    pub output_formats: Vec<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            app_id: String::new(),
            app_key: String::new(),
            include_math: true,
            output_formats: vec!["text".to_string()],
        }
    }
}

impl OcrSettings {
    pub fn has_credentials(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_key.trim().is_empty()
    }
}

impl std::fmt::Debug for OcrSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrSettings")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .field("include_math", &self.include_math)
            .field("output_formats", &self.output_formats)
            .finish()
    }
}

/// Text-to-speech preferences.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    /// Preferred voice language tag prefix, e.g. `es`.
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Pause between consecutive utterances, in milliseconds.
    pub gap_ms: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            language: "es".to_string(),
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
            gap_ms: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

/// Represents global settings from `.ocrflow/config.toml`.
///
/// # Example
///
/// ```toml
/// [workflow]
/// compiler_agent = "compiler"
/// responder_agents = ["tutor", "checker"]
///
/// [ocr]
/// app_id = "my-app"
/// app_key = "secret"
///
/// [speech]
/// enabled = true
/// language = "es"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, TS)]
#[serde(default)]
pub struct GlobalConfig {
    pub workflow: WorkflowConfig,
    pub ocr: OcrSettings,
    pub speech: SpeechSettings,
    pub http: HttpSettings,
}
