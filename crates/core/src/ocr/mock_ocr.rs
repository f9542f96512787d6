//! In-memory OCR service for testing.

use crate::ocr::base::OcrService;
use async_trait::async_trait;
use of_protocol::config_models::OcrSettings;
use of_protocol::image_models::{ImageItem, OcrResult};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Returns scripted results keyed by image name.
///
/// Unscripted images succeed with `{"text": "text of <name>"}`.
#[derive(Clone, Default)]
pub struct MockOcr {
    results: HashMap<String, OcrResult>,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, image_name: impl Into<String>, result: OcrResult) -> Self {
        self.results.insert(image_name.into(), result);
        self
    }

    pub fn failing(self, image_name: impl Into<String>, error: impl Into<String>) -> Self {
        self.with_result(image_name, OcrResult::failure(500, error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Names of the images recognized so far.
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OcrService for MockOcr {
    async fn recognize(&self, image: &ImageItem, _settings: &OcrSettings) -> OcrResult {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image.name.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.results
            .get(&image.name)
            .cloned()
            .unwrap_or_else(|| OcrResult::success(200, json!({ "text": format!("text of {}", image.name) })))
    }
}
