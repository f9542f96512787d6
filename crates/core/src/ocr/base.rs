//! Base OcrService trait.

use async_trait::async_trait;
use of_protocol::config_models::OcrSettings;
use of_protocol::image_models::{ImageItem, OcrResult};

/// Text recognition for a single image.
///
/// Transport and HTTP failures are reported through [`OcrResult::error`]
/// with an empty `data` payload. A status of `0` means no response was received.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn recognize(&self, image: &ImageItem, settings: &OcrSettings) -> OcrResult;
}
