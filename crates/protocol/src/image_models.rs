//! Image items and OCR results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use ts_rs::TS;

/// Lifecycle of an image within a run.
///
/// Status only moves forward: `Pending -> Processing -> Completed | Error`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ImageStatus {
    /// Whether moving from `self` to `next` respects the forward-only rule.
    pub fn can_transition_to(self, next: ImageStatus) -> bool {
        matches!(
            (self, next),
            (ImageStatus::Pending, ImageStatus::Processing)
                | (ImageStatus::Pending, ImageStatus::Error)
                | (ImageStatus::Processing, ImageStatus::Completed)
                | (ImageStatus::Processing, ImageStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ImageStatus::Completed | ImageStatus::Error)
    }
}

/// Normalized response of one OCR call.
///
/// `data` is whatever the OCR service returned: plain text, or an object with
/// `text`, `latex_styled` and optionally `confidence` fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct OcrResult {
    /// HTTP status code, or 0 when the request never reached the server.
    pub status: u16,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResult {
    pub fn success(status: u16, data: serde_json::Value) -> Self {
        Self {
            status,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// An image added by the user (file upload or camera capture).
#[derive(Serialize, Deserialize, Clone, TS)]
pub struct ImageItem {
    /// Generated when the image is added to the session.
    pub id: String,

    /// Display name, usually the original file name.
    pub name: String,

    /// Payload size in bytes.
    pub size: u64,

    pub mime_type: String,

    pub status: ImageStatus,

    #[serde(default)]
    pub ocr_result: Option<OcrResult>,

    /// Raw image bytes. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub data: Arc<Vec<u8>>,
}

impl ImageItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            status: ImageStatus::Pending,
            ocr_result: None,
            data: Arc::new(data),
        }
    }
}

impl fmt::Debug for ImageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageItem")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .field("status", &self.status)
            .field("ocr_result", &self.ocr_result)
            .finish_non_exhaustive()
    }
}
