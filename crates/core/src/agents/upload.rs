//! Inline file attachments for agent requests.
//!
//! Images are re-encoded as self-describing payloads: name, MIME type and a
//! base64 data URL of the bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use of_protocol::image_models::ImageItem;
use serde::{Deserialize, Serialize};

/// A file attached to an agent request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Always `"file"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub mime: String,
    /// `data:<mime>;base64,<payload>`
    pub data: String,
}

impl Upload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: &[u8]) -> Self {
        let mime = mime.into();
        Self {
            kind: "file".to_string(),
            name: name.into(),
            data: data_url(&mime, bytes),
            mime,
        }
    }

    pub fn from_image(image: &ImageItem) -> Self {
        let mime = if image.mime_type.is_empty() {
            detect_mime_type(&image.name).to_string()
        } else {
            image.mime_type.clone()
        };
        Self::new(image.name.clone(), mime, &image.data)
    }
}

/// Encode bytes as a data URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Detect an image MIME type by file extension.
pub fn detect_mime_type(name: &str) -> &'static str {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
