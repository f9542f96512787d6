//! Mathpix-compatible OCR client.
//!
//! Sends the image as a base64 data URL in the `src` field and the
//! credentials as `app_id`/`app_key` headers.

use crate::agents::upload::{data_url, detect_mime_type};
use crate::ocr::base::OcrService;
use async_trait::async_trait;
use of_protocol::config_models::OcrSettings;
use of_protocol::image_models::{ImageItem, OcrResult};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    src: String,
    formats: Vec<&'a str>,
}

impl<'a> OcrRequest<'a> {
    fn new(image: &ImageItem, settings: &'a OcrSettings) -> Self {
        let mime = if image.mime_type.is_empty() {
            detect_mime_type(&image.name)
        } else {
            image.mime_type.as_str()
        };

        let mut formats: Vec<&str> = settings.output_formats.iter().map(String::as_str).collect();
        if formats.is_empty() {
            formats.push("text");
        }
        if settings.include_math && !formats.contains(&"latex_styled") {
            formats.push("latex_styled");
        }

        Self {
            src: data_url(mime, &image.data),
            formats,
        }
    }
}

/// OCR client speaking the Mathpix v3 text API.
#[derive(Clone)]
pub struct MathpixOcr {
    client: Client,
}

impl MathpixOcr {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OcrService for MathpixOcr {
    async fn recognize(&self, image: &ImageItem, settings: &OcrSettings) -> OcrResult {
        tracing::debug!(image = %image.id, bytes = image.size, "sending image to OCR");

        let request = OcrRequest::new(image, settings);
        let response = match self
            .client
            .post(&settings.endpoint)
            .header("app_id", &settings.app_id)
            .header("app_key", &settings.app_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return OcrResult::failure(0, format!("Request failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return OcrResult::failure(
                status.as_u16(),
                format!(
                    "Error {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            );
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                return OcrResult::failure(status.as_u16(), format!("Invalid response body: {e}"))
            }
        };

        // The API reports recognition failures inside a 200 response.
        if let Some(error) = data.get("error").and_then(Value::as_str) {
            return OcrResult::failure(status.as_u16(), error.to_string());
        }

        OcrResult::success(status.as_u16(), data)
    }
}
