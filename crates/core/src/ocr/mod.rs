//! OCR adapter.
//!
//! One request per image against an external OCR endpoint. Results are
//! normalized into [`OcrResult`](of_protocol::image_models::OcrResult) values;
//! the adapter never returns an error past its boundary.

pub mod base;
pub mod confidence;
pub mod mathpix;
pub mod mock_ocr;

pub use base::OcrService;
pub use confidence::{extract_confidence, format_confidence};
pub use mathpix::MathpixOcr;
pub use mock_ocr::MockOcr;
