//! Merges per-image OCR results into one delimited text block.

use crate::extract::ocr_text;
use crate::ocr::confidence::{extract_confidence, format_confidence};
use of_protocol::image_models::OcrResult;

/// Compile OCR results into `OCR #n <text>[ (Confidence: X%)] FIN OCR #n` blocks.
///
/// Failed results are skipped. Ordinals follow each result's position in
/// `results`, so a skipped entry leaves a gap in the numbering. Blocks are
/// separated by a blank line.
pub fn compile_ocr_results(results: &[OcrResult]) -> String {
    results
        .iter()
        .enumerate()
        .filter(|(_, result)| !result.is_error())
        .filter_map(|(index, result)| result.data.as_ref().map(|data| (index + 1, data)))
        .map(|(ordinal, data)| {
            let text = ocr_text(data);
            let confidence = extract_confidence(data)
                .map(|p| format!(" (Confidence: {})", format_confidence(p)))
                .unwrap_or_default();
            format!("OCR #{ordinal} {text}{confidence} FIN OCR #{ordinal}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_blocks_with_confidence() {
        let results = vec![
            OcrResult::success(200, json!({"text": "x + 1 = 2", "confidence": 0.93})),
            OcrResult::success(200, json!("plain page")),
        ];

        assert_eq!(
            compile_ocr_results(&results),
            "OCR #1 x + 1 = 2 (Confidence: 93%) FIN OCR #1\n\nOCR #2 plain page FIN OCR #2"
        );
    }

    #[test]
    fn test_compile_skips_errors_and_keeps_ordinals() {
        let results = vec![
            OcrResult::success(200, json!({"text": "first"})),
            OcrResult::failure(500, "boom"),
            OcrResult::success(200, json!({"latex_styled": "x^2"})),
        ];

        let compiled = compile_ocr_results(&results);
        assert!(compiled.contains("OCR #1 first FIN OCR #1"));
        assert!(compiled.contains("OCR #3 x^2 FIN OCR #3"));
        assert!(!compiled.contains("OCR #2"));
        assert!(!compiled.contains("boom"));
    }

    #[test]
    fn test_compile_empty() {
        assert_eq!(compile_ocr_results(&[]), "");
        assert_eq!(compile_ocr_results(&[OcrResult::failure(0, "offline")]), "");
    }
}
