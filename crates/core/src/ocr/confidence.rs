//! Confidence extraction from OCR payloads.

use serde_json::Value;

const CONFIDENCE_FIELDS: [&str; 2] = ["confidence", "confidence_rate"];

/// Normalized confidence (0..=1) carried by an OCR payload.
///
/// Values in `0..=1` are taken as probabilities, values in `(1, 100]` as
/// percentages. Anything else, including a missing field, yields `None`
/// rather than a zero score.
pub fn extract_confidence(data: &Value) -> Option<f64> {
    CONFIDENCE_FIELDS
        .iter()
        .filter_map(|field| data.get(field))
        .find_map(numeric)
        .and_then(normalize)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn normalize(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        None
    }
}

/// Render a probability as a whole percentage, e.g. `0.93` → `"93%"`.
pub fn format_confidence(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}
