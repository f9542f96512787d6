//! Text extraction from OCR payloads and agent responses.
//!
//! Agent responses have no fixed schema. Fields are located with an explicit
//! breadth-first search bounded by [`MAX_FIELD_DEPTH`], so hostile or deeply
//! nested payloads cannot cause unbounded work.

use of_protocol::workflow_models::AgentCallResult;
use serde_json::Value;
use std::collections::VecDeque;

/// Deepest nesting level inspected by [`find_string_field`]. The root object is depth 0.
pub const MAX_FIELD_DEPTH: usize = 8;

/// Field holding the text meant to be read aloud.
pub const READING_FIELD: &str = "lectura";

/// Find the first non-empty string stored under `key`, searching breadth-first.
///
/// Shallower matches win over deeper ones. Containers nested deeper than
/// `max_depth` are not inspected.
pub fn find_string_field<'a>(value: &'a Value, key: &str, max_depth: usize) -> Option<&'a str> {
    let mut queue: VecDeque<(&Value, usize)> = VecDeque::from([(value, 0)]);

    while let Some((node, depth)) = queue.pop_front() {
        let children: Box<dyn Iterator<Item = &Value>> = match node {
            Value::Object(map) => {
                if let Some(found) = map.get(key).and_then(Value::as_str) {
                    if !found.is_empty() {
                        return Some(found);
                    }
                }
                Box::new(map.values())
            }
            Value::Array(items) => Box::new(items.iter()),
            _ => continue,
        };

        if depth < max_depth {
            queue.extend(
                children
                    .filter(|child| child.is_object() || child.is_array())
                    .map(|child| (child, depth + 1)),
            );
        }
    }

    None
}

fn top_level_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Text of one OCR payload: string, `text`, `latex_styled`/`latex`, else compact JSON.
pub fn ocr_text(data: &Value) -> String {
    if let Some(text) = data.as_str() {
        return text.to_string();
    }

    ["text", "latex_styled", "latex"]
        .iter()
        .find_map(|key| top_level_str(data, key))
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

/// Prompt for the responder agents built from the compiler agent's reply.
pub fn question_text(data: &Value) -> String {
    if let Some(text) = data.as_str() {
        return text.to_string();
    }

    top_level_str(data, "text")
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

/// Text to narrate for an agent result.
///
/// Returns `None` for failed or empty results.
pub fn reading_text(result: &AgentCallResult) -> Option<String> {
    if result.is_error() {
        return None;
    }
    let data = result.data.as_ref().filter(|d| !d.is_null())?;

    if let Some(text) = data.as_str() {
        return Some(text.to_string());
    }

    find_string_field(data, READING_FIELD, MAX_FIELD_DEPTH)
        .or_else(|| find_string_field(data, "text", MAX_FIELD_DEPTH))
        .map(str::to_string)
        .or_else(|| serde_json::to_string_pretty(data).ok())
}

/// Human-readable rendering of an agent result.
pub fn display_text(result: &AgentCallResult) -> String {
    if let Some(error) = &result.error {
        return format!("Error: {error}");
    }
    reading_text(result).unwrap_or_else(|| "No result".to_string())
}
