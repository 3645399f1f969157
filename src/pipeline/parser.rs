//! Structured-output parsing
//!
//! Model output is expected to be JSON but routinely arrives wrapped in
//! code fences or surrounded by prose. This module strips the decoration,
//! locates the payload at the first `[` or `{`, and scans forward for the
//! balanced closing bracket (string- and escape-aware) so nested structures
//! or trailing prose cannot mis-slice the value.

use serde_json::Value;
use thiserror::Error;

use crate::types::ExtractedItem;

/// Errors from structured-output parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON payload found in model output")]
    NoPayload,
    #[error("unbalanced JSON payload in model output")]
    Unbalanced,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extract one JSON value from decorated model output.
///
/// A single object is coerced into a one-element list so downstream code
/// always sees a uniform "list of extracted items" shape.
pub fn extract_json_items(text: &str) -> Result<Vec<Value>, ParseError> {
    let clean = text.replace("```json", "").replace("```", "");
    let clean = clean.trim();

    let start = match (clean.find('['), clean.find('{')) {
        (Some(square), Some(curly)) => square.min(curly),
        (Some(square), None) => square,
        (None, Some(curly)) => curly,
        (None, None) => return Err(ParseError::NoPayload),
    };

    let end = balanced_end(&clean[start..]).ok_or(ParseError::Unbalanced)?;
    let value: Value = serde_json::from_str(&clean[start..start + end])?;

    Ok(match value {
        Value::Array(items) => items,
        other => vec![other],
    })
}

/// Parse model output into extracted items.
pub fn parse_items(text: &str) -> Result<Vec<ExtractedItem>, ParseError> {
    extract_json_items(text)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(ParseError::Json))
        .collect()
}

/// Byte length of the balanced JSON value starting at `text[0]`.
///
/// Tracks bracket depth outside of strings, honoring escape sequences, and
/// stops at the first position where depth returns to zero. Returns None if
/// the value never closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }

    None
}
