//! Recovery of JSON payloads from free-form model output.
//!
//! Models asked for "JSON only" still wrap answers in markdown fences, add a
//! sentence of prose before or after, emit raw newlines inside string
//! literals, or get cut off by the token limit. Everything here is
//! best-effort: callers either get a value that genuinely parsed or a typed
//! error they can swap for a fallback payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```[ \t]*(?:json)?[ \t]*\r?\n?").expect("fence pattern compiles")
});

/// Which JSON container a caller is willing to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Any,
    Object,
    Array,
}

impl JsonShape {
    fn opens_with(self, byte: u8) -> bool {
        match self {
            JsonShape::Any => byte == b'{' || byte == b'[',
            JsonShape::Object => byte == b'{',
            JsonShape::Array => byte == b'[',
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no JSON value found in model output")]
    NoJson,

    #[error("JSON did not match the expected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Removes every markdown fence marker, including an optional `json` tag
/// and the line break that follows it.
pub fn strip_code_fences(text: &str) -> String {
    FENCE.replace_all(text, "").into_owned()
}

/// Removes C0 and C1 control characters (U+0000–U+001F, U+007F–U+009F).
pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// Returns the first span of `text` that opens with a bracket allowed by
/// `shape`, is balanced, and parses as JSON.
pub fn find_json(text: &str, shape: JsonShape) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        let Some(offset) = bytes[start..].iter().position(|b| shape.opens_with(*b)) else {
            break;
        };
        let open = start + offset;

        if let Some(len) = balanced_len(&bytes[open..]) {
            let candidate = &text[open..open + len];
            if serde_json::from_str::<IgnoredAny>(candidate).is_ok() {
                return Some(candidate);
            }
        }
        start = open + 1;
    }

    None
}

/// Length of the bracketed value at the start of `bytes`, or `None` when it
/// never closes or closes with the wrong bracket. String literals are
/// skipped so braces inside them do not count.
fn balanced_len(bytes: &[u8]) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' | b'[' => stack.push(b),
            b'}' | b']' => {
                let opener = stack.pop()?;
                if (opener == b'{') != (b == b'}') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parses model output into `T`, trying progressively more aggressive
/// cleanup before giving up.
pub fn parse_json<T: DeserializeOwned>(raw: &str, shape: JsonShape) -> Result<T, ExtractError> {
    let unfenced = strip_code_fences(raw);
    let trimmed = unfenced.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let first = match find_json(trimmed, shape).map(|span| serde_json::from_str::<T>(span)) {
        Some(Ok(value)) => return Ok(value),
        Some(Err(e)) => Some(e),
        None => None,
    };

    // A raw newline inside a string breaks the outer value, and the search
    // then lands on a nested one. Flattening restores the outer value.
    let flattened = strip_control_chars(trimmed);
    match find_json(&flattened, shape) {
        Some(span) => serde_json::from_str(span).map_err(ExtractError::Shape),
        None => Err(first.map_or(ExtractError::NoJson, ExtractError::Shape)),
    }
}

/// Like [`parse_json`], but hands back `fallback()` untouched when the
/// output cannot be used.
pub fn parse_or<T, F>(raw: &str, shape: JsonShape, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match parse_json(raw, shape) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, raw_len = raw.len(), "⚠️ falling back to default payload");
            fallback()
        }
    }
}

/// Cleanup used by the pass-through generate route: returns the first JSON
/// value in the output, or the cleaned text when there is none.
pub fn clean_model_output(raw: &str) -> String {
    let cleaned = strip_control_chars(&strip_code_fences(raw.trim()));
    match find_json(&cleaned, JsonShape::Any) {
        Some(span) => span.to_string(),
        None => cleaned.trim().to_string(),
    }
}
