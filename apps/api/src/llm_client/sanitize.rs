//! Response sanitizer — turns a raw AI reply into a parsed JSON value.
//!
//! Models wrap JSON in code fences, prefix it with a `json` label, or surround
//! it with prose. The sanitizer drops those artifacts and parses the first
//! top-level bracketed payload of the requested shape. There is no partial
//! recovery: either a complete value parses or the reply is malformed.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SanitizeError {
    #[error("Malformed AI response: {0}")]
    MalformedAiResponse(String),
}

/// Which bracket the payload must open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn opens_with(self, c: char) -> bool {
        match self {
            JsonShape::Array => c == '[',
            JsonShape::Object => c == '{',
        }
    }

    fn describe(self) -> &'static str {
        match self {
            JsonShape::Array => "JSON array",
            JsonShape::Object => "JSON object",
        }
    }
}

/// Extracts and parses the JSON payload of `raw`.
pub fn extract_json(raw: &str, shape: JsonShape) -> Result<Value, SanitizeError> {
    parse_payload(strip_fences(raw), shape)
}

/// Like [`extract_json`], but first collapses line breaks to single spaces.
/// Free-text fields such as feedback often carry raw newlines, which are not
/// legal inside JSON strings.
pub fn extract_json_collapsing_newlines(
    raw: &str,
    shape: JsonShape,
) -> Result<Value, SanitizeError> {
    parse_payload(&collapse_newlines(strip_fences(raw)), shape)
}

/// Strips ```json ... ``` or ``` ... ``` code fences and a bare leading `json` label.
fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    for label in ["json", "JSON"] {
        if let Some(stripped) = text.strip_prefix(label) {
            text = stripped;
            break;
        }
    }
    let text = text.trim();
    text.strip_suffix("```").map(str::trim_end).unwrap_or(text)
}

/// Replaces every run of line breaks, with an optional backslash in front, by one space.
fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let starts_break = match c {
            '\r' | '\n' => true,
            '\\' => matches!(chars.peek(), Some(&('\r' | '\n'))),
            _ => false,
        };
        if starts_break {
            while matches!(chars.peek(), Some(&('\r' | '\n'))) {
                chars.next();
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Tries each top-level bracketed region that opens with the requested shape,
/// in order, and returns the first that parses.
fn parse_payload(text: &str, shape: JsonShape) -> Result<Value, SanitizeError> {
    let mut last_failure: Option<String> = None;
    let mut cursor = 0;

    while let Some((offset, _)) = text[cursor..]
        .char_indices()
        .find(|&(_, c)| shape.opens_with(c))
    {
        let start = cursor + offset;
        let Some(end) = balanced_end(text, start) else {
            last_failure = Some(format!("unbalanced brackets in {}", shape.describe()));
            break;
        };
        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_failure = Some(format!("invalid {}: {e}", shape.describe()));
                // skip nested candidates; a fragment of a broken payload is not a result
                cursor = end;
            }
        }
    }

    Err(SanitizeError::MalformedAiResponse(last_failure.unwrap_or_else(
        || format!("no {} found in response", shape.describe()),
    )))
}

/// Returns the byte index just past the bracket that closes the one at `start`.
/// Brackets inside string literals are ignored.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
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
                depth -= 1;
                if depth == 0 {
                    return Some(start + i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
