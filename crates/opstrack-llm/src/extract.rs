//! JSON extraction from model replies.
//!
//! Models wrap JSON in markdown fences or surround it with prose. Try, in
//! order: the whole reply, the contents of the first code fence, then the
//! first balanced object or array found by scanning.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use opstrack_core::{Error, Result};

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("fence pattern compiles")
});

/// Longest reply prefix quoted in a format error.
const PREVIEW_CHARS: usize = 120;

/// Parse the JSON payload out of a model reply.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::ResponseFormat("empty response".into()));
    }

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Ok(v);
    }

    let unfenced = strip_fences(trimmed);
    if let Ok(v) = serde_json::from_str::<Value>(unfenced.trim()) {
        return Ok(v);
    }

    if let Some(v) = first_balanced(&unfenced).or_else(|| first_balanced(trimmed)) {
        return Ok(v);
    }

    Err(Error::ResponseFormat(preview(trimmed)))
}

/// Content of the first complete code fence, or the text with a dangling
/// opening fence removed.
fn strip_fences(text: &str) -> String {
    if let Some(inner) = FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().to_string();
    }
    match text.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
            rest.trim_end_matches('`').to_string()
        }
        None => text.to_string(),
    }
}

/// Scan for the first `{` or `[` that opens a balanced, parseable value.
fn first_balanced(text: &str) -> Option<Value> {
    for (start, ch) in text.char_indices() {
        if ch != '{' && ch != '[' {
            continue;
        }
        if let Some(end) = balanced_end(&text[start..]) {
            if let Ok(v) = serde_json::from_str::<Value>(&text[start..start + end]) {
                return Some(v);
            }
        }
    }
    None
}

/// Byte length of the balanced value at the start of `text`. Brackets inside
/// string literals are ignored.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}
