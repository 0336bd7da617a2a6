//! Structured-output extraction from raw LLM completion text (§4.3).
//!
//! Models asked for JSON don't always return a clean JSON document: some
//! wrap it in a fenced code block, some add leading prose, some leave a
//! trailing comma from a truncated list. These strategies are tried in
//! order, cheapest and most specific first, and the first one that
//! produces a parseable value wins.

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, GatewayError, Result};

/// Extract a JSON value from a raw completion body, trying progressively
/// more permissive strategies.
pub fn extract_json(raw: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(value);
    }

    if let Some(value) = extract_fenced_block(raw) {
        return Ok(value);
    }

    if let Some(value) = extract_balanced_braces(raw) {
        return Ok(value);
    }

    if let Some(value) = extract_with_trailing_comma_cleanup(raw) {
        return Ok(value);
    }

    Err(Error::Gateway(GatewayError::BadResponse(format!(
        "no JSON could be extracted from a {}-byte response",
        raw.len()
    ))))
}

/// Strategy 2: a ```json ... ``` or bare ``` ... ``` fenced block.
fn extract_fenced_block(raw: &str) -> Option<Value> {
    let json_fence = Regex::new(r"```json\s*\n(.*?)\n```").unwrap();
    if let Some(caps) = json_fence.captures(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(caps[1].trim()) {
            return Some(value);
        }
    }

    let bare_fence = Regex::new(r"```\s*\n(.*?)\n```").unwrap();
    if let Some(caps) = bare_fence.captures(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(caps[1].trim()) {
            return Some(value);
        }
    }

    None
}

/// Strategy 3: walk the string tracking brace depth (respecting quoted
/// strings and escapes) to find the first balanced `{...}` or `[...]`
/// span, in case there's leading/trailing prose around the JSON.
fn extract_balanced_braces(raw: &str) -> Option<Value> {
    let bytes = raw.as_bytes();
    let start = raw.find(['{', '['])?;

    let open = bytes[start] as char;
    let close = if open == '{' { '}' } else { ']' };

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
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
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    if let Ok(value) = serde_json::from_str::<Value>(&raw[start..end]) {
                        return Some(value);
                    }
                    break;
                }
            }
            _ => {}
        }
    }

    None
}

/// Strategy 4: same brace-balance walk, then strip trailing commas before
/// `}` or `]` before retrying the parse.
fn extract_with_trailing_comma_cleanup(raw: &str) -> Option<Value> {
    let trailing_comma = Regex::new(r",(\s*[}\]])").unwrap();
    let cleaned = trailing_comma.replace_all(raw, "$1");

    if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim()) {
        return Some(value);
    }

    extract_balanced_braces(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let value = extract_json(r#"{"found": true, "confidence": 0.9}"#).unwrap();
        assert_eq!(value["found"], true);
    }

    #[test]
    fn parses_json_fenced_block() {
        let raw = "Here's the result:\n```json\n{\"found\": false}\n```\nDone.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["found"], false);
    }

    #[test]
    fn parses_bare_fenced_block() {
        let raw = "```\n{\"ok\": 1}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["ok"], 1);
    }

    #[test]
    fn parses_with_leading_prose_via_brace_walk() {
        let raw = "Sure, here is the JSON you asked for: {\"a\": [1, 2, {\"b\": \"c\"}]} and that's it.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["a"][2]["b"], "c");
    }

    #[test]
    fn parses_with_trailing_comma_cleanup() {
        let raw = r#"{"items": [1, 2, 3,], "done": true,}"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["items"][2], 3);
        assert_eq!(value["done"], true);
    }

    #[test]
    fn fails_on_non_json_garbage() {
        assert!(extract_json("this is not json at all").is_err());
    }

    #[test]
    fn ignores_braces_inside_quoted_strings() {
        let raw = r#"prefix {"text": "a } b { c"} suffix"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["text"], "a } b { c");
    }
}
