//! Tolerant extraction of JSON objects from model replies.
//!
//! Chat models are asked for bare JSON but routinely wrap it in prose or a
//! fenced code block. Extraction tries, in order: the reply as-is, the widest
//! `{...}` span in the text, and the body of a fenced code block.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object regex"));

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)```").expect("valid fenced block regex")
});

/// Decode `T` from a reply that is either already structured or text.
pub fn extract_structured<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    match payload {
        Value::String(text) => extract_from_text(text),
        Value::Null => None,
        other => serde_json::from_value(other.clone()).ok(),
    }
}

pub fn extract_from_text<T: DeserializeOwned>(text: &str) -> Option<T> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str(text) {
        return Some(parsed);
    }

    if let Some(span) = OBJECT_SPAN.find(text) {
        if let Ok(parsed) = serde_json::from_str(span.as_str()) {
            return Some(parsed);
        }
    }

    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|body| serde_json::from_str(body.as_str().trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        steps: Vec<u32>,
    }

    #[test]
    fn test_structured_value_passes_through() {
        let reply: Option<Reply> = extract_structured(&json!({"steps": [1, 2]}));
        assert_eq!(reply, Some(Reply { steps: vec![1, 2] }));
    }

    #[test]
    fn test_plain_json_text() {
        let reply: Option<Reply> = extract_structured(&json!(r#"{"steps": [3]}"#));
        assert_eq!(reply, Some(Reply { steps: vec![3] }));
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let text = "Here is the route you asked for: {\"steps\": [1, 2, 3]} Enjoy!";
        let reply: Option<Reply> = extract_from_text(text);
        assert_eq!(reply, Some(Reply { steps: vec![1, 2, 3] }));
    }

    #[test]
    fn test_fenced_block_after_failed_span() {
        // The widest {...} span covers both objects and is not valid JSON,
        // so the fenced body has to be used
        let text = "Example {not json}\n```json\n{\"steps\": [7]}\n```\nand {more}";
        let reply: Option<Reply> = extract_from_text(text);
        assert_eq!(reply, Some(Reply { steps: vec![7] }));
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(extract_from_text::<Reply>("no structure here"), None);
        assert_eq!(extract_from_text::<Reply>(""), None);
        assert_eq!(extract_structured::<Reply>(&Value::Null), None);
        assert_eq!(extract_structured::<Reply>(&json!({"other": 1})), None);
    }
}
