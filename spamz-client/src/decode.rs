//! Response body decoding.
//!
//! Services in the wild mislabel their bodies, so the declared content type
//! is only a hint: a JSON-typed body is decoded as JSON, and anything that
//! fails (or was never typed) gets a second attempt as plain text. The
//! lenient entry point never fails; an unusable body is `{}`.

use serde_json::{Map, Value};

use crate::error::ClientError;

/// Whether `content_type` declares structured JSON.
#[must_use]
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

/// Decode a body, reporting failure.
///
/// A JSON `null` is treated as an empty object.
///
/// # Errors
/// Returns `ClientError::Decode` if neither the typed nor the text attempt
/// yields JSON.
pub fn decode_strict(content_type: Option<&str>, body: &[u8]) -> Result<Value, ClientError> {
    if is_json_content_type(content_type) {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            return Ok(null_to_empty(value));
        }
    }

    let text = String::from_utf8_lossy(body);
    let value: Value = serde_json::from_str(text.trim())?;
    Ok(null_to_empty(value))
}

/// Decode a body, falling back to `{}`.
#[must_use]
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Value {
    decode_strict(content_type, body).unwrap_or_else(|_| empty_object())
}

/// Best-effort display form of a body: compact JSON if it decodes, the raw
/// text otherwise.
#[must_use]
pub fn display_body(content_type: Option<&str>, body: &[u8]) -> String {
    match decode_strict(content_type, body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

/// The `{}` substitute for an undecodable body.
#[must_use]
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn null_to_empty(value: Value) -> Value {
    if value.is_null() { empty_object() } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_content_type_decodes() {
        let v = decode_body(Some("application/json; charset=utf-8"), br#"{"label":"spam"}"#);
        assert_eq!(v, json!({"label": "spam"}));
    }

    #[test]
    fn plain_text_body_still_parsed() {
        let v = decode_body(Some("text/plain"), b"  {\"label\":\"ham\"}\n");
        assert_eq!(v, json!({"label": "ham"}));
    }

    #[test]
    fn missing_content_type_still_parsed() {
        let v = decode_body(None, br#"{"label":"ham","proba":{"ham":0.8}}"#);
        assert_eq!(v["proba"]["ham"], json!(0.8));
    }

    #[test]
    fn mislabeled_json_falls_back_to_empty() {
        assert_eq!(decode_body(Some("application/json"), b"<html>oops</html>"), json!({}));
    }

    #[test]
    fn garbage_is_empty_object() {
        assert_eq!(decode_body(None, b"not json at all"), json!({}));
        assert_eq!(decode_body(None, b""), json!({}));
        assert_eq!(decode_body(None, &[0xff, 0xfe, 0x00]), json!({}));
    }

    #[test]
    fn null_becomes_empty_object() {
        assert_eq!(decode_body(Some("application/json"), b"null"), json!({}));
    }

    #[test]
    fn strict_reports_decode_error() {
        let err = decode_strict(Some("text/html"), b"<p>").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn display_prefers_json_then_text() {
        assert_eq!(display_body(None, br#"{ "ok" : true }"#), r#"{"ok":true}"#);
        assert_eq!(display_body(None, b"pong"), "pong");
    }

    #[test]
    fn content_type_detection() {
        assert!(is_json_content_type(Some("Application/JSON")));
        assert!(is_json_content_type(Some("application/problem+json")));
        assert!(!is_json_content_type(Some("text/plain")));
        assert!(!is_json_content_type(None));
    }
}
