//! Core type definitions for SPAMZ.
//!
//! Nothing here outlives a single submit: a [`Payload`] goes in, a
//! [`Resolution`] comes out.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The text sample submitted for classification.
///
/// Serializes to `{"subject", "sender", "text"}` for JSON bodies and to the
/// same three keys when encoded as URL query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Message subject line.
    #[serde(default)]
    pub subject: String,
    /// Sender address or display name.
    #[serde(default)]
    pub sender: String,
    /// Message body.
    #[serde(default)]
    pub text: String,
}

impl Payload {
    /// Create a payload from its three fields.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// The canned "obvious spam" sample.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(
            "Claim your prize",
            "promo@scam.example",
            "Congratulations! You have been selected to receive a free gift card. \
             Click the link to claim: http://bit.ly/fake",
        )
    }

    /// The sample sent when diagnosing which backend routes answer.
    #[must_use]
    pub fn diagnostic() -> Self {
        Self::new("Test", "test@example.com", "hello")
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Unsolicited / malicious.
    Spam,
    /// Legitimate.
    Ham,
    /// The remote service gave no usable label.
    Unknown,
}

impl Label {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Ham => "ham",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = std::convert::Infallible;

    /// Never fails: anything that is not `spam` or `ham` is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "spam" => Self::Spam,
            "ham" => Self::Ham,
            _ => Self::Unknown,
        })
    }
}

/// A label with optional per-class probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Predicted label.
    pub label: Label,
    /// Class name → probability. Absent when the remote service omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proba: Option<BTreeMap<String, f64>>,
}

impl ClassificationResult {
    /// The result reported for an empty / unusable remote body.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            label: Label::Unknown,
            proba: None,
        }
    }

    /// Leniently interpret a decoded response body.
    ///
    /// A missing or non-string `label` becomes [`Label::Unknown`]. `proba` is
    /// kept only when it is an object; non-numeric entries are dropped and
    /// numeric ones are reported as given.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let label = value
            .get("label")
            .and_then(Value::as_str)
            .map_or(Label::Unknown, |s| s.parse().unwrap_or(Label::Unknown));

        let proba = value.get("proba").and_then(Value::as_object).map(|obj| {
            obj.iter()
                .filter_map(|(class, p)| p.as_f64().map(|p| (class.clone(), p)))
                .collect::<BTreeMap<_, _>>()
        });

        Self { label, proba }
    }

    /// Probability assigned to `class`, if reported.
    #[must_use]
    pub fn probability(&self, class: &str) -> Option<f64> {
        self.proba.as_ref().and_then(|p| p.get(class).copied())
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Which probe satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteId {
    /// `POST` to the primary route.
    #[serde(rename = "POST primary")]
    PostPrimary,
    /// `GET` to the primary route.
    #[serde(rename = "GET primary")]
    GetPrimary,
    /// `POST` to the secondary route.
    #[serde(rename = "POST secondary")]
    PostSecondary,
    /// Every remote attempt failed; the local heuristic answered.
    #[serde(rename = "local_fallback")]
    LocalFallback,
}

impl RouteId {
    /// Stable identifier exposed to callers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostPrimary => "POST primary",
            Self::GetPrimary => "GET primary",
            Self::PostSecondary => "POST secondary",
            Self::LocalFallback => "local_fallback",
        }
    }

    /// Whether the answer came from the local heuristic.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::LocalFallback)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolution: the classification plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The classification.
    pub data: ClassificationResult,
    /// Which route produced it.
    pub source: RouteId,
    /// The decoded body as received (or the serialized local result).
    #[serde(default)]
    pub raw: Value,
}

impl Resolution {
    /// Wrap a decoded remote body.
    #[must_use]
    pub fn remote(source: RouteId, raw: Value) -> Self {
        Self {
            data: ClassificationResult::from_value(&raw),
            source,
            raw,
        }
    }

    /// Wrap a local heuristic result.
    #[must_use]
    pub fn local(data: ClassificationResult) -> Self {
        let raw = serde_json::to_value(&data).unwrap_or(Value::Null);
        Self {
            data,
            source: RouteId::LocalFallback,
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_defaults_to_empty_fields() {
        let p: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(p, Payload::default());
        assert!(p.subject.is_empty() && p.sender.is_empty() && p.text.is_empty());
    }

    #[test]
    fn payload_serializes_three_keys() {
        let v = serde_json::to_value(Payload::new("s", "a@b", "t")).unwrap();
        assert_eq!(v, json!({"subject": "s", "sender": "a@b", "text": "t"}));
    }

    #[test]
    fn label_parse_is_lenient() {
        assert_eq!("SPAM".parse::<Label>().unwrap(), Label::Spam);
        assert_eq!(" ham ".parse::<Label>().unwrap(), Label::Ham);
        assert_eq!("phishing".parse::<Label>().unwrap(), Label::Unknown);
    }

    #[test]
    fn from_value_reads_label_and_proba() {
        let r = ClassificationResult::from_value(&json!({
            "label": "spam",
            "proba": {"spam": 0.9, "ham": 0.1}
        }));
        assert_eq!(r.label, Label::Spam);
        assert_eq!(r.probability("spam"), Some(0.9));
        assert_eq!(r.probability("ham"), Some(0.1));
    }

    #[test]
    fn from_value_empty_object_is_unknown() {
        let r = ClassificationResult::from_value(&json!({}));
        assert_eq!(r, ClassificationResult::unknown());
    }

    #[test]
    fn from_value_drops_non_numeric_proba() {
        let r = ClassificationResult::from_value(&json!({
            "label": 1,
            "proba": {"spam": "high", "ham": 0.2}
        }));
        assert_eq!(r.label, Label::Unknown);
        let proba = r.proba.unwrap();
        assert_eq!(proba.len(), 1);
        assert_eq!(proba["ham"], 0.2);
    }

    #[test]
    fn from_value_ignores_non_object_proba() {
        let r = ClassificationResult::from_value(&json!({"label": "ham", "proba": [0.1, 0.9]}));
        assert_eq!(r.label, Label::Ham);
        assert!(r.proba.is_none());
    }

    #[test]
    fn route_id_wire_names() {
        assert_eq!(serde_json::to_value(RouteId::PostPrimary).unwrap(), json!("POST primary"));
        assert_eq!(serde_json::to_value(RouteId::GetPrimary).unwrap(), json!("GET primary"));
        assert_eq!(serde_json::to_value(RouteId::PostSecondary).unwrap(), json!("POST secondary"));
        assert_eq!(serde_json::to_value(RouteId::LocalFallback).unwrap(), json!("local_fallback"));
        assert_eq!(RouteId::LocalFallback.to_string(), "local_fallback");
    }

    #[test]
    fn local_resolution_keeps_raw_copy() {
        let data = ClassificationResult {
            label: Label::Ham,
            proba: Some(BTreeMap::from([("ham".to_string(), 1.0), ("spam".to_string(), 0.0)])),
        };
        let res = Resolution::local(data);
        assert!(res.source.is_fallback());
        assert_eq!(res.raw["label"], json!("ham"));
        assert_eq!(res.raw["proba"]["ham"], json!(1.0));
    }
}
