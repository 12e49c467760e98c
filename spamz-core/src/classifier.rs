//! Local Keyword Classifier
//!
//! Rule-based substitute for the remote model. Used when every remote route
//! has failed, so it must be total: no I/O, no error cases, and the same
//! payload always yields the same result.
//!
//! Scoring:
//!   +1 per spam keyword contained in `subject sender text` (lowercased)
//!   +2 if that text contains a URL-looking pattern
//!   +1 if more than 20% of the raw `text` (in UTF-16 units) is digits
//!
//! `p_spam = min(0.99, tanh(score / 3))`, `p_ham = max(0.01, 1 - p_spam)`.

use std::collections::BTreeMap;

use crate::types::{ClassificationResult, Label, Payload};

/// Spam-indicator substrings. Matching is plain containment, so overlapping
/// entries ("buy" / "buy now") each count.
pub const SPAM_KEYWORDS: [&str; 19] = [
    "free",
    "win",
    "winner",
    "prize",
    "click",
    "claim",
    "urgent",
    "buy now",
    "buy",
    "cheap",
    "cheap meds",
    "prescription",
    "congrat",
    "selected",
    "limited time",
    "offer",
    "http",
    "bit.ly",
    "visit",
];

/// Patterns that mark a link. Worth [`URL_BONUS`] on top of keyword hits.
const URL_PATTERNS: [&str; 3] = ["http://", "https://", "www."];

const URL_BONUS: u32 = 2;
const DIGIT_RATIO_THRESHOLD: f64 = 0.2;
const SCORE_SCALE: f64 = 3.0;
const MAX_SPAM_PROBABILITY: f64 = 0.99;
const MIN_HAM_PROBABILITY: f64 = 0.01;
const SPAM_THRESHOLD: f64 = 0.5;

/// Raw heuristic score for a payload.
#[must_use]
pub fn spam_score(payload: &Payload) -> u32 {
    let haystack = format!("{} {} {}", payload.subject, payload.sender, payload.text).to_lowercase();

    let keyword_hits = SPAM_KEYWORDS
        .iter()
        .filter(|k| haystack.contains(*k))
        .count() as u32;

    let url_bonus = if URL_PATTERNS.iter().any(|p| haystack.contains(p)) {
        URL_BONUS
    } else {
        0
    };

    let digit_bonus = u32::from(digit_ratio(&payload.text) > DIGIT_RATIO_THRESHOLD);

    keyword_hits + url_bonus + digit_bonus
}

/// Fraction of `text` that is ASCII digits, measured in UTF-16 code units
/// so characters outside the BMP count twice. Empty text is 0.
#[must_use]
pub fn digit_ratio(text: &str) -> f64 {
    let total = text.encode_utf16().count();
    if total == 0 {
        return 0.0;
    }
    let digits = text.chars().filter(char::is_ascii_digit).count();
    digits as f64 / total as f64
}

/// Classify a payload without touching the network.
#[must_use]
pub fn classify_locally(payload: &Payload) -> ClassificationResult {
    let score = spam_score(payload);

    let p_spam = (f64::from(score) / SCORE_SCALE).tanh().min(MAX_SPAM_PROBABILITY);
    let p_ham = (1.0 - p_spam).max(MIN_HAM_PROBABILITY);

    let p_spam = round3(p_spam);
    let p_ham = round3(p_ham);

    let label = if p_spam > SPAM_THRESHOLD {
        Label::Spam
    } else {
        Label::Ham
    };

    ClassificationResult {
        label,
        proba: Some(BTreeMap::from([
            ("spam".to_string(), p_spam),
            ("ham".to_string(), p_ham),
        ])),
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
