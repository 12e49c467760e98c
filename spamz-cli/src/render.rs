//! Terminal rendering of results.

use std::fmt::Write;

use spamz_client::probe::BackendReport;
use spamz_core::Resolution;

const FALLBACK_NOTE: &str = " (heuristic). Backend may be missing or reject POST.";

/// Meta line, label badge, per-class percentages, then the raw body.
pub fn render(resolution: &Resolution) -> String {
    let mut out = String::new();

    let _ = write!(out, "Used: {}", resolution.source);
    if resolution.source.is_fallback() {
        out.push_str(FALLBACK_NOTE);
    }
    out.push('\n');

    let _ = writeln!(out, "{}", resolution.data.label.as_str().to_uppercase());

    if let Some(proba) = &resolution.data.proba {
        let width = proba.keys().map(String::len).max().unwrap_or(0);
        for (class, p) in proba {
            let _ = writeln!(out, "  {class:<width$}  {}", percent(*p));
        }
    }

    let raw = serde_json::to_string_pretty(&resolution.raw).unwrap_or_else(|_| "{}".to_string());
    let _ = writeln!(out, "\n{raw}");
    out
}

/// Probability as a one-decimal percentage; non-finite values as-is.
pub fn percent(p: f64) -> String {
    if p.is_finite() {
        format!("{:.1}%", p * 100.0)
    } else {
        p.to_string()
    }
}

/// Attempts table plus the summary line.
pub fn render_report(report: &BackendReport) -> String {
    let mut out = String::new();
    for attempt in &report.attempts {
        let outcome = attempt
            .status
            .map_or_else(|| "no response".to_string(), |s| s.to_string());
        let _ = writeln!(out, "{:<20} {outcome}", attempt.request);
    }
    if let Some(body) = &report.body {
        let _ = writeln!(out, "returned: {body}");
    }
    let _ = writeln!(out, "{}", report.summary);
    out
}
