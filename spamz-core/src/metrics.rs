//! Runtime Metrics
//!
//! Lock-free counters for resolution outcomes, plus the span names the
//! client uses with `tracing`. Counters are bumped on the request path and
//! read on export.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::RouteId;

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Atomic counters for resolver events.
pub struct ResolverCounters {
    /// Resolutions started.
    pub resolutions: AtomicU64,
    /// Answered by `POST primary`.
    pub post_primary: AtomicU64,
    /// Answered by `GET primary`.
    pub get_primary: AtomicU64,
    /// Answered by `POST secondary`.
    pub post_secondary: AtomicU64,
    /// Answered by the local heuristic.
    pub local_fallback: AtomicU64,
    /// Attempts that returned a non-2xx status.
    pub http_errors: AtomicU64,
    /// Attempts that never produced a response.
    pub network_errors: AtomicU64,
    /// 2xx bodies that could not be decoded and were treated as `{}`.
    pub decode_fallbacks: AtomicU64,
}

impl ResolverCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolutions: AtomicU64::new(0),
            post_primary: AtomicU64::new(0),
            get_primary: AtomicU64::new(0),
            post_secondary: AtomicU64::new(0),
            local_fallback: AtomicU64::new(0),
            http_errors: AtomicU64::new(0),
            network_errors: AtomicU64::new(0),
            decode_fallbacks: AtomicU64::new(0),
        }
    }

    /// Count a finished resolution against the route that produced it.
    pub fn record_source(&self, source: RouteId) {
        let counter = match source {
            RouteId::PostPrimary => &self.post_primary,
            RouteId::GetPrimary => &self.get_primary,
            RouteId::PostSecondary => &self.post_secondary,
            RouteId::LocalFallback => &self.local_fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            by_source: [
                self.post_primary.load(Ordering::Relaxed),
                self.get_primary.load(Ordering::Relaxed),
                self.post_secondary.load(Ordering::Relaxed),
                self.local_fallback.load(Ordering::Relaxed),
            ],
            http_errors: self.http_errors.load(Ordering::Relaxed),
            network_errors: self.network_errors.load(Ordering::Relaxed),
            decode_fallbacks: self.decode_fallbacks.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResolverCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Resolutions started.
    pub resolutions: u64,
    /// Answers by source, in [`RouteId`] declaration order.
    pub by_source: [u64; 4],
    /// Non-2xx attempts.
    pub http_errors: u64,
    /// Transport failures.
    pub network_errors: u64,
    /// Undecodable 2xx bodies.
    pub decode_fallbacks: u64,
}

impl CounterSnapshot {
    /// Answers produced by `source`.
    #[must_use]
    pub fn answered_by(&self, source: RouteId) -> u64 {
        match source {
            RouteId::PostPrimary => self.by_source[0],
            RouteId::GetPrimary => self.by_source[1],
            RouteId::PostSecondary => self.by_source[2],
            RouteId::LocalFallback => self.by_source[3],
        }
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP spamz_resolutions_total Resolutions started\n\
             # TYPE spamz_resolutions_total counter\n\
             spamz_resolutions_total {}\n\
             # HELP spamz_answers_total Resolutions by answering route\n\
             # TYPE spamz_answers_total counter\n\
             spamz_answers_total{{source=\"POST primary\"}} {}\n\
             spamz_answers_total{{source=\"GET primary\"}} {}\n\
             spamz_answers_total{{source=\"POST secondary\"}} {}\n\
             spamz_answers_total{{source=\"local_fallback\"}} {}\n\
             # HELP spamz_http_errors_total Attempts answered with a non-2xx status\n\
             # TYPE spamz_http_errors_total counter\n\
             spamz_http_errors_total {}\n\
             # HELP spamz_network_errors_total Attempts that failed in transport\n\
             # TYPE spamz_network_errors_total counter\n\
             spamz_network_errors_total {}\n\
             # HELP spamz_decode_fallbacks_total Bodies treated as empty objects\n\
             # TYPE spamz_decode_fallbacks_total counter\n\
             spamz_decode_fallbacks_total {}\n",
            self.resolutions,
            self.by_source[0],
            self.by_source[1],
            self.by_source[2],
            self.by_source[3],
            self.http_errors,
            self.network_errors,
            self.decode_fallbacks,
        )
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One full resolution.
    pub const RESOLVE: &str = "spamz::resolve";
    /// A single HTTP attempt.
    pub const ATTEMPT: &str = "spamz::attempt";
    /// Backend diagnosis.
    pub const DIAGNOSE: &str = "spamz::diagnose";
    /// OPTIONS reachability probe.
    pub const PROBE: &str = "spamz::probe";
}
