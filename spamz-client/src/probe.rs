//! Backend diagnostics.
//!
//! Two advisory checks that sit beside resolution and never influence it:
//! an `OPTIONS` reachability probe of the primary route, and a diagnosis
//! that walks every route with a canned sample to show which ones answer.

use serde::Serialize;
use tracing::{Instrument, info, info_span};

use spamz_core::metrics::spans;
use spamz_core::{Payload, RouteId};

use crate::client::{HttpReply, Route, SpamzClient, Verb};
use crate::decode;
use crate::error::ClientError;
use crate::status::{Status, StatusSink};

const BAD_REQUEST: u16 = 400;

/// Issue `OPTIONS` to the primary route and describe what came back.
pub async fn check_reachability(client: &SpamzClient, sink: &dyn StatusSink) -> Status {
    let path = client.route_path(Route::Primary).to_string();
    let span = info_span!(spans::PROBE, route = %path);

    let result = client
        .send(Verb::Options, Route::Primary, &Payload::default())
        .instrument(span)
        .await;

    let status = match result {
        Ok(Ok(reply)) if reply.is_success() => {
            Status::info(format!("Backend {path} exists (OPTIONS ok)"))
        }
        Ok(Ok(reply)) if reply.status == BAD_REQUEST => {
            Status::warn("Backend reachable - OPTIONS returned 400 (server may not allow OPTIONS)")
        }
        Ok(Ok(reply)) => Status::warn(format!("{path} exists but OPTIONS returned {}", reply.status)),
        Ok(Err(_)) | Err(_) => Status::warn(format!("Unable to reach {path}")),
    };
    sink.notify(&status);
    status
}

/// One route tried during diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
    /// Which probe.
    pub route: RouteId,
    /// "METHOD /path".
    pub request: String,
    /// Status code, or `None` when no response arrived.
    pub status: Option<u16>,
}

/// Result of [`diagnose_backend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendReport {
    /// Attempts in the order they were made.
    pub attempts: Vec<AttemptReport>,
    /// First route that answered 2xx, if any.
    pub working: Option<RouteId>,
    /// That route's body: compact JSON if it decoded, raw text otherwise.
    pub body: Option<String>,
    /// Final status line.
    pub summary: Status,
}

impl BackendReport {
    /// Whether any route answered.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.working.is_some()
    }
}

const DIAGNOSIS_ORDER: [(RouteId, Verb, Route); 3] = [
    (RouteId::PostPrimary, Verb::Post, Route::Primary),
    (RouteId::GetPrimary, Verb::Get, Route::Primary),
    (RouteId::PostSecondary, Verb::Post, Route::Secondary),
];

/// Try POST primary, GET primary and POST secondary in turn with
/// [`Payload::diagnostic`], stopping at the first 2xx.
///
/// Unlike [`Resolver::resolve`](crate::Resolver::resolve) every route is
/// tried whatever the previous status was; a 405 only adds a warning.
pub async fn diagnose_backend(client: &SpamzClient, sink: &dyn StatusSink) -> BackendReport {
    sink.notify(&Status::info("Testing backend endpoints..."));
    let span = info_span!(spans::DIAGNOSE, base_url = %client.endpoint().base_url);

    match diagnose(client, sink).instrument(span).await {
        Ok(report) => report,
        Err(e) => {
            let summary = Status::error(format!("Network error testing backend: {e}"));
            sink.notify(&summary);
            BackendReport {
                attempts: Vec::new(),
                working: None,
                body: None,
                summary,
            }
        }
    }
}

async fn diagnose(client: &SpamzClient, sink: &dyn StatusSink) -> Result<BackendReport, ClientError> {
    let sample = Payload::diagnostic();
    let mut attempts = Vec::with_capacity(DIAGNOSIS_ORDER.len());

    for (source, verb, route) in DIAGNOSIS_ORDER {
        let request = client.describe(verb, route);
        let result = client
            .send(verb, route, &sample)
            .await?
            .map_err(ClientError::from)
            .and_then(HttpReply::error_for_status);

        attempts.push(AttemptReport {
            route: source,
            request: request.clone(),
            status: match &result {
                Ok(reply) => Some(reply.status),
                Err(ClientError::HttpStatus(code)) => Some(*code),
                Err(_) => None,
            },
        });

        match result {
            Ok(reply) => {
                let summary = Status::info(format!("{request} OK (status {})", reply.status));
                sink.notify(&summary);
                info!(request = %request, "Backend route answered");
                return Ok(BackendReport {
                    attempts,
                    working: Some(source),
                    body: Some(decode::display_body(reply.content_type.as_deref(), &reply.body)),
                    summary,
                });
            }
            Err(e) if e.is_method_not_allowed() => {
                let message = match source {
                    RouteId::PostPrimary => {
                        format!("{request} returned 405 - server forbids POST to this route")
                    }
                    _ => format!("{request} returned 405 as well"),
                };
                sink.notify(&Status::warn(message));
            }
            Err(_) => {}
        }
    }

    let summary =
        Status::error("No backend endpoints responded OK. Using local fallback for predictions.");
    sink.notify(&summary);
    Ok(BackendReport {
        attempts,
        working: None,
        body: None,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{RecordingSink, StatusLevel};
    use spamz_core::config::EndpointConfig;

    #[tokio::test]
    async fn bad_base_url_reports_error() {
        let client = SpamzClient::new(EndpointConfig::default().with_base_url("nope"));
        let sink = RecordingSink::new();

        let report = diagnose_backend(&client, &sink).await;
        assert!(!report.is_healthy());
        assert_eq!(report.summary.level, StatusLevel::Error);
        assert!(report.summary.message.contains("Network error testing backend"));
    }

    #[tokio::test]
    async fn bad_base_url_is_unreachable() {
        let client = SpamzClient::new(EndpointConfig::default().with_base_url("nope"));
        let sink = RecordingSink::new();

        let status = check_reachability(&client, &sink).await;
        assert_eq!(status.level, StatusLevel::Warn);
        assert_eq!(status.message, "Unable to reach /predict");
        assert_eq!(sink.messages().len(), 1);
    }
}
