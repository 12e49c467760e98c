//! Endpoint Resolver: finds a route that answers, or falls back.
//!
//! The probe order is a fixed state machine:
//!
//! | State                             | Request            | 2xx                | 405                             | other status                        | network error  |
//! |-----------------------------------|--------------------|--------------------|---------------------------------|-------------------------------------|----------------|
//! | `TryPrimaryPost`                  | POST primary       | Done(POST primary) | `TryPrimaryGet`                 | `TrySecondaryPostFromOtherStatus`   | `TryPrimaryGet`|
//! | `TryPrimaryGet`                   | GET primary        | Done(GET primary)  | `TrySecondaryPostFromGet405`    | `Fallback`                          | `Fallback`     |
//! | `TrySecondaryPostFromGet405`      | POST secondary     | Done(POST secondary)| `Fallback`                     | `Fallback`                          | `Fallback`     |
//! | `TrySecondaryPostFromOtherStatus` | POST secondary     | Done(POST secondary)| `Fallback`                     | `Fallback`                          | `Fallback`     |
//!
//! Only a 405 earns a second method on the same route. Any other rejection
//! of the primary POST means the route itself is wrong, so GET is skipped;
//! a non-405 rejection of GET ends remote probing without visiting the
//! secondary route.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use spamz_core::classifier::classify_locally;
use spamz_core::config::EndpointConfig;
use spamz_core::metrics::{ResolverCounters, spans};
use spamz_core::{Payload, Resolution, RouteId};

use crate::client::{HttpReply, Route, SpamzClient, Verb};
use crate::decode;
use crate::error::{ClientError, TransportError};
use crate::status::{Status, StatusSink, TracingSink};

const METHOD_NOT_ALLOWED: u16 = 405;

/// What one network call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response.
    Success(HttpReply),
    /// Non-2xx response.
    HttpError(u16),
    /// No response at all.
    NetworkError,
}

impl AttemptOutcome {
    fn is_method_not_allowed(&self) -> bool {
        matches!(self, AttemptOutcome::HttpError(METHOD_NOT_ALLOWED))
    }
}

impl From<Result<HttpReply, TransportError>> for AttemptOutcome {
    fn from(result: Result<HttpReply, TransportError>) -> Self {
        match result {
            Ok(reply) if reply.is_success() => AttemptOutcome::Success(reply),
            Ok(reply) => AttemptOutcome::HttpError(reply.status),
            Err(_) => AttemptOutcome::NetworkError,
        }
    }
}

/// Position in the probe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Step 1: POST to the primary route.
    TryPrimaryPost,
    /// Step 2: GET to the primary route (after a 405 or network error).
    TryPrimaryGet,
    /// Step 3: POST to the secondary route after GET was refused with 405.
    TrySecondaryPostFromGet405,
    /// Step 4: POST to the secondary route after the primary POST failed
    /// with a status other than 405.
    TrySecondaryPostFromOtherStatus,
    /// Remote probing is over; use the local heuristic.
    Fallback,
    /// A route answered.
    Done(RouteId),
}

impl ProbeState {
    /// The request this state issues, if any.
    #[must_use]
    pub fn request(self) -> Option<(Verb, Route)> {
        match self {
            ProbeState::TryPrimaryPost => Some((Verb::Post, Route::Primary)),
            ProbeState::TryPrimaryGet => Some((Verb::Get, Route::Primary)),
            ProbeState::TrySecondaryPostFromGet405
            | ProbeState::TrySecondaryPostFromOtherStatus => Some((Verb::Post, Route::Secondary)),
            ProbeState::Fallback | ProbeState::Done(_) => None,
        }
    }

    /// Route reported when this state's request succeeds.
    fn source(self) -> Option<RouteId> {
        match self {
            ProbeState::TryPrimaryPost => Some(RouteId::PostPrimary),
            ProbeState::TryPrimaryGet => Some(RouteId::GetPrimary),
            ProbeState::TrySecondaryPostFromGet405
            | ProbeState::TrySecondaryPostFromOtherStatus => Some(RouteId::PostSecondary),
            ProbeState::Fallback | ProbeState::Done(_) => None,
        }
    }

    /// Whether no further request will be issued.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ProbeState::Fallback | ProbeState::Done(_))
    }
}

/// The transition table. Terminal states stay put.
#[must_use]
pub fn transition(state: ProbeState, outcome: &AttemptOutcome) -> ProbeState {
    if state.is_terminal() {
        return state;
    }
    if let AttemptOutcome::Success(_) = outcome {
        return state.source().map_or(ProbeState::Fallback, ProbeState::Done);
    }

    match state {
        ProbeState::TryPrimaryPost => match outcome {
            AttemptOutcome::NetworkError => ProbeState::TryPrimaryGet,
            o if o.is_method_not_allowed() => ProbeState::TryPrimaryGet,
            _ => ProbeState::TrySecondaryPostFromOtherStatus,
        },
        ProbeState::TryPrimaryGet if outcome.is_method_not_allowed() => {
            ProbeState::TrySecondaryPostFromGet405
        }
        _ => ProbeState::Fallback,
    }
}

/// Runs the probe sequence for each payload.
pub struct Resolver {
    client: SpamzClient,
    sink: Arc<dyn StatusSink>,
    counters: Arc<ResolverCounters>,
}

impl Resolver {
    /// Create a resolver that reports status through `tracing`.
    #[must_use]
    pub fn new(client: SpamzClient) -> Self {
        Self {
            client,
            sink: Arc::new(TracingSink),
            counters: Arc::new(ResolverCounters::new()),
        }
    }

    /// Create a resolver straight from endpoint configuration.
    #[must_use]
    pub fn from_config(endpoint: EndpointConfig) -> Self {
        Self::new(SpamzClient::new(endpoint))
    }

    /// Send status messages to `sink` instead.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share counters with other resolvers or an exporter.
    #[must_use]
    pub fn with_counters(mut self, counters: Arc<ResolverCounters>) -> Self {
        self.counters = counters;
        self
    }

    /// Outcome counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<ResolverCounters> {
        &self.counters
    }

    /// Classify `payload`, remotely if any route answers.
    ///
    /// Never fails: every error ends in the local heuristic with source
    /// [`RouteId::LocalFallback`].
    pub async fn resolve(&self, payload: &Payload) -> Resolution {
        self.counters.resolutions.fetch_add(1, Ordering::Relaxed);
        let span = info_span!(spans::RESOLVE, base_url = %self.client.endpoint().base_url);

        let resolution = match self.run(payload).instrument(span).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Resolution aborted");
                self.notify(Status::error(format!(
                    "Unexpected failure ({e}). Falling back to local heuristic."
                )));
                Resolution::local(classify_locally(payload))
            }
        };

        self.counters.record_source(resolution.source);
        info!(source = %resolution.source, label = %resolution.data.label, "Resolved");
        resolution
    }

    async fn run(&self, payload: &Payload) -> Result<Resolution, ClientError> {
        let mut state = ProbeState::TryPrimaryPost;
        self.notify(Status::info(format!(
            "Attempting {}...",
            self.client.describe(Verb::Post, Route::Primary)
        )));

        while let Some((verb, route)) = state.request() {
            let outcome = self.attempt(verb, route, payload).await?;
            let next = transition(state, &outcome);
            self.announce(state, &outcome, next);

            if let (ProbeState::Done(source), AttemptOutcome::Success(reply)) = (next, outcome) {
                let raw = self.decode(&reply);
                return Ok(Resolution::remote(source, raw));
            }
            state = next;
        }

        Ok(Resolution::local(classify_locally(payload)))
    }

    async fn attempt(
        &self,
        verb: Verb,
        route: Route,
        payload: &Payload,
    ) -> Result<AttemptOutcome, ClientError> {
        let target = self.client.describe(verb, route);
        let span = info_span!(spans::ATTEMPT, request = %target);
        let result = self.client.send(verb, route, payload).instrument(span).await?;
        let outcome = AttemptOutcome::from(result);

        match &outcome {
            AttemptOutcome::Success(reply) => debug!(request = %target, status = reply.status, "Attempt succeeded"),
            AttemptOutcome::HttpError(status) => {
                self.counters.http_errors.fetch_add(1, Ordering::Relaxed);
                warn!(request = %target, status, "Attempt rejected");
            }
            AttemptOutcome::NetworkError => {
                self.counters.network_errors.fetch_add(1, Ordering::Relaxed);
                warn!(request = %target, "Attempt failed in transport");
            }
        }
        Ok(outcome)
    }

    fn decode(&self, reply: &HttpReply) -> Value {
        decode::decode_strict(reply.content_type.as_deref(), &reply.body).unwrap_or_else(|e| {
            self.counters.decode_fallbacks.fetch_add(1, Ordering::Relaxed);
            debug!(error = %e, "Undecodable body; using empty object");
            decode::empty_object()
        })
    }

    /// Emit the status message for one transition.
    fn announce(&self, from: ProbeState, outcome: &AttemptOutcome, to: ProbeState) {
        let Some((verb, route)) = from.request() else {
            return;
        };
        let tried = self.client.describe(verb, route);
        let next = to
            .request()
            .map(|(v, r)| self.client.describe(v, r))
            .unwrap_or_default();

        let status = match (outcome, to) {
            (AttemptOutcome::Success(_), _) => Status::info(format!("{tried} succeeded")),
            (_, ProbeState::Fallback) => match (from, outcome) {
                (ProbeState::TryPrimaryGet, AttemptOutcome::HttpError(code)) => Status::warn(
                    format!("{tried} failed with status {code}. Falling back to local."),
                ),
                (ProbeState::TryPrimaryGet, _) => {
                    Status::error(format!("{tried} failed (network). Falling back to local."))
                }
                _ => Status::error("All network attempts failed. Falling back to local heuristic."),
            },
            (AttemptOutcome::HttpError(METHOD_NOT_ALLOWED), _) => {
                Status::warn(format!("{tried} returned 405 - trying {next}..."))
            }
            (AttemptOutcome::HttpError(code), _) => {
                Status::warn(format!("{tried} failed with status {code}. Trying {next}..."))
            }
            (AttemptOutcome::NetworkError, _) => {
                Status::warn(format!("{tried} failed (network) - trying {next}..."))
            }
        };
        self.notify(status);
    }

    fn notify(&self, status: Status) {
        self.sink.notify(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> AttemptOutcome {
        AttemptOutcome::Success(HttpReply::new(200, Some("application/json"), b"{}".to_vec()))
    }

    fn status(code: u16) -> AttemptOutcome {
        AttemptOutcome::HttpError(code)
    }

    const NET: AttemptOutcome = AttemptOutcome::NetworkError;

    // Step 1

    #[test]
    fn primary_post_success_is_done() {
        assert_eq!(
            transition(ProbeState::TryPrimaryPost, &ok()),
            ProbeState::Done(RouteId::PostPrimary)
        );
    }

    #[test]
    fn primary_post_405_tries_get() {
        assert_eq!(transition(ProbeState::TryPrimaryPost, &status(405)), ProbeState::TryPrimaryGet);
    }

    #[test]
    fn primary_post_network_error_tries_get() {
        assert_eq!(transition(ProbeState::TryPrimaryPost, &NET), ProbeState::TryPrimaryGet);
    }

    #[test]
    fn primary_post_other_status_skips_get() {
        for code in [400, 404, 500, 503] {
            assert_eq!(
                transition(ProbeState::TryPrimaryPost, &status(code)),
                ProbeState::TrySecondaryPostFromOtherStatus,
                "status {code}"
            );
        }
    }

    // Step 2

    #[test]
    fn primary_get_success_is_done() {
        assert_eq!(
            transition(ProbeState::TryPrimaryGet, &ok()),
            ProbeState::Done(RouteId::GetPrimary)
        );
    }

    #[test]
    fn primary_get_405_tries_secondary() {
        assert_eq!(
            transition(ProbeState::TryPrimaryGet, &status(405)),
            ProbeState::TrySecondaryPostFromGet405
        );
    }

    #[test]
    fn primary_get_other_failure_falls_back_without_secondary() {
        // Unlike step 1, a non-405 here does not visit the secondary route.
        assert_eq!(transition(ProbeState::TryPrimaryGet, &status(500)), ProbeState::Fallback);
        assert_eq!(transition(ProbeState::TryPrimaryGet, &NET), ProbeState::Fallback);
    }

    // Steps 3 and 4

    #[test]
    fn secondary_success_is_done() {
        for state in [
            ProbeState::TrySecondaryPostFromGet405,
            ProbeState::TrySecondaryPostFromOtherStatus,
        ] {
            assert_eq!(transition(state, &ok()), ProbeState::Done(RouteId::PostSecondary));
        }
    }

    #[test]
    fn secondary_failure_falls_back() {
        for state in [
            ProbeState::TrySecondaryPostFromGet405,
            ProbeState::TrySecondaryPostFromOtherStatus,
        ] {
            for outcome in [status(405), status(500), NET] {
                assert_eq!(transition(state, &outcome), ProbeState::Fallback);
            }
        }
    }

    // Terminal states

    #[test]
    fn terminal_states_are_sticky() {
        assert_eq!(transition(ProbeState::Fallback, &ok()), ProbeState::Fallback);
        let done = ProbeState::Done(RouteId::GetPrimary);
        assert_eq!(transition(done, &status(500)), done);
        assert!(ProbeState::Fallback.request().is_none());
        assert!(done.request().is_none());
    }

    #[test]
    fn requests_per_state() {
        assert_eq!(ProbeState::TryPrimaryPost.request(), Some((Verb::Post, Route::Primary)));
        assert_eq!(ProbeState::TryPrimaryGet.request(), Some((Verb::Get, Route::Primary)));
        assert_eq!(
            ProbeState::TrySecondaryPostFromGet405.request(),
            Some((Verb::Post, Route::Secondary))
        );
        assert_eq!(
            ProbeState::TrySecondaryPostFromOtherStatus.request(),
            Some((Verb::Post, Route::Secondary))
        );
    }

    #[test]
    fn outcome_from_transport_result() {
        let ok_reply = Ok(HttpReply::new(201, None, Vec::new()));
        assert!(matches!(AttemptOutcome::from(ok_reply), AttemptOutcome::Success(_)));
        let rejected = Ok(HttpReply::new(405, None, Vec::new()));
        assert_eq!(AttemptOutcome::from(rejected), AttemptOutcome::HttpError(405));
        let failed = Err(TransportError("connection refused".into()));
        assert_eq!(AttemptOutcome::from(failed), AttemptOutcome::NetworkError);
    }

    #[tokio::test]
    async fn invalid_base_url_falls_back_locally() {
        use crate::status::{RecordingSink, StatusLevel};

        let sink = Arc::new(RecordingSink::new());
        let resolver = Resolver::from_config(EndpointConfig::default().with_base_url("::not a url::"))
            .with_sink(sink.clone());

        let res = resolver.resolve(&Payload::demo()).await;
        assert_eq!(res.source, RouteId::LocalFallback);
        assert_eq!(res.data.label, spamz_core::Label::Spam);
        assert_eq!(sink.last().unwrap().level, StatusLevel::Error);
        assert_eq!(resolver.counters().snapshot().answered_by(RouteId::LocalFallback), 1);
    }
}
