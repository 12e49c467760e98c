//! HTTP transport for the classification service.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use tracing::{debug, warn};

use spamz_core::config::EndpointConfig;
use spamz_core::Payload;

use crate::error::{ClientError, TransportError};

/// HTTP methods the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Payload as a JSON body.
    Post,
    /// Payload as query parameters, no body.
    Get,
    /// No payload; used for the reachability probe.
    Options,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Verb::Post => Method::POST,
            Verb::Get => Method::GET,
            Verb::Options => Method::OPTIONS,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Post => "POST",
            Verb::Get => "GET",
            Verb::Options => "OPTIONS",
        })
    }
}

/// Which configured route to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `endpoint.primary_route` (default `/predict`).
    Primary,
    /// `endpoint.secondary_route` (default `/api/predict`).
    Secondary,
}

/// A fully received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Status code.
    pub status: u16,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Body bytes. Empty when the body could not be read.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Construct a reply directly (tests, fixtures).
    #[must_use]
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
        }
    }

    /// 2xx?
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx reply into [`ClientError::HttpStatus`].
    ///
    /// # Errors
    /// Returns the status as an error unless it is 2xx.
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::HttpStatus(self.status))
        }
    }
}

/// Thin wrapper over `reqwest` bound to one configured endpoint.
#[derive(Debug, Clone)]
pub struct SpamzClient {
    http: Client,
    endpoint: EndpointConfig,
}

impl SpamzClient {
    /// Create a client for `endpoint`.
    #[must_use]
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    /// The endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// The configured path for `route`.
    #[must_use]
    pub fn route_path(&self, route: Route) -> &str {
        match route {
            Route::Primary => &self.endpoint.primary_route,
            Route::Secondary => &self.endpoint.secondary_route,
        }
    }

    /// Human-readable "METHOD /path".
    #[must_use]
    pub fn describe(&self, verb: Verb, route: Route) -> String {
        format!("{verb} {}", self.route_path(route))
    }

    /// Absolute URL for `route`.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidRoute` if the base URL does not parse or
    /// the route cannot be joined onto it.
    pub fn url_for(&self, route: Route) -> Result<Url, ClientError> {
        let base = Url::parse(&self.endpoint.base_url).map_err(|e| ClientError::InvalidRoute {
            route: self.endpoint.base_url.clone(),
            reason: e.to_string(),
        })?;
        let path = self.route_path(route);
        base.join(path).map_err(|e| ClientError::InvalidRoute {
            route: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Build (but do not send) a request.
    ///
    /// `POST` carries `payload` as JSON, `GET` as query parameters,
    /// `OPTIONS` ignores it.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidRoute` if the URL cannot be built.
    pub fn request(
        &self,
        verb: Verb,
        route: Route,
        payload: &Payload,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.url_for(route)?;
        let mut builder = self.http.request(verb.method(), url);
        builder = match verb {
            Verb::Post => builder.json(payload),
            Verb::Get => builder.query(payload),
            Verb::Options => builder,
        };
        if let Some(ms) = self.endpoint.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        Ok(builder)
    }

    /// Send a built request and read the whole body.
    ///
    /// Any status counts as a reply; only a missing response is an error.
    /// A body that fails mid-read is reported as empty.
    ///
    /// # Errors
    /// Returns `TransportError` if no response arrived.
    pub async fn execute(&self, request: RequestBuilder) -> Result<HttpReply, TransportError> {
        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            let err = TransportError::from(e);
            warn!(error = %err, "Request failed before a response arrived");
            err
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                warn!(status, error = %e, "Failed to read response body; treating as empty");
                Vec::new()
            }
        };

        debug!(
            status,
            content_type = content_type.as_deref().unwrap_or(""),
            bytes = body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Received response"
        );

        Ok(HttpReply {
            status,
            content_type,
            body,
        })
    }

    /// Build and send in one step.
    ///
    /// The outer error is a local problem (bad URL); the inner one is the
    /// network's.
    ///
    /// # Errors
    /// Returns `ClientError::InvalidRoute` if the request cannot be built.
    pub async fn send(
        &self,
        verb: Verb,
        route: Route,
        payload: &Payload,
    ) -> Result<Result<HttpReply, TransportError>, ClientError> {
        let request = self.request(verb, route, payload)?;
        Ok(self.execute(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SpamzClient {
        SpamzClient::new(EndpointConfig::default().with_base_url(base))
    }

    #[test]
    fn urls_join_routes_onto_base() {
        let c = client("http://localhost:8000");
        assert_eq!(c.url_for(Route::Primary).unwrap().as_str(), "http://localhost:8000/predict");
        assert_eq!(
            c.url_for(Route::Secondary).unwrap().as_str(),
            "http://localhost:8000/api/predict"
        );
    }

    #[test]
    fn invalid_base_url_is_invalid_route() {
        let err = client("not a url").url_for(Route::Primary).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRoute { .. }));
    }

    #[test]
    fn describe_uses_configured_paths() {
        let c = client("http://localhost:8000");
        assert_eq!(c.describe(Verb::Post, Route::Primary), "POST /predict");
        assert_eq!(c.describe(Verb::Get, Route::Primary), "GET /predict");
        assert_eq!(c.describe(Verb::Post, Route::Secondary), "POST /api/predict");
    }

    #[test]
    fn get_request_encodes_payload_as_query() {
        let c = client("http://localhost:8000");
        let req = c
            .request(Verb::Get, Route::Primary, &Payload::new("hi there", "a@b.c", ""))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.url().query(), Some("subject=hi+there&sender=a%40b.c&text="));
        assert!(req.body().is_none());
    }

    #[test]
    fn post_request_carries_json_body() {
        let c = client("http://localhost:8000");
        let req = c
            .request(Verb::Post, Route::Secondary, &Payload::new("s", "f", "t"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(
            req.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
            "application/json"
        );
        let body = req.body().unwrap().as_bytes().unwrap();
        let v: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(v, serde_json::json!({"subject": "s", "sender": "f", "text": "t"}));
    }

    #[test]
    fn reply_status_classification() {
        assert!(HttpReply::new(204, None, Vec::new()).is_success());
        assert!(!HttpReply::new(405, None, Vec::new()).is_success());
        let err = HttpReply::new(405, None, Vec::new()).error_for_status().unwrap_err();
        assert!(err.is_method_not_allowed());
    }
}
