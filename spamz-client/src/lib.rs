//! # spamz-client: Endpoint Discovery for SPAMZ
//!
//! Submits a [`Payload`](spamz_core::Payload) to a remote classification
//! service and always comes back with an answer:
//!
//! ```text
//! POST primary ──405/network──▶ GET primary ──405──▶ POST secondary
//!      │                            │                      │
//!      └──other non-2xx──▶ POST secondary      other ──────┴──▶ local heuristic
//! ```
//!
//! Any failure along the way (transport, status, undecodable body, bad
//! route) degrades to the keyword heuristic in `spamz_core::classifier`.
//! Progress is reported through a [`StatusSink`]; it never steers the
//! cascade.

pub mod client;
pub mod decode;
pub mod error;
pub mod probe;
pub mod resolver;
pub mod session;
pub mod status;

pub use client::{HttpReply, Route, SpamzClient, Verb};
pub use error::{ClientError, TransportError};
pub use resolver::{AttemptOutcome, ProbeState, Resolver};
pub use session::Session;
pub use status::{RecordingSink, Status, StatusLevel, StatusSink, TracingSink};
