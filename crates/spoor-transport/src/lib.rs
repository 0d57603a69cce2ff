//! Transport selection and the uniform send contract.
//!
//! Host environments differ in what they can do for a cross-origin request:
//! some mechanisms carry credentials, custom headers, and an observable
//! status code; others can only fire a POST and report completion. This
//! crate models that as a ranked list of capability variants behind one
//! trait, probed in order per send attempt:
//!
//! 1. [`CorsTransport`] — credentialed, custom headers, observable status
//! 2. [`PlainPostTransport`] — no custom headers, status unobservable
//!    (completion is treated as unconditional success)
//!
//! If no variant is constructible the selector reports unavailable and the
//! caller skips the send attempt entirely.

mod http;
mod plain;
mod selector;

pub use http::CorsTransport;
pub use plain::PlainPostTransport;
pub use selector::{TransportFactory, TransportSelector};

use futures_util::future::BoxFuture;

/// What a transport variant can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Custom request headers (e.g. content-type) are supported.
    pub custom_headers: bool,
    /// The response status code is observable.
    pub observes_status: bool,
    /// Requests carry credentials.
    pub credentialed: bool,
}

/// An outbound request, transport-agnostic.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Serialized body.
    pub body: String,
    /// Requested headers; dropped by variants without header support.
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    /// Build a POST request.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header. Variants that cannot set headers ignore it.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The unified settlement signal of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// The exchange completed with an observable status code.
    Status(u16),
    /// The exchange completed but the mechanism cannot observe a status.
    Completed,
    /// The exchange failed before completing (connect error, timeout).
    Error(String),
}

impl TransportOutcome {
    /// Whether the attempt counts as a delivery.
    ///
    /// An unobservable-status completion is a success by definition: there
    /// is nothing to check.
    pub fn is_success(&self) -> bool {
        match self {
            TransportOutcome::Status(code) => (200..300).contains(code),
            TransportOutcome::Completed => true,
            TransportOutcome::Error(_) => false,
        }
    }
}

/// A constructed send mechanism.
pub trait Transport: Send + Sync {
    /// Capabilities of this variant.
    fn capabilities(&self) -> Capabilities;

    /// Perform the request and settle exactly once.
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, TransportOutcome>;
}
