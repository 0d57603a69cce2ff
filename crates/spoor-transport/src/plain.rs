//! Header-less cross-origin POST transport.

use crate::{Capabilities, Transport, TransportOutcome, TransportRequest};
use futures_util::future::BoxFuture;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// Request timeout.
const TIMEOUT_SECS: u64 = 30;

/// Fallback transport for environments whose cross-origin mechanism cannot
/// set custom headers or observe a status code.
///
/// Completion only signals that the exchange finished, so any completed
/// exchange is reported as [`TransportOutcome::Completed`] — unconditional
/// success. Requested headers are dropped.
pub struct PlainPostTransport {
    client: Client,
}

impl PlainPostTransport {
    /// Probe for availability.
    pub fn probe() -> Option<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .ok()?;
        Some(Self { client })
    }
}

impl Transport for PlainPostTransport {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            custom_headers: false,
            observes_status: false,
            credentialed: false,
        }
    }

    fn send(&self, request: TransportRequest) -> BoxFuture<'_, TransportOutcome> {
        Box::pin(async move {
            let method =
                Method::from_bytes(request.method.as_bytes()).unwrap_or(Method::POST);

            // Headers are not supported on this tier.
            let result = self
                .client
                .request(method, &request.url)
                .body(request.body)
                .send()
                .await;

            match result {
                Ok(_) => {
                    debug!(url = %request.url, "Request completed, status unobservable");
                    TransportOutcome::Completed
                }
                Err(error) => {
                    debug!(url = %request.url, %error, "Request failed");
                    TransportOutcome::Error(error.to_string())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let transport = PlainPostTransport::probe().unwrap();
        let caps = transport.capabilities();
        assert!(!caps.custom_headers);
        assert!(!caps.observes_status);
    }

    #[tokio::test]
    async fn test_unreachable_host_settles_with_error() {
        let transport = PlainPostTransport::probe().unwrap();
        let outcome = transport
            .send(TransportRequest::post("http://127.0.0.1:1/events", "{}"))
            .await;
        assert!(matches!(outcome, TransportOutcome::Error(_)));
    }
}
