//! Credentialed HTTP transport.

use crate::{Capabilities, Transport, TransportOutcome, TransportRequest};
use futures_util::future::BoxFuture;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// Request timeout.
const TIMEOUT_SECS: u64 = 30;

/// The preferred transport: credentialed requests with custom headers and an
/// observable status code.
pub struct CorsTransport {
    client: Client,
}

impl CorsTransport {
    /// Probe for availability. Returns `None` when the client cannot be
    /// constructed in this environment (e.g. no usable TLS backend).
    pub fn probe() -> Option<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .ok()?;
        Some(Self { client })
    }
}

impl Transport for CorsTransport {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            custom_headers: true,
            observes_status: true,
            credentialed: true,
        }
    }

    fn send(&self, request: TransportRequest) -> BoxFuture<'_, TransportOutcome> {
        Box::pin(async move {
            let method =
                Method::from_bytes(request.method.as_bytes()).unwrap_or(Method::POST);

            let mut builder = self
                .client
                .request(method, &request.url)
                .body(request.body);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!(url = %request.url, status, "Request settled");
                    TransportOutcome::Status(status)
                }
                Err(error) => {
                    debug!(url = %request.url, %error, "Request failed");
                    TransportOutcome::Error(error.to_string())
                }
            }
        })
    }
}
