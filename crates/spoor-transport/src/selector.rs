//! Ranked transport probing.

use crate::{CorsTransport, PlainPostTransport, Transport};
use std::sync::Arc;
use tracing::{debug, warn};

/// A probe for one transport variant.
pub trait TransportFactory: Send + Sync {
    /// Variant name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Try to construct the variant. `None` means unavailable here.
    fn probe(&self) -> Option<Arc<dyn Transport>>;
}

struct CorsFactory;

impl TransportFactory for CorsFactory {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn probe(&self) -> Option<Arc<dyn Transport>> {
        CorsTransport::probe().map(|t| Arc::new(t) as Arc<dyn Transport>)
    }
}

struct PlainPostFactory;

impl TransportFactory for PlainPostFactory {
    fn name(&self) -> &'static str {
        "plain-post"
    }

    fn probe(&self) -> Option<Arc<dyn Transport>> {
        PlainPostTransport::probe().map(|t| Arc::new(t) as Arc<dyn Transport>)
    }
}

/// Picks the best available transport, once per send attempt.
///
/// Factories are tried in rank order; the first one whose probe succeeds
/// wins. An empty result means no mechanism is available and the send
/// attempt must be skipped.
pub struct TransportSelector {
    factories: Vec<Box<dyn TransportFactory>>,
}

impl TransportSelector {
    /// Selector over a custom ranked factory list.
    pub fn new(factories: Vec<Box<dyn TransportFactory>>) -> Self {
        Self { factories }
    }

    /// Selector over the default ranking: credentialed CORS first, then the
    /// header-less POST fallback.
    pub fn with_defaults() -> Self {
        Self::new(vec![Box::new(CorsFactory), Box::new(PlainPostFactory)])
    }

    /// Probe the ranked list and return the first constructible transport.
    pub fn select(&self) -> Option<Arc<dyn Transport>> {
        for factory in &self.factories {
            if let Some(transport) = factory.probe() {
                debug!(transport = factory.name(), "Selected transport");
                return Some(transport);
            }
        }
        warn!("No transport mechanism available");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Capabilities, TransportOutcome, TransportRequest};
    use futures_util::future::BoxFuture;

    struct StaticTransport(u16);

    impl Transport for StaticTransport {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                custom_headers: true,
                observes_status: true,
                credentialed: false,
            }
        }

        fn send(&self, _request: TransportRequest) -> BoxFuture<'_, TransportOutcome> {
            let status = self.0;
            Box::pin(async move { TransportOutcome::Status(status) })
        }
    }

    struct AlwaysFactory(u16);

    impl TransportFactory for AlwaysFactory {
        fn name(&self) -> &'static str {
            "always"
        }

        fn probe(&self) -> Option<Arc<dyn Transport>> {
            Some(Arc::new(StaticTransport(self.0)))
        }
    }

    struct NeverFactory;

    impl TransportFactory for NeverFactory {
        fn name(&self) -> &'static str {
            "never"
        }

        fn probe(&self) -> Option<Arc<dyn Transport>> {
            None
        }
    }

    #[tokio::test]
    async fn test_first_constructible_wins() {
        let selector = TransportSelector::new(vec![
            Box::new(NeverFactory),
            Box::new(AlwaysFactory(201)),
            Box::new(AlwaysFactory(500)),
        ]);

        let transport = selector.select().unwrap();
        let outcome = transport
            .send(TransportRequest::post("https://example.com", "{}"))
            .await;
        assert_eq!(outcome, TransportOutcome::Status(201));
    }

    #[test]
    fn test_exhausted_ranking_is_unavailable() {
        let selector = TransportSelector::new(vec![Box::new(NeverFactory)]);
        assert!(selector.select().is_none());
    }

    #[test]
    fn test_default_ranking_prefers_cors() {
        let selector = TransportSelector::with_defaults();
        let transport = selector.select().unwrap();
        assert!(transport.capabilities().observes_status);
    }
}
