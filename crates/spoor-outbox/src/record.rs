//! Event records and the delivery envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use spoor_core::Config;
use spoor_transport::TransportOutcome;
use std::fmt;
use std::sync::Arc;

/// Offsets at or below this are noise and reported as 0.
pub const MIN_OFFSET_MS: i64 = 1_000;

/// Offsets at or above this (31 days) indicate clock skew or a corrupted
/// timestamp and are reported as 0.
pub const MAX_OFFSET_MS: i64 = 31 * 24 * 60 * 60 * 1_000;

/// Hook invoked once per delivery attempt with the raw transport outcome,
/// regardless of success or failure. Never persisted.
pub type CompletionHook = Arc<dyn Fn(&TransportOutcome) + Send + Sync>;

/// One unit of telemetry data enqueued for delivery.
#[derive(Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Producer-assigned correlation id, unique per record.
    pub id: String,
    /// Classification, uninterpreted by the core.
    pub category: String,
    /// Classification, uninterpreted by the core.
    pub action: String,
    /// Producer/session sequence number; payload metadata only, never used
    /// for ordering.
    #[serde(default)]
    pub counter: u64,
    /// Epoch milliseconds at enqueue time. Stamped by the dispatcher;
    /// producer-supplied values are overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<i64>,
    /// Open semantic payload. Producer keys win over injected envelope
    /// defaults.
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Optional completion hook. Excluded from persistence and from the
    /// wire form; dropped when the queue is re-read from storage.
    #[serde(skip)]
    pub completion_hook: Option<CompletionHook>,
}

impl EventRecord {
    /// Create a record with the minimum producer-supplied fields.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            action: action.into(),
            counter: 0,
            queue_time: None,
            meta: Map::new(),
            completion_hook: None,
        }
    }

    /// Set the session sequence number.
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    /// Add a semantic payload entry.
    pub fn with_meta_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Attach a completion hook.
    pub fn with_completion_hook(
        mut self,
        hook: impl Fn(&TransportOutcome) + Send + Sync + 'static,
    ) -> Self {
        self.completion_hook = Some(Arc::new(hook));
        self
    }

    /// Build the outbound wire payload.
    ///
    /// Envelope fields (`api_key`, `version`, `source`, `id`, `counter`,
    /// `offset`) are injected under `meta`, with producer-supplied meta keys
    /// taking precedence. Internal-only fields (top-level `counter`,
    /// `queue_time`, the hook) are stripped. `offset` is `now - queue_time`
    /// when that lag falls strictly between [`MIN_OFFSET_MS`] and
    /// [`MAX_OFFSET_MS`], otherwise 0.
    pub fn wire_payload(&self, config: &Config, now_ms: i64) -> Value {
        let mut meta = Map::new();
        meta.insert("api_key".to_string(), Value::from(config.api_key.clone()));
        meta.insert("version".to_string(), Value::from(config.version.clone()));
        meta.insert("source".to_string(), Value::from(config.source.clone()));
        meta.insert("id".to_string(), Value::from(self.id.clone()));
        meta.insert("counter".to_string(), Value::from(self.counter));
        meta.insert("offset".to_string(), Value::from(0));

        for (key, value) in &self.meta {
            meta.insert(key.clone(), value.clone());
        }

        if let Some(queue_time) = self.queue_time {
            let lag = now_ms - queue_time;
            if lag > MIN_OFFSET_MS && lag < MAX_OFFSET_MS {
                meta.insert("offset".to_string(), Value::from(lag));
            }
        }

        json!({
            "id": self.id,
            "category": self.category,
            "action": self.action,
            "meta": meta,
        })
    }
}

impl fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("action", &self.action)
            .field("counter", &self.counter)
            .field("queue_time", &self.queue_time)
            .field("meta", &self.meta)
            .field("completion_hook", &self.completion_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api_key: "key-abc".to_string(),
            version: "1.2".to_string(),
            source: "spoor".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_envelope_fields_injected() {
        let record = EventRecord::new("id-1", "page", "view").with_counter(7);
        let payload = record.wire_payload(&test_config(), 1_000_000);

        assert_eq!(payload["id"], "id-1");
        assert_eq!(payload["category"], "page");
        assert_eq!(payload["action"], "view");
        let meta = &payload["meta"];
        assert_eq!(meta["api_key"], "key-abc");
        assert_eq!(meta["version"], "1.2");
        assert_eq!(meta["source"], "spoor");
        assert_eq!(meta["id"], "id-1");
        assert_eq!(meta["counter"], 7);
        assert_eq!(meta["offset"], 0);
        // Internal bookkeeping never reaches the wire.
        assert!(payload.get("counter").is_none());
        assert!(payload.get("queue_time").is_none());
        assert!(payload.get("completion_hook").is_none());
    }

    #[test]
    fn test_producer_meta_wins_over_envelope_defaults() {
        let record = EventRecord::new("id-1", "page", "view")
            .with_meta_entry("source", Value::from("custom-source"))
            .with_meta_entry("url", Value::from("https://example.com/article"));
        let payload = record.wire_payload(&test_config(), 1_000_000);

        assert_eq!(payload["meta"]["source"], "custom-source");
        assert_eq!(payload["meta"]["url"], "https://example.com/article");
        assert_eq!(payload["meta"]["api_key"], "key-abc");
    }

    #[test]
    fn test_offset_bounding() {
        let t0 = 1_700_000_000_000i64;
        let mut record = EventRecord::new("id-1", "page", "view");
        record.queue_time = Some(t0);
        let config = test_config();

        // 500ms of lag is below the floor: reported as 0.
        assert_eq!(record.wire_payload(&config, t0 + 500)["meta"]["offset"], 0);
        // 5s of lag is reported verbatim.
        assert_eq!(
            record.wire_payload(&config, t0 + 5_000)["meta"]["offset"],
            5_000
        );
        // 40 days of lag is beyond the ceiling: reported as 0.
        let forty_days = 40 * 24 * 60 * 60 * 1_000;
        assert_eq!(
            record.wire_payload(&config, t0 + forty_days)["meta"]["offset"],
            0
        );
        // Boundary values are excluded (strictly between).
        assert_eq!(
            record.wire_payload(&config, t0 + MIN_OFFSET_MS)["meta"]["offset"],
            0
        );
        assert_eq!(
            record.wire_payload(&config, t0 + MAX_OFFSET_MS)["meta"]["offset"],
            0
        );
    }

    #[test]
    fn test_unstamped_record_reports_zero_offset() {
        let record = EventRecord::new("id-1", "page", "view");
        let payload = record.wire_payload(&test_config(), 1_000_000);
        assert_eq!(payload["meta"]["offset"], 0);
    }

    #[test]
    fn test_hook_survives_clone_but_not_serialization() {
        let record = EventRecord::new("id-1", "page", "view").with_completion_hook(|_| {});
        let cloned = record.clone();
        assert!(cloned.completion_hook.is_some());

        let raw = serde_json::to_string(&record).unwrap();
        assert!(!raw.contains("completion_hook"));
        let restored: EventRecord = serde_json::from_str(&raw).unwrap();
        assert!(restored.completion_hook.is_none());
        assert_eq!(restored.id, "id-1");
    }
}
