//! Persistent FIFO queue of pending event records.

use crate::EventRecord;
use spoor_store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered queue of pending records, mirrored between memory and the
/// durable store.
///
/// Every mutation flushes to storage synchronously before returning. If the
/// store rejects a write the queue keeps operating in memory only; producers
/// never see the failure. Absent or malformed persisted state deserializes
/// to an empty queue.
pub struct PersistentQueue {
    key: String,
    store: Arc<dyn KeyValueStore>,
    records: Vec<EventRecord>,
}

impl PersistentQueue {
    /// Construct the queue, loading any records persisted under `key`.
    pub fn new(key: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        let key = key.into();

        let records = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<EventRecord>>(&raw) {
                Ok(records) => {
                    debug!(key = %key, count = records.len(), "Loaded persisted queue");
                    records
                }
                Err(error) => {
                    warn!(key = %key, %error, "Malformed persisted queue, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(key = %key, %error, "Durable store unreadable, starting empty");
                Vec::new()
            }
        };

        Self {
            key,
            store,
            records,
        }
    }

    /// Append a record at the tail and persist.
    pub fn add(&mut self, record: EventRecord) -> &mut Self {
        self.records.push(record);
        self.save();
        self
    }

    /// The oldest record, without removing it.
    pub fn first(&self) -> Option<EventRecord> {
        self.records.first().cloned()
    }

    /// A snapshot of all records in order. Mutating the snapshot does not
    /// affect the queue until written back with [`replace`](Self::replace).
    pub fn all(&self) -> Vec<EventRecord> {
        self.records.clone()
    }

    /// Overwrite the entire ordered contents and persist.
    pub fn replace(&mut self, records: Vec<EventRecord>) -> &mut Self {
        self.records = records;
        self.save();
        self
    }

    /// Serialize the in-memory contents to the durable store.
    ///
    /// A store failure degrades to in-memory-only operation for the current
    /// process lifetime; it is logged but never raised.
    pub fn save(&self) {
        let raw = match serde_json::to_string(&self.records) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key = %self.key, %error, "Could not serialize queue");
                return;
            }
        };

        if let Err(error) = self.store.set(&self.key, &raw) {
            warn!(key = %self.key, %error, "Could not persist queue, continuing in memory");
        }
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoor_store::{MemoryStore, StoreError, StoreResult};

    fn record(id: &str) -> EventRecord {
        EventRecord::new(id, "page", "view")
    }

    fn ids(records: &[EventRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_add_preserves_fifo_order() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = PersistentQueue::new("q", store);

        queue.add(record("a")).add(record("b")).add(record("c"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.first().unwrap().id, "a");
        assert_eq!(ids(&queue.all()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_first_does_not_remove() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = PersistentQueue::new("q", store);
        queue.add(record("a"));

        assert_eq!(queue.first().unwrap().id, "a");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = PersistentQueue::new("q", store);
        queue.add(record("a")).add(record("b"));

        let mut snapshot = queue.all();
        snapshot.remove(0);
        assert_eq!(queue.len(), 2);

        queue.replace(snapshot);
        assert_eq!(ids(&queue.all()), vec!["b"]);
    }

    #[test]
    fn test_mid_queue_removal_keeps_order() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = PersistentQueue::new("q", store);
        queue.add(record("a")).add(record("b")).add(record("c"));

        let mut snapshot = queue.all();
        snapshot.retain(|r| r.id != "b");
        queue.replace(snapshot);

        assert_eq!(ids(&queue.all()), vec!["a", "c"]);
    }

    #[test]
    fn test_durability_round_trip() {
        let store = Arc::new(MemoryStore::new());

        let mut queue = PersistentQueue::new("q", store.clone());
        queue.add(record("a")).add(record("b"));
        drop(queue);

        let reloaded = PersistentQueue::new("q", store);
        assert_eq!(ids(&reloaded.all()), vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_persisted_state_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("q", "certainly not json").unwrap();

        let queue = PersistentQueue::new("q", store);
        assert!(queue.is_empty());
        assert!(queue.first().is_none());
    }

    #[test]
    fn test_absent_persisted_state_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        let queue = PersistentQueue::new("q", store);
        assert!(queue.is_empty());
    }

    /// Store that accepts reads but rejects every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("store disabled")))
        }

        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        fn delete(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_write_failure_degrades_silently() {
        let store = Arc::new(ReadOnlyStore);
        let mut queue = PersistentQueue::new("q", store);

        // Mutations still work for the current process lifetime.
        queue.add(record("a")).add(record("b"));
        assert_eq!(ids(&queue.all()), vec!["a", "b"]);

        queue.replace(vec![record("c")]);
        assert_eq!(ids(&queue.all()), vec!["c"]);
    }
}
