//! The dispatcher: public entry point and delivery loop.

use crate::{EventRecord, PersistentQueue};
use chrono::Utc;
use spoor_core::Config;
use spoor_store::KeyValueStore;
use spoor_transport::{TransportRequest, TransportSelector};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// Namespace key the queue persists under.
pub const QUEUE_STORAGE_KEY: &str = "spoor.requests";

/// Owns the persistent queue and the in-flight set, and drives delivery.
///
/// One instance per process context. Producers only ever call
/// [`add`](Self::add) / [`add_and_run`](Self::add_and_run); delivery
/// failures are absorbed here and retried on the next trigger.
pub struct Dispatcher {
    config: Config,
    endpoint: String,
    queue: Mutex<PersistentQueue>,
    /// Ids currently mid-delivery. Never persisted: a record left dangling
    /// by a dead process is simply eligible again after restart.
    in_flight: Mutex<HashSet<String>>,
    selector: TransportSelector,
}

impl Dispatcher {
    /// Construct a dispatcher over the given store and transport ranking.
    ///
    /// Loads any records persisted by a previous session and applies the
    /// configured endpoint override.
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>, selector: TransportSelector) -> Self {
        let endpoint = config.endpoint().to_string();
        Self {
            queue: Mutex::new(PersistentQueue::new(QUEUE_STORAGE_KEY, store)),
            in_flight: Mutex::new(HashSet::new()),
            endpoint,
            config,
            selector,
        }
    }

    /// Construct, wire the connectivity signal, and flush any records
    /// carried over from a prior session.
    pub async fn init(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        selector: TransportSelector,
        online: Option<watch::Receiver<bool>>,
    ) -> Arc<Self> {
        let dispatcher = Arc::new(Self::new(config, store, selector));

        if let Some(receiver) = online {
            dispatcher.clone().spawn_online_listener(receiver);
        }

        dispatcher.run().await;
        dispatcher
    }

    /// Resume the delivery loop whenever the host signals connectivity.
    fn spawn_online_listener(self: Arc<Self>, mut online: watch::Receiver<bool>) {
        tokio::spawn(async move {
            while online.changed().await.is_ok() {
                if *online.borrow() {
                    debug!("Connectivity restored, resuming delivery");
                    self.run().await;
                }
            }
        });
    }

    /// Stamp the enqueue time and append the record to the durable queue.
    pub async fn add(&self, mut record: EventRecord) {
        record.queue_time = Some(Utc::now().timestamp_millis());

        let mut queue = self.queue.lock().await;
        queue.add(record);
        debug!(pending = queue.len(), "Added to queue");
    }

    /// Enqueue a record and immediately attempt delivery.
    pub async fn add_and_run(&self, record: EventRecord) {
        self.add(record).await;
        self.run().await;
    }

    /// Drain the queue, attempting records strictly in FIFO order.
    ///
    /// Stops on exhaustion, on an overlapping drain (the head record is
    /// already in flight), when no transport is available, or on the first
    /// delivery failure. A failed record stays queued and is retried by
    /// whatever calls `run` next; no backoff is scheduled here.
    pub async fn run(&self) {
        loop {
            let next = { self.queue.lock().await.first() };
            let Some(record) = next else { break };

            // Re-entrant overlap: the head record is already being sent by
            // another drain.
            if self.in_flight.lock().await.contains(&record.id) {
                break;
            }

            // No mechanism available: skip the attempt entirely. The record
            // stays queued and is never marked in flight.
            let Some(transport) = self.selector.select() else { break };

            // Check-and-insert is atomic under the set's lock, so at most
            // one drain dispatches a given record.
            if !self.try_mark_started(&record.id).await {
                break;
            }

            let now = Utc::now().timestamp_millis();
            let payload = record.wire_payload(&self.config, now);

            // Both developer and no_send have to be set to stop the request
            // sending. Bookkeeping still runs; the record stays queued since
            // no success was observed.
            if self.config.send_suppressed() {
                debug!(id = %record.id, "Send suppressed");
                self.mark_finished(&record.id).await;
                break;
            }

            let mut request = TransportRequest::post(&self.endpoint, payload.to_string());
            if transport.capabilities().custom_headers {
                request = request.with_header("Content-Type", "application/json");
            }

            debug!(id = %record.id, endpoint = %self.endpoint, "Dispatching");
            let outcome = transport.send(request).await;

            // The hook fires exactly once per attempt, before the
            // success/failure branch and before any queue mutation.
            if let Some(hook) = &record.completion_hook {
                hook(&outcome);
            }

            self.mark_finished(&record.id).await;

            if outcome.is_success() {
                self.remove(&record.id).await;
                debug!(id = %record.id, "Delivered");
            } else {
                warn!(id = %record.id, ?outcome, "Delivery failed, record retained");
                break;
            }
        }
    }

    async fn try_mark_started(&self, id: &str) -> bool {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.insert(id.to_string())
    }

    async fn mark_finished(&self, id: &str) {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.remove(id);
    }

    /// Remove the first queued record with this id and persist.
    async fn remove(&self, id: &str) {
        let mut queue = self.queue.lock().await;
        let mut records = queue.all();
        if let Some(position) = records.iter().position(|r| r.id == id) {
            records.remove(position);
            queue.replace(records);
        }
    }

    /// Snapshot of the pending records, oldest first.
    pub async fn pending(&self) -> Vec<EventRecord> {
        self.queue.lock().await.all()
    }

    /// Number of records currently mid-delivery.
    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}
