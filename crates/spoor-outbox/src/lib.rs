//! Durable event queue and delivery loop for the spoor SDK.
//!
//! This crate is the reliability core: producers hand it fully-formed event
//! records, and it delivers them to the collection endpoint, surviving
//! process restarts, offline periods, and transport failures.
//!
//! - [`EventRecord`]: the unit of work, with the delivery envelope
//! - [`PersistentQueue`]: FIFO queue mirrored between memory and the
//!   durable store on every mutation
//! - [`Dispatcher`]: the public entry point — enqueue, drain, resume on
//!   connectivity
//!
//! A record is persisted before any send is attempted, removed only on a
//! delivery success, and retried opportunistically on the next trigger (a
//! new enqueue, a connectivity signal, or an explicit `run`). Delivery
//! failures never propagate to producers; the optional completion hook is
//! the only producer-visible signal.

mod dispatcher;
mod queue;
mod record;

pub use dispatcher::{Dispatcher, QUEUE_STORAGE_KEY};
pub use queue::PersistentQueue;
pub use record::{CompletionHook, EventRecord, MAX_OFFSET_MS, MIN_OFFSET_MS};
