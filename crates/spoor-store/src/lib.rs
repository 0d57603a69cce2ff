//! Durable key-value storage for the spoor SDK.
//!
//! This crate provides the persistence facility the event queue survives
//! reloads with:
//! - **FileStore**: a single JSON file on disk, flushed synchronously
//! - **MemoryStore**: process-lifetime storage, also the degradation target
//!   when the file store cannot be constructed

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use spoor_core::Paths;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Open the durable store for the SDK.
///
/// Tries the file-backed store first. If it cannot be constructed (directory
/// not writable, disk full, malformed existing file that cannot be replaced),
/// degrades to an in-memory store: the queue keeps working for the current
/// process lifetime but forfeits cross-restart durability. The degradation
/// is never surfaced to producers.
pub fn open_store(paths: &Paths) -> Arc<dyn KeyValueStore> {
    match FileStore::open(paths.store_file()) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            warn!(%error, "Durable store unavailable, continuing in memory only");
            Arc::new(MemoryStore::new())
        }
    }
}
