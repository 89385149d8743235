//! Single-slot key-value store holding the latest published snapshot.
//!
//! Writers replace the whole snapshot (last write wins, no merge, no version
//! check). Readers get an owned copy. A store that was never written to reads
//! as `{ "resultados": [] }`; only backend failures are errors.

pub mod memory;
pub mod remote;
pub mod sqlite;

pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::results::Snapshot;

/// Trait every snapshot backend implements.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    /// Latest published snapshot, or the empty snapshot if none exists yet.
    async fn get(&self) -> Result<Snapshot, StoreError>;

    /// Replace the published snapshot wholesale.
    async fn put(&self, snapshot: Snapshot) -> Result<(), StoreError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Shape-check an untrusted JSON payload, then publish it. A payload that
/// fails validation never reaches the backend.
pub async fn put_json(store: &dyn ResultsStore, body: &[u8]) -> Result<(), StoreError> {
    let snapshot = Snapshot::from_json(body)?;
    store.put(snapshot).await
}
