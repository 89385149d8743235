use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ResultsStore;
use crate::error::StoreError;
use crate::results::Snapshot;

/// Process-local store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    slot: Arc<RwLock<Option<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl ResultsStore for MemoryStore {
    async fn get(&self) -> Result<Snapshot, StoreError> {
        let slot = self.slot.read().await;
        debug!("MemoryStore: get (published={})", slot.is_some());
        Ok(slot.clone().unwrap_or_else(Snapshot::empty))
    }

    async fn put(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let count = snapshot.resultados.len();
        *self.slot.write().await = Some(snapshot);
        info!("MemoryStore: snapshot replaced ({} results)", count);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
