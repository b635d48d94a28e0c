use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ChunkStore;
use crate::domain::{Chunk, DomainError};

#[derive(Default)]
struct Slots {
    /// Insertion sequence -> chunk. Iteration order is insertion order.
    by_seq: BTreeMap<u64, Arc<Chunk>>,
    /// chunk_id -> insertion sequence.
    seq_by_id: HashMap<String, u64>,
    next_seq: u64,
}

/// Reference chunk store held entirely in memory.
///
/// One lock guards all state. Writers validate their batch before taking the lock
/// and apply it without awaiting, so a batch is never half-applied.
pub struct InMemoryChunkStore {
    slots: RwLock<Slots>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
        }
    }
}

impl Default for InMemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<(), DomainError> {
        for chunk in chunks {
            chunk.validate()?;
        }

        let mut slots = self.slots.write().await;
        for chunk in chunks {
            let record = Arc::new(chunk.clone());
            match slots.seq_by_id.get(chunk.chunk_id()).copied() {
                Some(seq) => {
                    slots.by_seq.insert(seq, record);
                }
                None => {
                    let seq = slots.next_seq;
                    slots.next_seq += 1;
                    slots.seq_by_id.insert(chunk.chunk_id().to_string(), seq);
                    slots.by_seq.insert(seq, record);
                }
            }
        }

        debug!("Upserted {} chunks into memory", chunks.len());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Arc<Chunk>>, DomainError> {
        let slots = self.slots.read().await;
        Ok(slots.by_seq.values().cloned().collect())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Arc<Chunk>>, DomainError> {
        let slots = self.slots.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| slots.seq_by_id.get(id))
            .filter_map(|seq| slots.by_seq.get(seq))
            .cloned()
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), DomainError> {
        let mut slots = self.slots.write().await;
        let mut removed = 0usize;
        for id in ids {
            if let Some(seq) = slots.seq_by_id.remove(id) {
                slots.by_seq.remove(&seq);
                removed += 1;
            }
        }

        debug!("Deleted {} of {} requested chunks", removed, ids.len());
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let slots = self.slots.read().await;
        Ok(slots.by_seq.len() as u64)
    }
}
