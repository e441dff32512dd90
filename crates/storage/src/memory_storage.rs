//! In-memory storage backend.
//!
//! Useful for tests and for callers that persist elsewhere. Rollback
//! restores the state captured at the last commit.

use std::collections::{BTreeMap, HashMap};
use chrono::NaiveDate;
use dayblocks_core::{BlockId, DailyProgress, TimeBlock};
use super::{BlockFilter, Storage, Result};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    blocks: HashMap<BlockId, TimeBlock>,
    progress: BTreeMap<NaiveDate, DailyProgress>,
}

/// Map-backed storage with commit/rollback snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    current: Snapshot,
    committed: Snapshot,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.current.blocks.len()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_block(&mut self, block: &TimeBlock) -> Result<()> {
        self.current.blocks.insert(block.id, block.clone());
        Ok(())
    }

    async fn load_block(&self, id: BlockId) -> Result<Option<TimeBlock>> {
        Ok(self.current.blocks.get(&id).cloned())
    }

    async fn list_blocks(&self, filter: &BlockFilter) -> Result<Vec<TimeBlock>> {
        let mut blocks: Vec<TimeBlock> = self
            .current
            .blocks
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(blocks)
    }

    async fn delete_block(&mut self, id: BlockId) -> Result<()> {
        self.current.blocks.remove(&id);
        Ok(())
    }

    async fn save_progress(&mut self, progress: &DailyProgress) -> Result<()> {
        self.current.progress.insert(progress.date, progress.clone());
        Ok(())
    }

    async fn load_progress(&self, date: NaiveDate) -> Result<Option<DailyProgress>> {
        Ok(self.current.progress.get(&date).cloned())
    }

    async fn list_progress(&self) -> Result<Vec<DailyProgress>> {
        Ok(self.current.progress.values().cloned().collect())
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        self.committed = self.current.clone();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.current = self.committed.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn test_rollback_restores_last_commit() {
        let mut storage = MemoryStorage::new();
        let start = Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap();
        let kept = TimeBlock::new("Kept", start, start + Duration::minutes(30));
        storage.save_block(&kept).await.unwrap();
        storage.commit("first").await.unwrap();

        let dropped = TimeBlock::new("Dropped", start, start + Duration::minutes(30));
        storage.save_block(&dropped).await.unwrap();
        assert_eq!(storage.block_count(), 2);

        storage.rollback().await.unwrap();
        assert_eq!(storage.block_count(), 1);
        assert!(storage.load_block(kept.id).await.unwrap().is_some());
        assert!(storage.load_block(dropped.id).await.unwrap().is_none());
    }
}
