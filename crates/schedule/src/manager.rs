//! Schedule management service.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDate;
use dayblocks_core::{sort_for_display, BlockEdit, BlockId, BlockStatus, TimeBlock, Time};
use dayblocks_storage::{BlockFilter, Storage};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::error::{Result, ScheduleError};

/// Schedule management service.
#[async_trait]
pub trait ScheduleManager: Send + Sync {
    /// Validate and store a new block.
    async fn create_block(&self, spec: BlockSpec, now: Time) -> Result<TimeBlock>;

    /// Apply a field edit to a block.
    async fn edit_block(&self, id: BlockId, edit: BlockEdit, now: Time) -> Result<TimeBlock>;

    /// Remove a block, returning it.
    async fn delete_block(&self, id: BlockId) -> Result<TimeBlock>;

    /// Atomically move a block from `expected` to `to`.
    async fn transition(&self, id: BlockId, expected: BlockStatus, to: BlockStatus, now: Time) -> Result<TimeBlock>;

    /// Start a block from whatever state it is in.
    async fn start_block(&self, id: BlockId, now: Time) -> Result<TimeBlock>;

    /// Complete a block from whatever state it is in.
    async fn complete_block(&self, id: BlockId, now: Time) -> Result<TimeBlock>;

    /// Skip a block from whatever state it is in.
    async fn skip_block(&self, id: BlockId, now: Time) -> Result<TimeBlock>;

    /// Apply time-based status changes to a day's blocks.
    ///
    /// Returns the blocks that changed.
    async fn refresh_statuses(&self, date: NaiveDate, now: Time) -> Result<Vec<TimeBlock>>;

    /// Blocks on `date`, in display order.
    async fn blocks_for(&self, date: NaiveDate) -> Result<Vec<TimeBlock>>;

    /// Blocks that overlap the given block.
    async fn conflicts_for(&self, id: BlockId) -> Result<Vec<TimeBlock>>;
}

/// Specification for creating a block.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    /// Block title
    pub title: String,
    /// Scheduled start
    pub start_time: Time,
    /// Scheduled end
    pub end_time: Time,
    /// Free-form notes
    pub notes: Option<String>,
    /// Optional category label
    pub category: Option<String>,
    /// Optional icon name
    pub icon: Option<String>,
    /// Optional color identifier
    pub color_id: Option<String>,
}

impl BlockSpec {
    /// Spec with only the required fields.
    pub fn new(title: impl Into<String>, start_time: Time, end_time: Time) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time,
            notes: None,
            category: None,
            icon: None,
            color_id: None,
        }
    }

    fn into_block(self, now: Time) -> TimeBlock {
        let mut block = TimeBlock::new(self.title, self.start_time, self.end_time);
        block.notes = self.notes;
        block.category = self.category;
        block.icon = self.icon;
        block.color_id = self.color_id;
        block.created_at = now;
        block.updated_at = now;
        block
    }
}

/// Schedule service configuration.
#[derive(Debug, Clone, Default)]
pub struct ScheduleConfig {
    /// Accept blocks that overlap others on the same day
    pub allow_overlaps: bool,
}

/// Basic schedule manager implementation.
///
/// Every read-modify-write runs under the storage lock, so two callers
/// racing on the same block are applied one after the other.
pub struct BasicScheduleManager<S: Storage> {
    storage: Arc<Mutex<S>>,
    config: ScheduleConfig,
}

impl<S: Storage> BasicScheduleManager<S> {
    /// Create a new schedule manager owning `storage`.
    pub fn new(storage: S) -> Self {
        Self::with_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a manager over a store shared with other services.
    pub fn with_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            config: ScheduleConfig::default(),
        }
    }

    /// Set configuration.
    pub fn with_config(mut self, config: ScheduleConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared handle to the underlying store.
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// Reject invalid or overlapping blocks. Caller holds the storage lock.
    async fn check_block(&self, storage: &S, block: &TimeBlock) -> Result<()> {
        let errors = block.validation_errors();
        if !errors.is_empty() {
            return Err(ScheduleError::Validation(errors));
        }
        if self.config.allow_overlaps {
            return Ok(());
        }
        let same_day = storage
            .list_blocks(&BlockFilter::on(block.scheduled_date()))
            .await?;
        let conflicts: Vec<BlockId> = block.conflicts_in(&same_day).iter().map(|b| b.id).collect();
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(ScheduleError::Conflict(conflicts))
        }
    }

    async fn apply_status(
        &self,
        id: BlockId,
        expected: Option<BlockStatus>,
        to: BlockStatus,
        now: Time,
    ) -> Result<TimeBlock> {
        let mut storage = self.storage.lock().await;
        let mut block = storage
            .load_block(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))?;

        if let Some(expected) = expected {
            if block.status != expected {
                return Err(ScheduleError::StatusMismatch {
                    expected,
                    actual: block.status,
                });
            }
        }

        let from = block.status;
        if let Err(e) = block.try_update_status(to, now) {
            warn!("Rejected status change for {}: {}", id, e);
            return Err(e.into());
        }
        storage.save_block(&block).await?;
        storage.commit(&format!("Block {} {} -> {}", id, from, to)).await?;

        info!("Block {} moved {} -> {}", id, from, to);
        Ok(block)
    }
}

#[async_trait]
impl<S: Storage + 'static> ScheduleManager for BasicScheduleManager<S> {
    async fn create_block(&self, spec: BlockSpec, now: Time) -> Result<TimeBlock> {
        let block = spec.into_block(now);

        let mut storage = self.storage.lock().await;
        self.check_block(&storage, &block).await?;
        storage.save_block(&block).await?;
        storage.commit(&format!("Add block {}", block.id)).await?;

        info!("Created block {} '{}' on {}", block.id, block.title, block.scheduled_date());
        Ok(block)
    }

    async fn edit_block(&self, id: BlockId, edit: BlockEdit, now: Time) -> Result<TimeBlock> {
        let mut storage = self.storage.lock().await;
        let mut block = storage
            .load_block(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))?;

        block.apply_edit(edit, now);
        self.check_block(&storage, &block).await?;
        storage.save_block(&block).await?;
        storage.commit(&format!("Edit block {}", id)).await?;

        debug!("Edited block {}", id);
        Ok(block)
    }

    async fn delete_block(&self, id: BlockId) -> Result<TimeBlock> {
        let mut storage = self.storage.lock().await;
        let block = storage
            .load_block(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))?;
        storage.delete_block(id).await?;
        storage.commit(&format!("Delete block {}", id)).await?;

        info!("Deleted block {}", id);
        Ok(block)
    }

    async fn transition(&self, id: BlockId, expected: BlockStatus, to: BlockStatus, now: Time) -> Result<TimeBlock> {
        self.apply_status(id, Some(expected), to, now).await
    }

    async fn start_block(&self, id: BlockId, now: Time) -> Result<TimeBlock> {
        self.apply_status(id, None, BlockStatus::InProgress, now).await
    }

    async fn complete_block(&self, id: BlockId, now: Time) -> Result<TimeBlock> {
        self.apply_status(id, None, BlockStatus::Completed, now).await
    }

    async fn skip_block(&self, id: BlockId, now: Time) -> Result<TimeBlock> {
        self.apply_status(id, None, BlockStatus::Skipped, now).await
    }

    async fn refresh_statuses(&self, date: NaiveDate, now: Time) -> Result<Vec<TimeBlock>> {
        let mut storage = self.storage.lock().await;
        let blocks = storage.list_blocks(&BlockFilter::on(date)).await?;

        let mut changed = Vec::new();
        for mut block in blocks {
            if block.update_status_based_on_time(now) {
                storage.save_block(&block).await?;
                changed.push(block);
            }
        }
        if !changed.is_empty() {
            storage.commit(&format!("Auto-start {} block(s) on {}", changed.len(), date)).await?;
            debug!("Auto-started {} block(s) on {}", changed.len(), date);
        }
        Ok(changed)
    }

    async fn blocks_for(&self, date: NaiveDate) -> Result<Vec<TimeBlock>> {
        let mut blocks = self
            .storage
            .lock()
            .await
            .list_blocks(&BlockFilter::on(date))
            .await?;
        sort_for_display(&mut blocks);
        Ok(blocks)
    }

    async fn conflicts_for(&self, id: BlockId) -> Result<Vec<TimeBlock>> {
        let storage = self.storage.lock().await;
        let block = storage
            .load_block(id)
            .await?
            .ok_or(ScheduleError::NotFound(id))?;
        let same_day = storage
            .list_blocks(&BlockFilter::on(block.scheduled_date()))
            .await?;
        Ok(block.conflicts_in(&same_day).into_iter().cloned().collect())
    }
}
