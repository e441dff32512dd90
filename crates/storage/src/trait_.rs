//! Storage trait abstraction.

use async_trait::async_trait;
use chrono::NaiveDate;
use dayblocks_core::{BlockId, BlockStatus, DailyProgress, TimeBlock};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Filter for querying time blocks.
///
/// Dates are compared against each block's scheduled (calendar) date and
/// both bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct BlockFilter {
    /// Earliest scheduled date
    pub from: Option<NaiveDate>,

    /// Latest scheduled date
    pub to: Option<NaiveDate>,

    /// Filter by status
    pub status: Option<Vec<BlockStatus>>,
}

impl BlockFilter {
    /// Blocks scheduled on a single day.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
            status: None,
        }
    }

    /// Blocks scheduled within `from..=to`.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            status: None,
        }
    }

    /// Restrict to the given statuses.
    pub fn with_status(mut self, status: Vec<BlockStatus>) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether the block passes the filter.
    pub fn matches(&self, block: &TimeBlock) -> bool {
        let date = block.scheduled_date();
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        match &self.status {
            Some(statuses) => statuses.contains(&block.status),
            None => true,
        }
    }
}

/// Storage abstraction for Dayblocks data.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Time block operations ===

    /// Save a block (create or update).
    async fn save_block(&mut self, block: &TimeBlock) -> Result<()>;

    /// Load a block by ID.
    async fn load_block(&self, id: BlockId) -> Result<Option<TimeBlock>>;

    /// List blocks matching the filter, ordered by start time.
    async fn list_blocks(&self, filter: &BlockFilter) -> Result<Vec<TimeBlock>>;

    /// Delete a block. Deleting a missing block is not an error.
    async fn delete_block(&mut self, id: BlockId) -> Result<()>;

    // === Daily progress operations ===

    /// Save a progress record, replacing any record for the same date.
    async fn save_progress(&mut self, progress: &DailyProgress) -> Result<()>;

    /// Load the progress record for a date.
    async fn load_progress(&self, date: NaiveDate) -> Result<Option<DailyProgress>>;

    /// List all progress records, ordered by date.
    async fn list_progress(&self) -> Result<Vec<DailyProgress>>;

    // === Transaction support ===

    /// Commit pending changes with a message.
    async fn commit(&mut self, message: &str) -> Result<()>;

    /// Rollback pending changes.
    async fn rollback(&mut self) -> Result<()>;
}
