//! Progress tracking service.
//!
//! Owns the read-aggregate-upsert cycle for daily progress records and the
//! user-facing mutators that live beside the computed fields.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDate;
use dayblocks_core::{check_day_rating, DailyProgress, ProgressError, Time};
use dayblocks_storage::{BlockFilter, Storage, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::aggregator::aggregate;
use crate::classifier::{report, PerformanceReport};

/// Errors from the progress tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Underlying store failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A user input was rejected
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Result alias for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Recompute the record for `date` from its blocks and store it.
    async fn refresh_day(&self, date: NaiveDate, now: Time) -> Result<DailyProgress>;

    /// Stored record for `date`, if the day has ever been aggregated.
    async fn get_day(&self, date: NaiveDate) -> Result<Option<DailyProgress>>;

    /// Set or clear the 1-5 rating for `date`.
    async fn set_day_rating(&self, date: NaiveDate, rating: Option<u8>, now: Time) -> Result<DailyProgress>;

    /// Set or clear the notes for `date`.
    async fn set_day_notes(&self, date: NaiveDate, notes: Option<String>, now: Time) -> Result<DailyProgress>;

    /// Flag the summary for `date` as seen.
    async fn mark_summary_viewed(&self, date: NaiveDate, now: Time) -> Result<DailyProgress>;

    /// Refresh `date` and classify it.
    async fn report(&self, date: NaiveDate, now: Time) -> Result<(DailyProgress, PerformanceReport)>;

    /// Stored records within `from..=to`, oldest first.
    async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyProgress>>;
}

/// Basic progress tracker implementation.
///
/// Runs for the same date are serialized by a per-date lock, so a refresh
/// and a rating update never interleave their read and write. Locks are
/// dropped from the map once no run holds them.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<Mutex<S>>,
    day_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker owning `storage`.
    pub fn new(storage: S) -> Self {
        Self::with_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a tracker over a store shared with other services.
    pub fn with_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            day_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the underlying store.
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    async fn day_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self.day_locks.lock().await;
        Arc::clone(locks.entry(date).or_default())
    }

    async fn release_day_lock(&self, date: NaiveDate, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.day_locks.lock().await;
        if locks.get(&date).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&date);
        }
    }

    /// Aggregate and upsert. Caller must hold the day lock.
    async fn recompute(&self, date: NaiveDate, now: Time) -> Result<DailyProgress> {
        let mut storage = self.storage.lock().await;
        let blocks = storage.list_blocks(&BlockFilter::on(date)).await?;
        let stats = aggregate(date, &blocks, now);

        let record = match storage.load_progress(date).await? {
            Some(mut existing) => {
                existing.apply_stats(stats, now);
                existing
            }
            None => DailyProgress::from_stats(date, stats, now),
        };
        storage.save_progress(&record).await?;
        storage.commit(&format!("Refresh progress for {}", date)).await?;

        debug!(
            "Aggregated {}: {}/{} completed, {} skipped, {} in progress",
            date,
            stats.completed_blocks,
            stats.total_blocks,
            stats.skipped_blocks,
            stats.in_progress_blocks
        );
        Ok(record)
    }

    /// Apply a user-field change, creating the record first if needed.
    async fn update_day<F>(&self, date: NaiveDate, now: Time, action: &str, apply: F) -> Result<DailyProgress>
    where
        F: FnOnce(&mut DailyProgress) -> std::result::Result<(), ProgressError> + Send,
    {
        let lock = self.day_lock(date).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_locked(date, now, action, apply).await
        };
        self.release_day_lock(date, lock).await;
        result
    }

    async fn apply_locked<F>(&self, date: NaiveDate, now: Time, action: &str, apply: F) -> Result<DailyProgress>
    where
        F: FnOnce(&mut DailyProgress) -> std::result::Result<(), ProgressError> + Send,
    {
        let existing = self.storage.lock().await.load_progress(date).await?;
        let mut record = match existing {
            Some(record) => record,
            None => self.recompute(date, now).await?,
        };
        apply(&mut record)?;

        let mut storage = self.storage.lock().await;
        storage.save_progress(&record).await?;
        storage.commit(&format!("{} for {}", action, date)).await?;
        info!("{} for {}", action, date);
        Ok(record)
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn refresh_day(&self, date: NaiveDate, now: Time) -> Result<DailyProgress> {
        let lock = self.day_lock(date).await;
        let result = {
            let _guard = lock.lock().await;
            self.recompute(date, now).await
        };
        self.release_day_lock(date, lock).await;
        result
    }

    async fn get_day(&self, date: NaiveDate) -> Result<Option<DailyProgress>> {
        Ok(self.storage.lock().await.load_progress(date).await?)
    }

    async fn set_day_rating(&self, date: NaiveDate, rating: Option<u8>, now: Time) -> Result<DailyProgress> {
        check_day_rating(rating)?;
        self.update_day(date, now, "Rate day", |record| record.set_day_rating(rating, now))
            .await
    }

    async fn set_day_notes(&self, date: NaiveDate, notes: Option<String>, now: Time) -> Result<DailyProgress> {
        self.update_day(date, now, "Update day notes", |record| {
            record.set_day_notes(notes, now);
            Ok(())
        })
        .await
    }

    async fn mark_summary_viewed(&self, date: NaiveDate, now: Time) -> Result<DailyProgress> {
        self.update_day(date, now, "Mark summary viewed", |record| {
            record.mark_summary_viewed(now);
            Ok(())
        })
        .await
    }

    async fn report(&self, date: NaiveDate, now: Time) -> Result<(DailyProgress, PerformanceReport)> {
        let record = self.refresh_day(date, now).await?;
        let report = report(&record.stats);
        Ok((record, report))
    }

    async fn history(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyProgress>> {
        let all = self.storage.lock().await.list_progress().await?;
        Ok(all
            .into_iter()
            .filter(|p| p.date >= from && p.date <= to)
            .collect())
    }
}
