//! JSON file storage implementation.
//!
//! Stores one JSON file per record under a root directory and keeps small
//! per-object meta markers (version + updated_at). Progress records are keyed
//! by date, so saving a record for an existing day overwrites it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::NaiveDate;
use dayblocks_core::{BlockId, DailyProgress, TimeBlock};
use super::{BlockFilter, Storage, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    pending: Arc<Mutex<bool>>,
}

impl JsonStorage {
    /// Create storage. This will create the subdirectories needed for data
    /// and meta markers.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("blocks")).await?;
        fs::create_dir_all(root.join("progress")).await?;

        fs::create_dir_all(root.join("meta").join("blocks")).await?;
        fs::create_dir_all(root.join("meta").join("progress")).await?;

        debug!("Opened JSON storage at {}", root.display());

        Ok(Self {
            root,
            pending: Arc::new(Mutex::new(false)),
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn block_path(&self, id: BlockId) -> PathBuf {
        self.root.join("blocks").join(format!("{}.json", id))
    }

    fn progress_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join("progress").join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    async fn set_pending(&self) {
        *self.pending.lock().await = true;
    }

    /// Whether writes happened since the last commit or rollback.
    pub async fn is_pending(&self) -> bool {
        *self.pending.lock().await
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_block(&mut self, block: &TimeBlock) -> Result<()> {
        let path = self.block_path(block.id);
        let json = serde_json::to_string_pretty(block)?;
        fs::write(&path, json.as_bytes()).await?;

        let id_str = block.id.to_string();
        let ver = self.bump_version("blocks", &id_str).await?;
        debug!("Saved block {} (v{})", id_str, ver);

        self.set_pending().await;
        Ok(())
    }

    async fn load_block(&self, id: BlockId) -> Result<Option<TimeBlock>> {
        read_json(&self.block_path(id)).await
    }

    async fn list_blocks(&self, filter: &BlockFilter) -> Result<Vec<TimeBlock>> {
        let all = list_dir(&self.root.join("blocks")).await?;
        let mut blocks: Vec<TimeBlock> = all
            .into_iter()
            .filter(|b: &TimeBlock| filter.matches(b))
            .collect();
        blocks.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(blocks)
    }

    async fn delete_block(&mut self, id: BlockId) -> Result<()> {
        remove_if_exists(&self.block_path(id)).await?;
        remove_if_exists(&self.meta_path("blocks", &id.to_string())).await?;
        debug!("Deleted block {}", id);
        self.set_pending().await;
        Ok(())
    }

    async fn save_progress(&mut self, progress: &DailyProgress) -> Result<()> {
        let path = self.progress_path(progress.date);
        let json = serde_json::to_string_pretty(progress)?;
        fs::write(&path, json.as_bytes()).await?;

        let key = progress.date.format("%Y-%m-%d").to_string();
        let ver = self.bump_version("progress", &key).await?;
        debug!("Saved progress for {} (v{})", key, ver);

        self.set_pending().await;
        Ok(())
    }

    async fn load_progress(&self, date: NaiveDate) -> Result<Option<DailyProgress>> {
        read_json(&self.progress_path(date)).await
    }

    async fn list_progress(&self) -> Result<Vec<DailyProgress>> {
        let mut records = list_dir(&self.root.join("progress")).await?;
        records.sort_by(|a: &DailyProgress, b| a.date.cmp(&b.date));
        Ok(records)
    }

    async fn commit(&mut self, message: &str) -> Result<()> {
        // Files are written eagerly; commit only clears the pending marker.
        *self.pending.lock().await = false;
        debug!("Committed: {}", message);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        *self.pending.lock().await = false;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable record {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use dayblocks_core::{BlockStatus, DayStats};

    fn block_on(day: u32, hour: u32) -> TimeBlock {
        let start = Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap();
        TimeBlock::new(format!("Block {}-{}", day, hour), start, start + Duration::minutes(30))
    }

    #[tokio::test]
    async fn test_block_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let block = block_on(11, 9).with_category("work");
        storage.save_block(&block).await.unwrap();
        assert!(storage.is_pending().await);

        let loaded = storage.load_block(block.id).await.unwrap().unwrap();
        assert_eq!(loaded, block);

        storage.delete_block(block.id).await.unwrap();
        assert!(storage.load_block(block.id).await.unwrap().is_none());
        // Deleting twice is fine.
        storage.delete_block(block.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_blocks_filters_by_date_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let late = block_on(11, 15);
        let mut early = block_on(11, 8);
        early.mark_completed();
        let other_day = block_on(12, 9);
        for b in [&late, &early, &other_day] {
            storage.save_block(b).await.unwrap();
        }

        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let on_day = storage.list_blocks(&BlockFilter::on(day)).await.unwrap();
        let ids: Vec<_> = on_day.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let done = storage
            .list_blocks(&BlockFilter::on(day).with_status(vec![BlockStatus::Completed]))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, early.id);

        let all = storage.list_blocks(&BlockFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_progress_upserts_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 11, 20, 0, 0).unwrap();

        let mut progress = DailyProgress::from_stats(day, DayStats::default(), at);
        storage.save_progress(&progress).await.unwrap();

        progress.apply_stats(DayStats { total_blocks: 3, ..Default::default() }, at);
        storage.save_progress(&progress).await.unwrap();

        let records = storage.list_progress().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stats.total_blocks, 3);

        let loaded = storage.load_progress(day).await.unwrap().unwrap();
        assert_eq!(loaded.id, progress.id);

        storage.commit("refresh").await.unwrap();
        assert!(!storage.is_pending().await);
    }
}
