//! Dayblocks CLI - plan the day in time blocks and track how it went.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use dayblocks_core::{BlockEdit, BlockId, BlockStatus, DailyProgress, TimeBlock, Time};
use dayblocks_progress::{BasicProgressTracker, ProgressTracker};
use dayblocks_schedule::{BasicScheduleManager, BlockSpec, ScheduleConfig, ScheduleManager};
use dayblocks_storage::{JsonStorage, Storage};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dayblocks")]
#[command(about = "Plan your day in time blocks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage directory for Dayblocks data
    #[arg(short, long, env = "DAYBLOCKS_DIR", default_value = ".dayblocks")]
    storage: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a new block
    Add {
        /// Block title
        title: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// End time (HH:MM)
        #[arg(long)]
        end: String,
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// End time falls on the following day
        #[arg(long)]
        next_day: bool,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
        /// Category
        #[arg(long)]
        category: Option<String>,
        /// Accept overlap with existing blocks
        #[arg(long)]
        allow_overlap: bool,
    },
    /// List a day's blocks
    List {
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Start a block
    Start {
        /// Block ID
        id: String,
    },
    /// Mark a block completed
    Complete {
        /// Block ID
        id: String,
    },
    /// Mark a block skipped
    Skip {
        /// Block ID
        id: String,
    },
    /// Edit a block's fields
    Edit {
        /// Block ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New start time (HH:MM, same day)
        #[arg(long)]
        start: Option<String>,
        /// New end time (HH:MM, same day)
        #[arg(long)]
        end: Option<String>,
        /// New notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,
        /// New category (empty string clears)
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a block
    Delete {
        /// Block ID
        id: String,
    },
    /// Show blocks that overlap a block
    Conflicts {
        /// Block ID
        id: String,
    },
    /// Refresh and show the day summary
    Summary {
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rate a day from 1 to 5
    Rate {
        /// Rating (1-5)
        rating: u8,
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Attach notes to a day
    Note {
        /// Notes text (empty string clears)
        text: String,
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark the day summary as viewed
    Viewed {
        /// Day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show recent days
    History {
        /// Number of days back from today
        #[arg(long, default_value = "7")]
        days: u32,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let storage = JsonStorage::new(&cli.storage)
        .await
        .with_context(|| format!("opening storage at {}", cli.storage.display()))?;
    debug!("Using storage at {}", cli.storage.display());

    run(cli.command, Arc::new(Mutex::new(storage)), Utc::now()).await
}

/// Execute one command against a shared store.
///
/// Every command that changes blocks re-aggregates the days it touched.
async fn run<S: Storage + 'static>(command: Commands, storage: Arc<Mutex<S>>, now: Time) -> Result<()> {
    let today = now.date_naive();
    let schedule = BasicScheduleManager::with_shared(Arc::clone(&storage));
    let tracker = BasicProgressTracker::with_shared(Arc::clone(&storage));

    match command {
        Commands::Add { title, start, end, date, next_day, notes, category, allow_overlap } => {
            let date = date.unwrap_or(today);
            let (start_time, end_time) = parse_range(date, &start, &end, next_day)?;
            let spec = BlockSpec {
                notes,
                category,
                ..BlockSpec::new(title, start_time, end_time)
            };
            let schedule = schedule.with_config(ScheduleConfig { allow_overlaps: allow_overlap });
            let block = schedule.create_block(spec, now).await?;
            println!("Added block: {} - {}", block.id, block.title);
            tracker.refresh_day(block.scheduled_date(), now).await?;
        }
        Commands::List { date } => {
            let date = date.unwrap_or(today);
            let changed = schedule.refresh_statuses(date, now).await?;
            if !changed.is_empty() {
                tracker.refresh_day(date, now).await?;
            }
            let blocks = schedule.blocks_for(date).await?;

            println!("Blocks for {} ({})", date, blocks.len());
            for block in &blocks {
                println!("  {}", format_block(block, now));
            }
        }
        Commands::Start { id } => {
            let block = schedule.start_block(parse_id(&id)?, now).await?;
            println!("Started: {}", block.title);
            tracker.refresh_day(block.scheduled_date(), now).await?;
        }
        Commands::Complete { id } => {
            let block = schedule.complete_block(parse_id(&id)?, now).await?;
            println!("Completed: {}", block.title);
            tracker.refresh_day(block.scheduled_date(), now).await?;
        }
        Commands::Skip { id } => {
            let block = schedule.skip_block(parse_id(&id)?, now).await?;
            println!("Skipped: {}", block.title);
            tracker.refresh_day(block.scheduled_date(), now).await?;
        }
        Commands::Edit { id, title, start, end, notes, category } => {
            let id = parse_id(&id)?;
            let current = storage
                .lock()
                .await
                .load_block(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Block not found: {}", id))?;
            let old_date = current.scheduled_date();

            let edit = BlockEdit {
                title,
                start_time: start.map(|s| parse_time(old_date, &s)).transpose()?,
                end_time: end.map(|s| parse_time(old_date, &s)).transpose()?,
                notes: notes.map(non_empty),
                category: category.map(non_empty),
                ..Default::default()
            };
            let block = schedule.edit_block(id, edit, now).await?;
            println!("Updated: {}", format_block(&block, now));

            tracker.refresh_day(old_date, now).await?;
            if block.scheduled_date() != old_date {
                tracker.refresh_day(block.scheduled_date(), now).await?;
            }
        }
        Commands::Delete { id } => {
            let removed = schedule.delete_block(parse_id(&id)?).await?;
            println!("Deleted block {}", id);
            tracker.refresh_day(removed.scheduled_date(), now).await?;
        }
        Commands::Conflicts { id } => {
            let conflicts = schedule.conflicts_for(parse_id(&id)?).await?;
            if conflicts.is_empty() {
                println!("No conflicts");
            }
            for block in &conflicts {
                println!("  {}", format_block(block, now));
            }
        }
        Commands::Summary { date } => {
            let date = date.unwrap_or(today);
            schedule.refresh_statuses(date, now).await?;
            let (record, report) = tracker.report(date, now).await?;

            println!("{} {} ({})", report.tier.emoji(), report.tier.title(), date);
            println!("  {}", report.tier.message());
            print_progress(&record);
            println!("  Score: {:.2}", report.score);
            println!("Suggestions:");
            for suggestion in &report.suggestions {
                println!("  - {}", suggestion.message());
            }
        }
        Commands::Rate { rating, date } => {
            let date = date.unwrap_or(today);
            tracker.set_day_rating(date, Some(rating), now).await?;
            println!("Rated {}: {}/5", date, rating);
        }
        Commands::Note { text, date } => {
            let date = date.unwrap_or(today);
            tracker.set_day_notes(date, non_empty(text), now).await?;
            println!("Saved notes for {}", date);
        }
        Commands::Viewed { date } => {
            let date = date.unwrap_or(today);
            tracker.mark_summary_viewed(date, now).await?;
            println!("Marked {} as viewed", date);
        }
        Commands::History { days } => {
            let from = today
                .checked_sub_days(Days::new(u64::from(days)))
                .unwrap_or(NaiveDate::MIN);
            let records = tracker.history(from, today).await?;

            println!("History ({} day(s))", records.len());
            for record in &records {
                let rating = record
                    .day_rating
                    .map(|r| format!("{}/5", r))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} | {:>3.0}% | {}/{} blocks | rating {}",
                    record.date,
                    record.completion_percentage() * 100.0,
                    record.stats.completed_blocks,
                    record.stats.total_blocks,
                    rating,
                );
            }
        }
    }

    Ok(())
}

fn parse_id(s: &str) -> Result<BlockId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid block ID: {}", s))
}

fn parse_time(date: NaiveDate, s: &str) -> Result<Time> {
    let time = NaiveTime::parse_from_str(s, "%H:%M")
        .with_context(|| format!("invalid time '{}', expected HH:MM", s))?;
    Ok(date.and_time(time).and_utc())
}

/// Parse an `HH:MM` range on `date`; `next_day` moves the end to the following day.
///
/// An end at or before the start is returned as is and left to block validation.
fn parse_range(date: NaiveDate, start: &str, end: &str, next_day: bool) -> Result<(Time, Time)> {
    let start_time = parse_time(date, start)?;
    let end_date = if next_day {
        date.succ_opt()
            .ok_or_else(|| anyhow::anyhow!("no day after {}", date))?
    } else {
        date
    };
    let end_time = parse_time(end_date, end)?;
    Ok((start_time, end_time))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

fn format_status(status: BlockStatus) -> &'static str {
    match status {
        BlockStatus::NotStarted => "TODO",
        BlockStatus::InProgress => "ACTIVE",
        BlockStatus::Completed => "DONE",
        BlockStatus::Skipped => "SKIPPED",
    }
}

fn format_block(block: &TimeBlock, now: Time) -> String {
    let mut line = format!(
        "{} | {}-{} | {:<7} | {}",
        block.id,
        block.start_time.format("%H:%M"),
        block.end_time.format("%H:%M"),
        format_status(block.status),
        block.title,
    );
    if let Some(category) = &block.category {
        line.push_str(&format!(" [{}]", category));
    }
    if let Some(remaining) = block.remaining_minutes(now) {
        line.push_str(&format!(" ({} min left)", remaining));
    }
    line
}

fn print_progress(record: &DailyProgress) {
    let stats = &record.stats;
    println!(
        "  Blocks: {} total, {} completed, {} skipped, {} in progress, {} not started",
        stats.total_blocks,
        stats.completed_blocks,
        stats.skipped_blocks,
        stats.in_progress_blocks,
        stats.not_started_blocks(),
    );
    println!(
        "  Completion: {:.0}% | Time: {}/{} min ({:.0}%)",
        stats.completion_percentage() * 100.0,
        stats.completed_minutes,
        stats.total_planned_minutes,
        stats.time_completion_percentage() * 100.0,
    );
    if let Some(rating) = record.day_rating {
        println!("  Rating: {}/5", rating);
    }
    if let Some(notes) = &record.day_notes {
        println!("  Notes: {}", notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use dayblocks_core::ValidationError;
    use dayblocks_storage::{BlockFilter, MemoryStorage};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn at(h: u32, m: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 11, h, m, 0).unwrap()
    }

    fn add(title: &str, start: &str, end: &str) -> Commands {
        Commands::Add {
            title: title.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            date: Some(day()),
            next_day: false,
            notes: None,
            category: None,
            allow_overlap: false,
        }
    }

    async fn block_id(storage: &Arc<Mutex<MemoryStorage>>, title: &str) -> String {
        let blocks = storage.lock().await.list_blocks(&BlockFilter::on(day())).await.unwrap();
        blocks
            .iter()
            .find(|b| b.title == title)
            .map(|b| b.id.to_string())
            .unwrap()
    }

    async fn stats(storage: &Arc<Mutex<MemoryStorage>>) -> dayblocks_core::DayStats {
        storage.lock().await.load_progress(day()).await.unwrap().unwrap().stats
    }

    #[test]
    fn test_parse_range_same_day() {
        let (start, end) = parse_range(day(), "09:00", "10:30", false).unwrap();
        assert_eq!(start.hour(), 9);
        assert_eq!((end - start).num_minutes(), 90);
    }

    #[test]
    fn test_parse_range_next_day() {
        let (start, end) = parse_range(day(), "23:00", "00:30", true).unwrap();
        assert_eq!(start.date_naive(), day());
        assert_eq!((end - start).num_minutes(), 90);
    }

    #[test]
    fn test_parse_range_keeps_bad_ranges_for_validation() {
        let (start, end) = parse_range(day(), "09:00", "09:00", false).unwrap();
        assert_eq!(start, end);
        let block = TimeBlock::new("Focus", start, end);
        assert!(block.validation_errors().contains(&ValidationError::InvalidTimeRange));

        let (start, end) = parse_range(day(), "10:00", "09:00", false).unwrap();
        assert!(end < start);
        let block = TimeBlock::new("Focus", start, end);
        assert!(block.validation_errors().contains(&ValidationError::InvalidTimeRange));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_range() {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        assert!(run(add("Focus", "09:00", "09:00"), Arc::clone(&storage), at(8, 0)).await.is_err());
        assert!(run(add("Focus", "10:00", "09:00"), Arc::clone(&storage), at(8, 0)).await.is_err());
        assert_eq!(storage.lock().await.block_count(), 0);
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time(day(), "9am").is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  ".into()), None);
        assert_eq!(non_empty("x".into()), Some("x".into()));
    }

    #[tokio::test]
    async fn test_block_changes_refresh_progress() {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        let now = at(8, 0);

        run(add("A", "09:00", "10:00"), Arc::clone(&storage), now).await.unwrap();
        let a = block_id(&storage, "A").await;
        run(Commands::Complete { id: a }, Arc::clone(&storage), now).await.unwrap();
        run(add("B", "10:00", "11:00"), Arc::clone(&storage), now).await.unwrap();
        run(add("C", "11:00", "12:00"), Arc::clone(&storage), now).await.unwrap();

        let after_adds = stats(&storage).await;
        assert_eq!(after_adds.total_blocks, 3);
        assert_eq!(after_adds.completed_blocks, 1);

        let b = block_id(&storage, "B").await;
        run(Commands::Start { id: b.clone() }, Arc::clone(&storage), now).await.unwrap();
        assert_eq!(stats(&storage).await.in_progress_blocks, 1);

        let c = block_id(&storage, "C").await;
        let edit = Commands::Edit {
            id: c,
            title: None,
            start: None,
            end: Some("13:00".to_string()),
            notes: None,
            category: None,
        };
        run(edit, Arc::clone(&storage), now).await.unwrap();
        assert_eq!(stats(&storage).await.total_planned_minutes, 240);

        run(Commands::Delete { id: b }, Arc::clone(&storage), now).await.unwrap();
        let after_delete = stats(&storage).await;
        assert_eq!(after_delete.total_blocks, 2);
        assert_eq!(after_delete.in_progress_blocks, 0);
        assert_eq!(after_delete.total_planned_minutes, 180);
    }

    #[tokio::test]
    async fn test_history_accepts_any_span() {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        run(Commands::History { days: u32::MAX }, storage, at(8, 0)).await.unwrap();
    }
}
