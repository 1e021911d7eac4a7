//! One fetch cycle, end to end
//!
//! A cycle fetches the page, extracts and normalizes rows, maps them onto
//! the instrument layout, compares against the last stored record and
//! persists when something moved. Every way a cycle can end without writing
//! is still a success; errors are reserved for upstream and store failures.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::TtlCache;
use crate::config::PipelineSettings;
use crate::schema::{map_snapshot, PriceObservation, PriceQuotes, PriceRecord, PriceSnapshot};
use crate::slug::slugify;
use crate::source::{extract_page, PageSource, SourceError};
use crate::storage::{InsertOutcome, PriceStore, StoreError};

/// Errors that abort a cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    /// Fetching the source page failed
    #[error("source fetch failed: {0}")]
    Source(#[from] SourceError),

    /// Reading or writing the store failed
    #[error("store access failed: {0}")]
    Store(#[from] StoreError),
}

/// Result type for cycle operations.
pub type CycleResult<T> = Result<T, CycleError>;

/// How a completed cycle ended. Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new record was persisted under this id.
    Saved { id: i64 },
    /// The candidate matches the last stored record field for field.
    Unchanged,
    /// Another record already carries this display time.
    DuplicateDisplayTime,
    /// Extraction yielded no usable rows and policy says not to save those.
    EmptySnapshot,
}

impl CycleOutcome {
    pub fn saved(&self) -> bool {
        matches!(self, CycleOutcome::Saved { .. })
    }

    /// Wire label for the not-saved outcomes.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            CycleOutcome::Saved { .. } => None,
            CycleOutcome::Unchanged => Some("unchanged"),
            CycleOutcome::DuplicateDisplayTime => Some("duplicateTimestamp"),
            CycleOutcome::EmptySnapshot => Some("emptySnapshot"),
        }
    }
}

/// Everything one cycle produced. The HTTP layer serializes this whole.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Normalized snapshot the cycle was judged on.
    pub snapshot: PriceSnapshot,
    /// Display time the candidate carried (source stamp or local fallback).
    pub display_time: String,
    /// True when this report was replayed from the TTL cache.
    pub from_cache: bool,
}

/// Change detector: strict field-by-field comparison against the last
/// stored record. An empty store always counts as changed, so the first
/// cycle bootstraps the history.
pub fn has_changed(previous: Option<&PriceRecord>, candidate: &PriceQuotes) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    for ((instrument, old), (_, new)) in previous.quotes.iter().zip(candidate.iter()) {
        if old.buy != new.buy || old.sell != new.sell {
            debug!(column = instrument.column, "quote differs from last stored record");
            return true;
        }
    }
    false
}

/// Runs fetch cycles against one source and one store.
pub struct FetchPipeline {
    source: Arc<dyn PageSource>,
    store: Arc<dyn PriceStore>,
    save_empty_snapshot: bool,
    cache: TtlCache<String, CycleReport>,
}

impl FetchPipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        store: Arc<dyn PriceStore>,
        settings: &PipelineSettings,
    ) -> Self {
        let cache = TtlCache::new(Duration::from_secs(settings.cache_ttl_secs));
        Self::with_cache(source, store, settings, cache)
    }

    /// Pipeline with an injected cache (tests drive expiry through its
    /// clock).
    pub fn with_cache(
        source: Arc<dyn PageSource>,
        store: Arc<dyn PriceStore>,
        settings: &PipelineSettings,
        cache: TtlCache<String, CycleReport>,
    ) -> Self {
        Self {
            source,
            store,
            save_empty_snapshot: settings.save_empty_snapshot,
            cache,
        }
    }

    pub fn store(&self) -> &Arc<dyn PriceStore> {
        &self.store
    }

    /// Run one full cycle.
    ///
    /// Within the cache TTL this replays the previous report (flagged
    /// `from_cache`) without touching the source or the store.
    pub async fn run_cycle(&self) -> CycleResult<CycleReport> {
        let cache_key = self.source.describe();
        if let Some(mut report) = self.cache.get(&cache_key) {
            debug!("serving cycle report from cache");
            report.from_cache = true;
            return Ok(report);
        }

        let html = self.source.fetch_page().await?;
        let content = extract_page(&html);

        let mut snapshot = PriceSnapshot::new();
        for entry in content.rows {
            snapshot.insert(slugify(&entry.label), entry);
        }
        info!(rows = snapshot.len(), "extracted snapshot from source page");

        // Fall back to scrape time when the page carries no stamp, in the
        // same shape the source uses.
        let display_time = content
            .update_time
            .unwrap_or_else(|| Local::now().format("%d/%m/%Y %H:%M").to_string());

        let outcome = self.judge_and_persist(&snapshot, &display_time).await?;
        let report = CycleReport {
            outcome,
            snapshot,
            display_time,
            from_cache: false,
        };
        self.cache.put(cache_key, report.clone());
        Ok(report)
    }

    async fn judge_and_persist(
        &self,
        snapshot: &PriceSnapshot,
        display_time: &str,
    ) -> CycleResult<CycleOutcome> {
        if snapshot.is_empty() && !self.save_empty_snapshot {
            warn!("source page yielded no usable rows, skipping save");
            return Ok(CycleOutcome::EmptySnapshot);
        }

        let quotes = map_snapshot(snapshot);
        let previous = self.store.latest().await?;

        if !has_changed(previous.as_ref(), &quotes) {
            info!("prices unchanged since last stored record");
            return Ok(CycleOutcome::Unchanged);
        }

        let observation = PriceObservation {
            display_time: display_time.to_string(),
            quotes,
        };
        match self.store.insert_if_absent(&observation).await? {
            InsertOutcome::Inserted(id) => {
                info!(id, display_time, "saved new price record");
                Ok(CycleOutcome::Saved { id })
            }
            InsertOutcome::DuplicateDisplayTime => {
                info!(display_time, "record with this display time already stored");
                Ok(CycleOutcome::DuplicateDisplayTime)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::InstrumentQuote;
    use crate::source::MockPageSource;
    use crate::storage::MemoryPriceStore;
    use chrono::Utc;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use std::time::Instant;

    fn page(ring_buy: &str, ring_sell: &str, stamp: &str) -> String {
        format!(
            r#"<html><body>
            <div>Cập nhật lúc {stamp}</div>
            <table>
                <tr><td>Loại</td><td>Mua</td><td>Bán</td></tr>
                <tr><td>Nhẫn ép vỉ KNP 9999</td><td>{ring_buy}</td><td>{ring_sell}</td></tr>
                <tr><td>Bạc thỏi 1 lượng</td><td>1,200,000</td><td>1,250,000</td></tr>
            </table>
            </body></html>"#
        )
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            save_empty_snapshot: false,
            cache_ttl_secs: 0,
        }
    }

    fn pipeline_with(
        source: MockPageSource,
        settings: PipelineSettings,
    ) -> (FetchPipeline, Arc<MemoryPriceStore>) {
        let store = Arc::new(MemoryPriceStore::new());
        let pipeline = FetchPipeline::new(Arc::new(source), store.clone(), &settings);
        (pipeline, store)
    }

    fn record_with(buy: i64, sell: i64) -> PriceRecord {
        let mut quotes = PriceQuotes::default();
        quotes.set(
            0,
            InstrumentQuote {
                buy: Some(Decimal::from(buy)),
                sell: Some(Decimal::from(sell)),
            },
        );
        PriceRecord {
            id: 1,
            display_time: "05/01/2025 09:30".to_string(),
            timestamp: Utc::now(),
            quotes,
        }
    }

    #[test]
    fn test_empty_store_counts_as_changed() {
        assert!(has_changed(None, &PriceQuotes::default()));
    }

    #[test]
    fn test_identical_quotes_are_unchanged() {
        let record = record_with(100, 200);
        let candidate = record.quotes.clone();
        assert!(!has_changed(Some(&record), &candidate));
    }

    #[test]
    fn test_single_field_move_is_a_change() {
        let record = record_with(100, 200);
        let mut candidate = record.quotes.clone();
        candidate.set(
            0,
            InstrumentQuote {
                buy: Some(Decimal::from(101)),
                sell: Some(Decimal::from(200)),
            },
        );
        assert!(has_changed(Some(&record), &candidate));
    }

    #[test]
    fn test_null_to_value_transition_is_a_change() {
        let record = record_with(100, 200);
        let mut candidate = record.quotes.clone();
        candidate.set(
            6,
            InstrumentQuote {
                buy: Some(Decimal::from(1)),
                sell: None,
            },
        );
        assert!(has_changed(Some(&record), &candidate));
    }

    #[tokio::test]
    async fn test_first_cycle_saves_a_record() {
        let source = MockPageSource::fixed(page("7,500,000", "7,700,000", "09:30 Ngày 05/01/2025"));
        let (pipeline, store) = pipeline_with(source, settings());

        let report = pipeline.run_cycle().await.unwrap();
        assert_eq!(report.outcome, CycleOutcome::Saved { id: 1 });
        assert_eq!(report.display_time, "05/01/2025 09:30");
        assert!(!report.from_cache);
        assert_eq!(store.len(), 1);

        let record = store.latest().await.unwrap().unwrap();
        assert_eq!(
            record.quotes.get(0).unwrap().buy,
            Some(Decimal::from(7_500_000))
        );
        assert_eq!(
            record.quotes.get(3).unwrap().sell,
            Some(Decimal::from(1_250_000))
        );
    }

    #[tokio::test]
    async fn test_unchanged_page_does_not_save_again() {
        let source = MockPageSource::fixed(page("7,500,000", "7,700,000", "09:30 Ngày 05/01/2025"));
        let (pipeline, store) = pipeline_with(source, settings());

        assert!(pipeline.run_cycle().await.unwrap().outcome.saved());
        let second = pipeline.run_cycle().await.unwrap();
        assert_eq!(second.outcome, CycleOutcome::Unchanged);
        assert_eq!(second.outcome.reason(), Some("unchanged"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_price_move_with_new_stamp_saves() {
        let source = MockPageSource::sequence(vec![
            Ok(page("7,500,000", "7,700,000", "09:30 Ngày 05/01/2025")),
            Ok(page("7,550,000", "7,750,000", "10:00 Ngày 05/01/2025")),
        ]);
        let (pipeline, store) = pipeline_with(source, settings());

        pipeline.run_cycle().await.unwrap();
        let second = pipeline.run_cycle().await.unwrap();
        assert_eq!(second.outcome, CycleOutcome::Saved { id: 2 });
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_price_move_with_stale_stamp_is_duplicate() {
        let source = MockPageSource::sequence(vec![
            Ok(page("7,500,000", "7,700,000", "09:30 Ngày 05/01/2025")),
            Ok(page("7,550,000", "7,750,000", "09:30 Ngày 05/01/2025")),
        ]);
        let (pipeline, store) = pipeline_with(source, settings());

        pipeline.run_cycle().await.unwrap();
        let second = pipeline.run_cycle().await.unwrap();
        assert_eq!(second.outcome, CycleOutcome::DuplicateDisplayTime);
        assert_eq!(second.outcome.reason(), Some("duplicateTimestamp"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_is_skipped_by_default() {
        let source = MockPageSource::fixed("<html><body>bảo trì</body></html>");
        let (pipeline, store) = pipeline_with(source, settings());

        let report = pipeline.run_cycle().await.unwrap();
        assert_eq!(report.outcome, CycleOutcome::EmptySnapshot);
        assert_eq!(report.outcome.reason(), Some("emptySnapshot"));
        assert!(report.snapshot.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_saves_all_nulls_when_policy_allows() {
        let source = MockPageSource::fixed("<html><body>bảo trì</body></html>");
        let (pipeline, store) = pipeline_with(
            source,
            PipelineSettings {
                save_empty_snapshot: true,
                cache_ttl_secs: 0,
            },
        );

        let report = pipeline.run_cycle().await.unwrap();
        assert!(report.outcome.saved());
        let record = store.latest().await.unwrap().unwrap();
        assert!(record.quotes.is_empty());

        // a second empty page compares equal to the all-null record
        let second = pipeline.run_cycle().await.unwrap();
        assert_eq!(second.outcome, CycleOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let source = MockPageSource::sequence(vec![Err(SourceError::Status(503))]);
        let (pipeline, store) = pipeline_with(source, settings());

        let error = pipeline.run_cycle().await.unwrap_err();
        assert!(matches!(error, CycleError::Source(SourceError::Status(503))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cached_report_replays_without_refetching() {
        let source = MockPageSource::sequence(vec![Ok(page(
            "7,500,000",
            "7,700,000",
            "09:30 Ngày 05/01/2025",
        ))]);

        let offset = Arc::new(Mutex::new(Duration::ZERO));
        let base = Instant::now();
        let handle = offset.clone();
        let cache = TtlCache::with_clock(
            Duration::from_secs(30),
            Box::new(move || base + *handle.lock()),
        );

        let store: Arc<MemoryPriceStore> = Arc::new(MemoryPriceStore::new());
        let pipeline = FetchPipeline::with_cache(
            Arc::new(source),
            store.clone(),
            &PipelineSettings {
                save_empty_snapshot: false,
                cache_ttl_secs: 30,
            },
            cache,
        );

        let first = pipeline.run_cycle().await.unwrap();
        assert!(first.outcome.saved());

        // the mock queue is drained, so a real fetch here would error
        let second = pipeline.run_cycle().await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.outcome, first.outcome);
        assert_eq!(store.len(), 1);

        // past the TTL the pipeline fetches again and fails on the empty queue
        *offset.lock() = Duration::from_secs(31);
        assert!(pipeline.run_cycle().await.is_err());
    }
}
