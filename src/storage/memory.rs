//! In-memory price store
//!
//! Backs tests and `--memory-store` runs. Mirrors the Postgres semantics:
//! `display_time` uniqueness, monotonic creation instants, timestamp-ordered
//! reads.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use super::{InsertOutcome, PriceStore, StoreResult};
use crate::schema::{PriceObservation, PriceRecord};

/// Vec-backed [`PriceStore`].
#[derive(Default)]
pub struct MemoryPriceStore {
    records: Mutex<Vec<PriceRecord>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn insert_if_absent(
        &self,
        observation: &PriceObservation,
    ) -> StoreResult<InsertOutcome> {
        let mut records = self.records.lock();
        if records
            .iter()
            .any(|record| record.display_time == observation.display_time)
        {
            return Ok(InsertOutcome::DuplicateDisplayTime);
        }

        // Keep timestamps strictly increasing even when two inserts land in
        // the same clock tick, so ordering stays deterministic.
        let now = Utc::now();
        let timestamp = match records.last() {
            Some(previous) if now <= previous.timestamp => {
                previous.timestamp + Duration::microseconds(1)
            }
            _ => now,
        };

        let id = records.len() as i64 + 1;
        records.push(PriceRecord {
            id,
            display_time: observation.display_time.clone(),
            timestamp,
            quotes: observation.quotes.clone(),
        });
        Ok(InsertOutcome::Inserted(id))
    }

    async fn latest(&self) -> StoreResult<Option<PriceRecord>> {
        Ok(self.records.lock().last().cloned())
    }

    async fn history(&self) -> StoreResult<Vec<PriceRecord>> {
        // insertion order is timestamp order by construction
        Ok(self.records.lock().clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Tests
// =============================================================================
