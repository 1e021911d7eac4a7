//! Normalized price data model
//!
//! This module defines the shapes that flow through the pipeline: the
//! snapshot built from one page fetch, the fixed instrument layout it is
//! mapped onto, and the persisted record form.

mod mapper;

pub use mapper::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Map, Value};

// =============================================================================
// Instruments
// =============================================================================

/// One tracked price series and the keyword fragments that locate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    /// Column stem in the persisted table (`<column>_buy` / `<column>_sell`).
    pub column: &'static str,
    /// Fragments that must all appear in a snapshot slug for it to match.
    pub keywords: &'static [&'static str],
}

/// Every instrument the service tracks, in the order their columns are laid
/// out. Matching is keyword-subset rather than exact-key so the mapping keeps
/// working when the source rewords or reorders its rows; adding a series is
/// one row here plus a migration.
pub static INSTRUMENTS: [Instrument; INSTRUMENT_COUNT] = [
    Instrument {
        column: "nhan_ep_vi_knp_9999",
        keywords: &["nhan", "ep", "vi"],
    },
    Instrument {
        column: "vang_trang_suc_9999",
        keywords: &["vang", "trang", "suc", "9999"],
    },
    Instrument {
        column: "vang_trang_suc_999",
        keywords: &["vang", "trang", "suc", "999"],
    },
    Instrument {
        column: "bac_thoi_1_luong",
        keywords: &["bac", "thoi", "1", "luong"],
    },
    Instrument {
        column: "bac_mieng_1_luong",
        keywords: &["bac", "mieng", "1", "luong"],
    },
    Instrument {
        column: "bac_thoi_2024",
        keywords: &["bac", "thoi", "2024"],
    },
    Instrument {
        column: "bac_thoi_2025",
        keywords: &["bac", "thoi", "2025"],
    },
];

/// Number of tracked instruments.
pub const INSTRUMENT_COUNT: usize = 7;

// =============================================================================
// Snapshot
// =============================================================================

/// One price row after numeric coercion, keyed in a snapshot by its slug.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    /// Row label exactly as the source displays it.
    pub label: String,
    /// Buy (bid) price in VND.
    pub buy: Decimal,
    /// Sell (ask) price in VND.
    pub sell: Decimal,
}

/// Insertion-ordered slug → entry map built from one page fetch.
///
/// Iteration order is source table order, which the mapper's first-match
/// tie-break depends on. Inserting an existing slug overwrites the entry in
/// place without moving it.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    entries: Vec<(String, PriceEntry)>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any existing entry under the same slug.
    pub fn insert(&mut self, slug: String, entry: PriceEntry) {
        match self.entries.iter_mut().find(|(key, _)| *key == slug) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((slug, entry)),
        }
    }

    pub fn get(&self, slug: &str) -> Option<&PriceEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key == slug)
            .map(|(_, entry)| entry)
    }

    /// Entries in insertion (source table) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object keyed by slug, preserving insertion order in the
    /// serialized output.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (slug, entry) in self.iter() {
            map.insert(
                slug.to_string(),
                json!({ "label": entry.label, "buy": entry.buy, "sell": entry.sell }),
            );
        }
        Value::Object(map)
    }
}

// =============================================================================
// Mapped quotes
// =============================================================================

/// Buy/sell pair for one instrument. `None` means no snapshot row matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InstrumentQuote {
    pub buy: Option<Decimal>,
    pub sell: Option<Decimal>,
}

/// Quotes for every tracked instrument, index-aligned with [`INSTRUMENTS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceQuotes {
    quotes: [InstrumentQuote; INSTRUMENT_COUNT],
}

impl PriceQuotes {
    pub fn get(&self, index: usize) -> Option<&InstrumentQuote> {
        self.quotes.get(index)
    }

    pub fn set(&mut self, index: usize, quote: InstrumentQuote) {
        if let Some(slot) = self.quotes.get_mut(index) {
            *slot = quote;
        }
    }

    /// Quotes paired with their instrument definitions, in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static Instrument, &InstrumentQuote)> {
        INSTRUMENTS.iter().zip(self.quotes.iter())
    }

    /// True when every instrument is unmatched.
    pub fn is_empty(&self) -> bool {
        self.quotes
            .iter()
            .all(|quote| quote.buy.is_none() && quote.sell.is_none())
    }
}

// =============================================================================
// Persisted records
// =============================================================================

/// Candidate row handed to the store: one mapped snapshot plus its source
/// stamp. The store decides whether it becomes a record.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    /// Source-reported "as of" stamp, `DD/MM/YYYY HH:MM`.
    pub display_time: String,
    pub quotes: PriceQuotes,
}

/// One persisted price observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// Store-assigned row id.
    pub id: i64,
    /// Source-reported stamp, unique across records.
    pub display_time: String,
    /// Store-assigned creation instant; the sort key for latest/history.
    pub timestamp: DateTime<Utc>,
    pub quotes: PriceQuotes,
}

impl PriceRecord {
    /// Flat JSON form mirroring the persisted column layout, with one
    /// `<column>_buy` / `<column>_sell` pair per instrument.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("display_time".to_string(), json!(self.display_time));
        map.insert("timestamp".to_string(), json!(self.timestamp));
        for (instrument, quote) in self.quotes.iter() {
            map.insert(format!("{}_buy", instrument.column), json!(quote.buy));
            map.insert(format!("{}_sell", instrument.column), json!(quote.sell));
        }
        Value::Object(map)
    }
}

// =============================================================================
// Tests
// =============================================================================
