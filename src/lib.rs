//! # Gold Tracker
//!
//! Scrapes the Kim Ngân Phúc precious-metals price board, normalizes it into
//! a fixed instrument schema and keeps an append-only history of price
//! changes behind a small HTTP API.
//!
//! ## Pipeline
//!
//! Each fetch cycle runs the same pass: fetch the page, extract the update
//! stamp and price rows, slug the row labels, map them onto the tracked
//! instruments, compare against the last stored record and persist only when
//! something moved. Duplicate source stamps are dropped at the store via a
//! unique constraint, so overlapping cycles stay safe.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod schema;
pub mod scheduler;
pub mod server;
pub mod slug;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use config::Settings;
pub use pipeline::{CycleError, CycleOutcome, CycleReport, FetchPipeline};
pub use schema::{PriceObservation, PriceRecord, PriceSnapshot, INSTRUMENTS};
pub use source::{HttpPageSource, MockPageSource, PageSource, SourceError};
pub use storage::{InsertOutcome, MemoryPriceStore, PriceRepository, PriceStore, StoreError};
