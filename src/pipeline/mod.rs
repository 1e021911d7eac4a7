//! Fetch-cycle orchestration
//!
//! Wires source, extraction, normalization, mapping, change detection and
//! the store into one cycle, and caches cycle reports for a configurable
//! window.

mod cache;
mod cycle;

pub use cache::*;
pub use cycle::*;
