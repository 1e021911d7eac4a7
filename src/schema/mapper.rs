//! Fixed-schema mapping
//!
//! Projects a normalized snapshot onto the fixed instrument layout. Lookup is
//! fuzzy by design: a snapshot row matches an instrument when its slug
//! contains every keyword fragment, so minor label rewording upstream does
//! not silently drop a series.

use tracing::debug;

use super::{InstrumentQuote, PriceQuotes, PriceSnapshot, INSTRUMENTS};

/// True when `slug` contains every keyword fragment as a substring.
fn matches_all(slug: &str, keywords: &[&str]) -> bool {
    keywords.iter().all(|keyword| slug.contains(keyword))
}

/// Map a snapshot onto the tracked instrument layout.
///
/// For each instrument, the first snapshot entry (in source table order)
/// whose slug contains all of its keywords supplies the buy/sell pair.
/// Instruments with no matching row are left unmatched rather than failing
/// the cycle.
pub fn map_snapshot(snapshot: &PriceSnapshot) -> PriceQuotes {
    let mut quotes = PriceQuotes::default();
    for (index, instrument) in INSTRUMENTS.iter().enumerate() {
        let hit = snapshot
            .iter()
            .find(|(slug, _)| matches_all(slug, instrument.keywords));
        match hit {
            Some((slug, entry)) => {
                quotes.set(
                    index,
                    InstrumentQuote {
                        buy: Some(entry.buy),
                        sell: Some(entry.sell),
                    },
                );
                debug!(column = instrument.column, slug, "instrument matched");
            }
            None => {
                debug!(column = instrument.column, "no snapshot row matched");
            }
        }
    }
    quotes
}

// =============================================================================
// Tests
// =============================================================================
