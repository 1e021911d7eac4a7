//! Page extraction
//!
//! Pulls the update stamp and the labelled buy/sell rows out of raw page
//! HTML. Extraction is tolerant by construction: malformed rows are dropped
//! one at a time and never fail the page.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use tracing::debug;

use crate::schema::PriceEntry;

/// Update stamp as printed on the page, e.g.
/// `Cập nhật lúc 09:30 Ngày 05/01/2025`. Case-insensitive; time first,
/// date second.
static UPDATE_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Cập nhật lúc (\d{2}:\d{2})\s+Ngày\s+(\d{2}/\d{2}/\d{4})")
        .expect("update stamp pattern is valid")
});

/// One table row before numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub label: String,
    pub buy_text: String,
    pub sell_text: String,
}

/// Everything extracted from one fetched page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Source-reported stamp reassembled as `DD/MM/YYYY HH:MM`, when the
    /// page carries one.
    pub update_time: Option<String>,
    /// Coerced price rows in source table order.
    pub rows: Vec<PriceEntry>,
}

/// Extract the update stamp and price rows from raw HTML.
///
/// Never fails: a page with no recognizable table yields empty rows, and a
/// missing stamp yields `None`. The caller decides what an empty result
/// means.
pub fn extract_page(html: &str) -> PageContent {
    let document = Html::parse_document(html);
    let raw_rows = collect_raw_rows(&document);
    let rows: Vec<PriceEntry> = raw_rows.iter().filter_map(coerce_row).collect();
    if rows.len() < raw_rows.len() {
        debug!(
            dropped = raw_rows.len() - rows.len(),
            "dropped rows that failed numeric coercion"
        );
    }
    PageContent {
        update_time: extract_update_time(&document),
        rows,
    }
}

/// Collect candidate rows: every `<tr>` in the document except the very
/// first (the header), keeping rows with at least three cells. Extra cells
/// are ignored.
fn collect_raw_rows(document: &Html) -> Vec<RawRow> {
    let row_selector = Selector::parse("table tr").expect("row selector is valid");
    let cell_selector = Selector::parse("td").expect("cell selector is valid");

    let mut rows = Vec::new();
    for row in document.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() >= 3 {
            rows.push(RawRow {
                label: cells[0].clone(),
                buy_text: cells[1].clone(),
                sell_text: cells[2].clone(),
            });
        }
    }
    rows
}

/// Coerce one raw row, dropping it when the label is empty or either price
/// fails to parse.
fn coerce_row(row: &RawRow) -> Option<PriceEntry> {
    if row.label.is_empty() {
        return None;
    }
    Some(PriceEntry {
        label: row.label.clone(),
        buy: parse_price(&row.buy_text)?,
        sell: parse_price(&row.sell_text)?,
    })
}

/// Parse a price cell. The source writes both `.` and `,` as thousands
/// separators (never decimals), so both are stripped before parsing.
fn parse_price(text: &str) -> Option<Decimal> {
    let stripped: String = text.chars().filter(|c| !matches!(c, ',' | '.')).collect();
    Decimal::from_str(&stripped).ok()
}

/// First update stamp in document order, reassembled as
/// `DD/MM/YYYY HH:MM`.
fn extract_update_time(document: &Html) -> Option<String> {
    let text: String = document.root_element().text().collect();
    UPDATE_STAMP
        .captures(&text)
        .map(|caps| format!("{} {}", &caps[2], &caps[1]))
}

// =============================================================================
// Tests
// =============================================================================
