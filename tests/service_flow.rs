//! End-to-end service flow tests
//!
//! These tests drive the public API the way the service does: canned pages
//! go in one side, records and cycle reports come out the other. No network,
//! no database; the memory store carries the same semantics as Postgres.

use std::sync::Arc;

use rust_decimal::Decimal;

use gold_tracker::config::PipelineSettings;
use gold_tracker::pipeline::{CycleOutcome, FetchPipeline};
use gold_tracker::server::report_body;
use gold_tracker::source::MockPageSource;
use gold_tracker::storage::MemoryPriceStore;
use gold_tracker::PriceStore;

/// A page close to what the live site serves: one stamp line, one table with
/// a header row and all seven tracked series plus an untracked extra row.
fn full_page(ring_buy: u64, silver_bar_buy: u64, stamp: &str) -> String {
    format!(
        r#"<html><body>
        <h1>Bảng giá vàng bạc</h1>
        <p>Cập nhật lúc {stamp}</p>
        <table>
            <tr><td>Loại vàng</td><td>Giá mua</td><td>Giá bán</td></tr>
            <tr><td>Nhẫn ép vỉ KNP 9999</td><td>{ring_buy}</td><td>7,700,000</td></tr>
            <tr><td>Vàng trang sức 9999</td><td>7,400,000</td><td>7,600,000</td></tr>
            <tr><td>Vàng trang sức 999</td><td>7,350,000</td><td>7,550,000</td></tr>
            <tr><td>Bạc thỏi 1 lượng</td><td>{silver_bar_buy}</td><td>1,250,000</td></tr>
            <tr><td>Bạc miếng 1 lượng</td><td>1,150,000</td><td>1,200,000</td></tr>
            <tr><td>Bạc thỏi 2024</td><td>1,100,000</td><td>1,160,000</td></tr>
            <tr><td>Bạc thỏi 2025</td><td>1,120,000</td><td>1,180,000</td></tr>
            <tr><td>Quà tặng vàng lá</td><td>500,000</td><td>520,000</td></tr>
        </table>
        </body></html>"#
    )
}

fn pipeline_over(
    source: MockPageSource,
) -> (FetchPipeline, Arc<MemoryPriceStore>) {
    let store = Arc::new(MemoryPriceStore::new());
    let pipeline = FetchPipeline::new(
        Arc::new(source),
        store.clone(),
        &PipelineSettings::default(),
    );
    (pipeline, store)
}

#[tokio::test]
async fn full_page_maps_every_instrument() {
    let source = MockPageSource::fixed(full_page(7_500_000, 1_200_000, "09:30 Ngày 05/01/2025"));
    let (pipeline, store) = pipeline_over(source);

    let report = pipeline.run_cycle().await.unwrap();
    assert_eq!(report.outcome, CycleOutcome::Saved { id: 1 });
    // eight table rows extracted, seven of them tracked
    assert_eq!(report.snapshot.len(), 8);

    let record = store.latest().await.unwrap().unwrap();
    assert_eq!(record.display_time, "05/01/2025 09:30");
    for (instrument, quote) in record.quotes.iter() {
        assert!(
            quote.buy.is_some() && quote.sell.is_some(),
            "{} should have matched a row",
            instrument.column
        );
    }
    assert_eq!(
        record.quotes.get(0).unwrap().buy,
        Some(Decimal::from(7_500_000))
    );
}

#[tokio::test]
async fn repeated_cycles_store_only_changes() {
    let source = MockPageSource::sequence(vec![
        Ok(full_page(7_500_000, 1_200_000, "09:30 Ngày 05/01/2025")),
        // same prices, later stamp: nothing stored
        Ok(full_page(7_500_000, 1_200_000, "10:00 Ngày 05/01/2025")),
        // ring moved with a fresh stamp: stored
        Ok(full_page(7_560_000, 1_200_000, "10:30 Ngày 05/01/2025")),
        // silver moved but the stamp is stale: duplicate, skipped
        Ok(full_page(7_560_000, 1_230_000, "10:30 Ngày 05/01/2025")),
    ]);
    let (pipeline, store) = pipeline_over(source);

    let outcomes: Vec<CycleOutcome> = {
        let mut collected = Vec::new();
        for _ in 0..4 {
            collected.push(pipeline.run_cycle().await.unwrap().outcome);
        }
        collected
    };

    assert_eq!(
        outcomes,
        vec![
            CycleOutcome::Saved { id: 1 },
            CycleOutcome::Unchanged,
            CycleOutcome::Saved { id: 2 },
            CycleOutcome::DuplicateDisplayTime,
        ]
    );
    assert_eq!(store.len(), 2);

    let history = store.history().await.unwrap();
    assert_eq!(history[0].display_time, "05/01/2025 09:30");
    assert_eq!(history[1].display_time, "05/01/2025 10:30");
    assert!(history[0].timestamp < history[1].timestamp);
    assert_eq!(
        store.latest().await.unwrap().unwrap().display_time,
        "05/01/2025 10:30"
    );
}

#[tokio::test]
async fn missing_rows_become_null_columns_not_failures() {
    let page = r#"<html><body>
        <p>Cập nhật lúc 08:15 Ngày 06/01/2025</p>
        <table>
            <tr><td>Loại</td><td>Mua</td><td>Bán</td></tr>
            <tr><td>Vàng trang sức 9999</td><td>7,400,000</td><td>7,600,000</td></tr>
        </table>
        </body></html>"#;
    let (pipeline, store) = pipeline_over(MockPageSource::fixed(page));

    let report = pipeline.run_cycle().await.unwrap();
    assert!(report.outcome.saved());

    let record = store.latest().await.unwrap().unwrap();
    // the jewelry row also satisfies the looser 999 keyword set
    assert!(record.quotes.get(1).unwrap().buy.is_some());
    assert!(record.quotes.get(2).unwrap().buy.is_some());
    // everything else is absent, recorded as nulls
    assert!(record.quotes.get(0).unwrap().buy.is_none());
    assert!(record.quotes.get(3).unwrap().buy.is_none());
}

#[tokio::test]
async fn report_body_matches_the_wire_contract() {
    let source = MockPageSource::fixed(full_page(7_500_000, 1_200_000, "09:30 Ngày 05/01/2025"));
    let (pipeline, _store) = pipeline_over(source);

    let saved = pipeline.run_cycle().await.unwrap();
    let body = report_body(&saved);
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["saved"], serde_json::json!(true));
    assert_eq!(body["id"], serde_json::json!(1));
    assert_eq!(body["updateTime"], serde_json::json!("05/01/2025 09:30"));
    assert!(body["prices"]["nhan_ep_vi_knp_9999"]["buy"].is_number());

    let unchanged = pipeline.run_cycle().await.unwrap();
    let body = report_body(&unchanged);
    assert_eq!(body["saved"], serde_json::json!(false));
    assert_eq!(body["reason"], serde_json::json!("unchanged"));
}

#[tokio::test]
async fn upstream_failure_leaves_the_store_untouched() {
    let source = MockPageSource::sequence(vec![
        Err(gold_tracker::SourceError::Upstream("timed out".to_string())),
        Ok(full_page(7_500_000, 1_200_000, "09:30 Ngày 05/01/2025")),
    ]);
    let (pipeline, store) = pipeline_over(source);

    assert!(pipeline.run_cycle().await.is_err());
    assert!(store.is_empty());

    // the next cycle recovers on its own
    let report = pipeline.run_cycle().await.unwrap();
    assert!(report.outcome.saved());
    assert_eq!(store.len(), 1);
}
