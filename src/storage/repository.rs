//! Postgres price repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{InsertOutcome, PriceStore, StoreError, StoreResult};
use crate::config::DatabaseSettings;
use crate::schema::{InstrumentQuote, PriceObservation, PriceQuotes, PriceRecord, INSTRUMENTS};

/// Persisted price table.
const TABLE: &str = "gold_prices";

/// Row counts and time bounds for the price table.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_records: i64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Postgres-backed [`PriceStore`].
///
/// One row per accepted observation; `display_time` carries a UNIQUE
/// constraint and inserts go through `ON CONFLICT DO NOTHING`, so the
/// duplicate check and the insert are a single atomic statement.
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool from database settings.
    pub async fn from_settings(settings: &DatabaseSettings) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .connect(&settings.url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the price table and its indexes if they do not exist.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations...");

        sqlx::query(&create_table_sql()).execute(&self.pool).await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{TABLE}_timestamp ON {TABLE} (timestamp DESC)"
        ))
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Row count and time bounds, for the `db stats` command.
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total, MIN(timestamp) AS earliest, MAX(timestamp) AS latest FROM {TABLE}"
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total_records: row.try_get("total")?,
            earliest: row.try_get("earliest")?,
            latest: row.try_get("latest")?,
        })
    }
}

#[async_trait]
impl PriceStore for PriceRepository {
    async fn insert_if_absent(
        &self,
        observation: &PriceObservation,
    ) -> StoreResult<InsertOutcome> {
        let sql = insert_sql();
        let mut query = sqlx::query(&sql).bind(&observation.display_time);
        for (_, quote) in observation.quotes.iter() {
            query = query.bind(quote.buy).bind(quote.sell);
        }

        // DO NOTHING suppresses RETURNING on conflict, so no row means the
        // display_time was already taken.
        let row = query.fetch_optional(&self.pool).await?;
        Ok(match row {
            Some(row) => InsertOutcome::Inserted(row.try_get("id")?),
            None => InsertOutcome::DuplicateDisplayTime,
        })
    }

    async fn latest(&self) -> StoreResult<Option<PriceRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {TABLE} ORDER BY timestamp DESC LIMIT 1",
            select_columns()
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose().map_err(Into::into)
    }

    async fn history(&self) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {TABLE} ORDER BY timestamp ASC",
            select_columns()
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// =============================================================================
// SQL builders
// =============================================================================

/// `<column>_buy, <column>_sell` pairs in instrument layout order.
fn price_columns() -> Vec<String> {
    INSTRUMENTS
        .iter()
        .flat_map(|instrument| {
            [
                format!("{}_buy", instrument.column),
                format!("{}_sell", instrument.column),
            ]
        })
        .collect()
}

fn create_table_sql() -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {TABLE} (\n    \
         id BIGSERIAL PRIMARY KEY,\n    \
         display_time TEXT NOT NULL UNIQUE,\n    \
         timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()"
    );
    for column in price_columns() {
        sql.push_str(&format!(",\n    {column} NUMERIC"));
    }
    sql.push_str("\n)");
    sql
}

fn insert_sql() -> String {
    let columns = price_columns();
    let placeholders: Vec<String> = (0..columns.len()).map(|i| format!("${}", i + 2)).collect();
    format!(
        "INSERT INTO {TABLE} (display_time, {}) VALUES ($1, {}) \
         ON CONFLICT (display_time) DO NOTHING RETURNING id",
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn select_columns() -> String {
    let mut columns = vec![
        "id".to_string(),
        "display_time".to_string(),
        "timestamp".to_string(),
    ];
    columns.extend(price_columns());
    columns.join(", ")
}

fn record_from_row(row: &PgRow) -> Result<PriceRecord, sqlx::Error> {
    let mut quotes = PriceQuotes::default();
    for (index, instrument) in INSTRUMENTS.iter().enumerate() {
        let buy: Option<Decimal> = row.try_get(format!("{}_buy", instrument.column).as_str())?;
        let sell: Option<Decimal> = row.try_get(format!("{}_sell", instrument.column).as_str())?;
        quotes.set(index, InstrumentQuote { buy, sell });
    }
    Ok(PriceRecord {
        id: row.try_get("id")?,
        display_time: row.try_get("display_time")?,
        timestamp: row.try_get("timestamp")?,
        quotes,
    })
}

// =============================================================================
// Tests
// =============================================================================
