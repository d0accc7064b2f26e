//! SQLite-backed quotation store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::schema::StorageConfig;
use crate::quoting::QuotationRecord;
use crate::resilience::{run_stage, RequestContext};
use crate::storage::{QuotationStore, StoreError, StoredQuotation};

const CREATE_QUOTATIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS quotations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        codein TEXT NOT NULL,
        name TEXT NOT NULL,
        high TEXT NOT NULL,
        low TEXT NOT NULL,
        var_bid TEXT NOT NULL,
        pct_change TEXT NOT NULL,
        bid TEXT NOT NULL,
        ask TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        create_date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const INSERT_QUOTATION: &str = r#"
    INSERT INTO quotations (
        code, codein, name, high, low, var_bid, pct_change, bid, ask,
        timestamp, create_date, created_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Quotation store over a shared SQLite pool.
#[derive(Clone)]
pub struct SqliteQuotationStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteQuotationStore {
    /// Open the database (creating it if missing) and ensure the schema.
    pub async fn connect(config: &StorageConfig, persist_timeout: Duration) -> Result<Self, StoreError> {
        info!(database_url = %config.database_url, "Connecting to quotation store");

        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_QUOTATIONS).execute(&pool).await?;

        Ok(Self {
            pool,
            timeout: persist_timeout,
        })
    }

    /// Number of quotations stored so far.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QuotationStore for SqliteQuotationStore {
    async fn persist(
        &self,
        ctx: &RequestContext,
        record: &QuotationRecord,
    ) -> Result<StoredQuotation, StoreError> {
        let now = Utc::now();
        let insert = sqlx::query(INSERT_QUOTATION)
            .bind(&record.code)
            .bind(&record.code_in)
            .bind(&record.name)
            .bind(&record.high)
            .bind(&record.low)
            .bind(&record.var_bid)
            .bind(&record.pct_change)
            .bind(&record.bid)
            .bind(&record.ask)
            .bind(&record.timestamp)
            .bind(&record.create_date)
            .bind(now)
            .bind(now)
            .execute(&self.pool);

        let result = run_stage(ctx, self.timeout, insert).await??;
        let id = result.last_insert_rowid();
        debug!(id, "Quotation stored");

        Ok(StoredQuotation {
            id,
            record: record.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}
