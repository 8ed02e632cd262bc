//! Persistent job store: SQLite schema and per-scope reconciliation batches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobsift_core::{JobPosting, PostingCandidate, SourceBoard, SourceScope};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, SqlitePool};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobsift-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored row carries unknown source tag {0:?}")]
    UnknownSource(String),
    #[error("stored row carries malformed id: {0}")]
    MalformedId(#[from] uuid::Error),
}

/// Write outcome of one per-scope batch, aggregated into the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub inserted: u64,
    pub updated: u64,
    pub reactivated: u64,
    pub deactivated: u64,
}

/// Storage capability the reconciliation engine depends on: keyed upsert,
/// bulk read of active rows per scope, and deactivation by exclusion list.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically upsert `candidates` for `scope` and deactivate every active
    /// stored posting in the scope that was not observed this run. The whole
    /// batch commits or none of it does.
    async fn apply_batch(
        &self,
        scope: &SourceScope,
        candidates: &[PostingCandidate],
        seen_at: DateTime<Utc>,
    ) -> Result<BatchCounts, StoreError>;

    /// All currently active postings in one scope.
    async fn active_for_scope(&self, scope: &SourceScope) -> Result<Vec<JobPosting>, StoreError>;
}

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    company TEXT NOT NULL,
    external_id TEXT NOT NULL,
    title TEXT NOT NULL,
    role TEXT NOT NULL,
    seniority TEXT NOT NULL,
    location_raw TEXT,
    location_city TEXT,
    location_remote INTEGER NOT NULL DEFAULT 0,
    url TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    first_seen_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    UNIQUE (source, external_id)
);
CREATE INDEX IF NOT EXISTS idx_jobs_scope_active ON jobs (source, company, is_active);
";

const SELECT_COLUMNS: &str = "\
SELECT id, source, company, external_id, title, role, seniority, location_raw, \
location_city, location_remote, url, is_active, first_seen_at, last_seen_at FROM jobs";

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: String,
    source: String,
    company: String,
    external_id: String,
    title: String,
    role: String,
    seniority: String,
    location_raw: Option<String>,
    location_city: Option<String>,
    location_remote: bool,
    url: String,
    is_active: bool,
    first_seen_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl JobRow {
    fn into_posting(self) -> Result<JobPosting, StoreError> {
        let source = SourceBoard::parse(&self.source)
            .ok_or_else(|| StoreError::UnknownSource(self.source.clone()))?;
        Ok(JobPosting {
            id: Uuid::parse_str(&self.id)?,
            source,
            company: self.company,
            external_id: self.external_id,
            title: self.title,
            role: self.role,
            seniority: self.seniority,
            location_raw: self.location_raw,
            location_city: self.location_city,
            location_remote: self.location_remote,
            url: self.url,
            is_active: self.is_active,
            first_seen_at: self.first_seen_at,
            last_seen_at: self.last_seen_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open (creating if missing) a SQLite database and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = url
            .parse::<SqliteConnectOptions>()?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database. Pinned to a single pooled connection so
    /// the database survives for the pool's lifetime.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Idempotent schema creation.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Targeted lookup by the unique reconciliation key.
    pub async fn find(
        &self,
        source: SourceBoard,
        external_id: &str,
    ) -> Result<Option<JobPosting>, StoreError> {
        let query = format!("{SELECT_COLUMNS} WHERE source = ? AND external_id = ?");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(source.as_str())
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobRow::into_posting).transpose()
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn apply_batch(
        &self,
        scope: &SourceScope,
        candidates: &[PostingCandidate],
        seen_at: DateTime<Utc>,
    ) -> Result<BatchCounts, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut counts = BatchCounts::default();

        for candidate in candidates {
            let existing =
                sqlx::query("SELECT is_active FROM jobs WHERE source = ? AND external_id = ?")
                    .bind(scope.source.as_str())
                    .bind(&candidate.external_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            match existing {
                None => {
                    sqlx::query(
                        "INSERT INTO jobs (id, source, company, external_id, title, role, \
                         seniority, location_raw, location_city, location_remote, url, \
                         is_active, first_seen_at, last_seen_at) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
                    )
                    .bind(Uuid::new_v4().to_string())
                    .bind(scope.source.as_str())
                    .bind(&candidate.company)
                    .bind(&candidate.external_id)
                    .bind(&candidate.title)
                    .bind(&candidate.role)
                    .bind(&candidate.seniority)
                    .bind(&candidate.location_raw)
                    .bind(&candidate.location_city)
                    .bind(candidate.location_remote)
                    .bind(&candidate.url)
                    .bind(seen_at)
                    .bind(seen_at)
                    .execute(&mut *tx)
                    .await?;
                    counts.inserted += 1;
                }
                Some(row) => {
                    let was_active: bool = row.try_get("is_active")?;
                    // Refresh mutable fields and bump last_seen_at;
                    // first_seen_at is immutable after insert.
                    sqlx::query(
                        "UPDATE jobs SET company = ?, title = ?, role = ?, seniority = ?, \
                         location_raw = ?, location_city = ?, location_remote = ?, url = ?, \
                         is_active = 1, last_seen_at = ? \
                         WHERE source = ? AND external_id = ?",
                    )
                    .bind(&candidate.company)
                    .bind(&candidate.title)
                    .bind(&candidate.role)
                    .bind(&candidate.seniority)
                    .bind(&candidate.location_raw)
                    .bind(&candidate.location_city)
                    .bind(candidate.location_remote)
                    .bind(&candidate.url)
                    .bind(seen_at)
                    .bind(scope.source.as_str())
                    .bind(&candidate.external_id)
                    .execute(&mut *tx)
                    .await?;
                    if was_active {
                        counts.updated += 1;
                    } else {
                        counts.reactivated += 1;
                    }
                }
            }
        }

        // Everything active in this scope that the run did not observe goes
        // inactive; last_seen_at keeps the last time it was actually seen.
        // One bound parameter per candidate, well under SQLite's default
        // host-parameter cap of 32766 for any real board.
        let mut builder =
            QueryBuilder::new("UPDATE jobs SET is_active = 0 WHERE is_active = 1 AND source = ");
        builder.push_bind(scope.source.as_str());
        builder.push(" AND company = ");
        builder.push_bind(&scope.company);
        if !candidates.is_empty() {
            builder.push(" AND external_id NOT IN (");
            {
                let mut ids = builder.separated(", ");
                for candidate in candidates {
                    ids.push_bind(candidate.external_id.as_str());
                }
            }
            builder.push(")");
        }
        let result = builder.build().execute(&mut *tx).await?;
        counts.deactivated = result.rows_affected();

        tx.commit().await?;
        debug!(
            source = %scope.source,
            company = %scope.company,
            inserted = counts.inserted,
            updated = counts.updated,
            reactivated = counts.reactivated,
            deactivated = counts.deactivated,
            "committed reconciliation batch"
        );
        Ok(counts)
    }

    async fn active_for_scope(&self, scope: &SourceScope) -> Result<Vec<JobPosting>, StoreError> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE source = ? AND company = ? AND is_active = 1 ORDER BY external_id"
        );
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(scope.source.as_str())
            .bind(&scope.company)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(JobRow::into_posting).collect()
    }
}
