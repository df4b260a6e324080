// src/storage/sqlite.rs
// =============================================================================
// SQLite-backed report store.
//
// Headings get one column per level. The broken link list is stored as a
// JSON array so it comes back exactly as it went in: same order, duplicates
// and all.
// =============================================================================

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::StoredPage;
use crate::analyzer::{AnalysisReport, BrokenLink, HeadingCounts, HeadingLevel};
use crate::error::StoreError;

const CREATE_PAGES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    meta TEXT NOT NULL,
    html_version TEXT NOT NULL,
    h1 INTEGER NOT NULL,
    h2 INTEGER NOT NULL,
    h3 INTEGER NOT NULL,
    h4 INTEGER NOT NULL,
    h5 INTEGER NOT NULL,
    h6 INTEGER NOT NULL,
    internal_links INTEGER NOT NULL,
    external_links INTEGER NOT NULL,
    broken_links INTEGER NOT NULL,
    login_form INTEGER NOT NULL,
    broken_link_details TEXT NOT NULL,
    analyzed_at INTEGER NOT NULL
)";

const SELECT_PAGES: &str = "
SELECT id, url, title, meta, html_version, h1, h2, h3, h4, h5, h6,
       internal_links, external_links, broken_links, login_form,
       broken_link_details, analyzed_at
FROM pages";

#[derive(Debug, Clone)]
pub struct ReportStore {
    pool: SqlitePool,
}

impl ReportStore {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        info!("opened report store at {}", path.display());
        Self::init(pool).await
    }

    /// A private in-memory database. Everything is gone when the store is
    /// dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is its own database, so the pool must
        // hold exactly one connection and never recycle it
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_PAGES_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    // Inserts the report for `url`, or replaces the existing one.
    //
    // Returns: the row id (unchanged when the URL was already stored).
    pub async fn upsert(&self, url: &str, report: &AnalysisReport) -> Result<i64, StoreError> {
        let details = serde_json::to_string(&report.broken_links)?;
        let h = &report.headings;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO pages (
                url, title, meta, html_version, h1, h2, h3, h4, h5, h6,
                internal_links, external_links, broken_links, login_form,
                broken_link_details, analyzed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title=excluded.title,
                meta=excluded.meta,
                html_version=excluded.html_version,
                h1=excluded.h1,
                h2=excluded.h2,
                h3=excluded.h3,
                h4=excluded.h4,
                h5=excluded.h5,
                h6=excluded.h6,
                internal_links=excluded.internal_links,
                external_links=excluded.external_links,
                broken_links=excluded.broken_links,
                login_form=excluded.login_form,
                broken_link_details=excluded.broken_link_details,
                analyzed_at=excluded.analyzed_at
            RETURNING id",
        )
        .bind(url)
        .bind(&report.title)
        .bind(&report.meta_description)
        .bind(&report.html_version)
        .bind(h.h1 as i64)
        .bind(h.h2 as i64)
        .bind(h.h3 as i64)
        .bind(h.h4 as i64)
        .bind(h.h5 as i64)
        .bind(h.h6 as i64)
        .bind(report.internal_link_count as i64)
        .bind(report.external_link_count as i64)
        .bind(report.broken_link_count as i64)
        .bind(report.has_login_form)
        .bind(details)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        debug!("stored analysis of {} as id {}", url, id);
        Ok(id)
    }

    /// All stored analyses, oldest id first.
    pub async fn list(&self) -> Result<Vec<StoredPage>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_PAGES} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredPage>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_PAGES} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    // Deletes every id in `ids` in one transaction.
    //
    // Returns: how many rows were actually removed (unknown ids don't count).
    pub async fn delete(&self, ids: &[i64]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for id in ids {
            removed += sqlx::query("DELETE FROM pages WHERE id = ?")
                .bind(*id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}

fn decode_row(row: &SqliteRow) -> Result<StoredPage, StoreError> {
    let id: i64 = row.try_get("id")?;

    let count = |column: &str| -> Result<usize, StoreError> {
        let value: i64 = row.try_get(column)?;
        usize::try_from(value).map_err(|_| StoreError::Corrupt {
            id,
            reason: format!("{column} is negative ({value})"),
        })
    };

    let mut headings = HeadingCounts::default();
    for level in HeadingLevel::ALL {
        headings.set(level, count(level.tag())?);
    }

    let details: String = row.try_get("broken_link_details")?;
    let broken_links: Vec<BrokenLink> =
        serde_json::from_str(&details).map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("broken_link_details: {e}"),
        })?;

    let millis: i64 = row.try_get("analyzed_at")?;
    let analyzed_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        StoreError::Corrupt {
            id,
            reason: format!("analyzed_at out of range ({millis})"),
        }
    })?;

    Ok(StoredPage {
        id,
        url: row.try_get("url")?,
        analyzed_at,
        report: AnalysisReport {
            title: row.try_get("title")?,
            meta_description: row.try_get("meta")?,
            html_version: row.try_get("html_version")?,
            headings,
            internal_link_count: count("internal_links")?,
            external_link_count: count("external_links")?,
            broken_link_count: count("broken_links")?,
            broken_links,
            has_login_form: row.try_get("login_form")?,
        },
    })
}
