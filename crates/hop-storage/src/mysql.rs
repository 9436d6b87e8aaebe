use async_trait::async_trait;
use hop_core::store::{LinkStore, ReadLinkStore, Result};
use hop_core::{LinkId, LinkRecord, NewLink, Owner, StorageError};
use jiff::Timestamp;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use tracing::{debug, info};

/// Schema of the `links` table.
pub const SCHEMA: &str = include_str!("../ddl/mysql/links.sql");

const COLUMNS: &str = "id, original_url, short_code, custom_alias, created_at, \
                       expires_at, last_accessed, access_count, owner_id";

/// MySQL implementation of the link store contract.
///
/// Unique indexes on `short_code` and `custom_alias` back the code namespace,
/// so a lost check-then-insert race surfaces as [`StorageError::Conflict`].
/// Timestamps are stored as unix microseconds.
#[derive(Debug, Clone)]
pub struct MySqlLinkStore {
    pool: MySqlPool,
}

impl MySqlLinkStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        info!(max_connections, "connected to mysql");
        Ok(Self::new(pool))
    }

    /// Creates the `links` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("mysql pool closed");
    }
}

fn to_micros(ts: Timestamp) -> i64 {
    ts.as_microsecond()
}

/// Truncates to the precision the table stores.
fn truncate_to_micros(ts: Timestamp) -> Result<Timestamp> {
    parse_timestamp("created_at", ts.as_microsecond())
}

fn parse_timestamp(column: &str, micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{micros}': {e}"))
    })
}

fn parse_optional_timestamp(column: &str, micros: Option<i64>) -> Result<Option<Timestamp>> {
    micros.map(|value| parse_timestamp(column, value)).transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn record_from_row(row: &MySqlRow) -> Result<LinkRecord> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let last_accessed: Option<i64> = row.try_get("last_accessed").map_err(map_sqlx_error)?;
    let owner: Option<String> = row.try_get("owner_id").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        id: LinkId(id),
        original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        short_code: row.try_get("short_code").map_err(map_sqlx_error)?,
        custom_alias: row.try_get("custom_alias").map_err(map_sqlx_error)?,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: parse_optional_timestamp("expires_at", expires_at)?,
        last_accessed: parse_optional_timestamp("last_accessed", last_accessed)?,
        access_count: row.try_get("access_count").map_err(map_sqlx_error)?,
        owner: owner.map(Owner::new),
    })
}

#[async_trait]
impl ReadLinkStore for MySqlLinkStore {
    async fn code_exists(&self, code_or_alias: &str) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM links
            WHERE short_code = ? OR custom_alias = ?
            LIMIT 1
            "#,
        )
        .bind(code_or_alias)
        .bind(code_or_alias)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn find_active(
        &self,
        code_or_alias: &str,
        now: Timestamp,
    ) -> Result<Option<LinkRecord>> {
        let query = format!(
            r#"
            SELECT {COLUMNS}
            FROM links
            WHERE (short_code = ? OR custom_alias = ?)
              AND (expires_at IS NULL OR expires_at > ?)
            LIMIT 1
            "#
        );

        let row = sqlx::query(&query)
            .bind(code_or_alias)
            .bind(code_or_alias)
            .bind(to_micros(now))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_any(&self, code_or_alias: &str) -> Result<Option<LinkRecord>> {
        let query = format!(
            r#"
            SELECT {COLUMNS}
            FROM links
            WHERE short_code = ? OR custom_alias = ?
            LIMIT 1
            "#
        );

        let row = sqlx::query(&query)
            .bind(code_or_alias)
            .bind(code_or_alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<LinkRecord>> {
        let query = format!("SELECT {COLUMNS} FROM links WHERE short_code = ? LIMIT 1");

        let row = sqlx::query(&query)
            .bind(short_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn search_by_url(&self, original_url: &str, owner: &Owner) -> Result<Vec<LinkRecord>> {
        let query = format!(
            r#"
            SELECT {COLUMNS}
            FROM links
            WHERE original_url = ? AND owner_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(original_url)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }
}

#[async_trait]
impl LinkStore for MySqlLinkStore {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let created_at = truncate_to_micros(Timestamp::now())?;
        let code = link.code.as_str().to_owned();

        let result = sqlx::query(
            r#"
            INSERT INTO links
                (original_url, short_code, custom_alias, created_at, expires_at, owner_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.original_url)
        .bind(&code)
        .bind(link.code.alias())
        .bind(to_micros(created_at))
        .bind(link.expires_at.map(to_micros))
        .bind(link.owner.as_ref().map(Owner::as_str))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = i64::try_from(done.last_insert_id()).map_err(|e| {
                    StorageError::InvalidData(format!("link id out of range: {e}"))
                })?;
                debug!(code = %code, id, "inserted link");
                Ok(link.into_record(LinkId(id), created_at))
            }
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(code)),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn record_access(&self, id: LinkId, at: Timestamp) -> Result<bool> {
        // One statement, so the counter and timestamp move together.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET access_count = access_count + 1, last_accessed = ?
            WHERE id = ?
            "#,
        )
        .bind(to_micros(at))
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_url(&self, id: LinkId, original_url: &str) -> Result<Option<LinkRecord>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let query = format!("SELECT {COLUMNS} FROM links WHERE id = ? FOR UPDATE");
        let row = sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        };
        let mut record = record_from_row(&row)?;

        sqlx::query("UPDATE links SET original_url = ? WHERE id = ?")
            .bind(original_url)
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        record.original_url = original_url.to_owned();
        Ok(Some(record))
    }

    async fn delete(&self, id: LinkId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
