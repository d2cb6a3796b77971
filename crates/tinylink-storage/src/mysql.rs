use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tinylink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use tinylink_core::{ContentHash, ShortCode, StorageError};
use tracing::debug;

/// DDL for the `short_urls` table.
///
/// Both `short_code` and `url_hash` carry a `UNIQUE` key. The one on
/// `url_hash` is what turns a lost shorten race into a duplicate key error
/// instead of a second record for the same URL.
pub const SHORT_URLS_DDL: &str = include_str!("../ddl/mysql/short_urls.sql");

/// MySQL implementation of the repository contract.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SHORT_URLS_DDL)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("short_urls schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_created_at(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", seconds))
    })
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

fn record_from_row(row: MySqlRow) -> Result<UrlRecord> {
    let code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let url_hash: String = row.try_get("url_hash").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(UrlRecord {
        code: ShortCode::new_unchecked(code),
        original_url,
        content_hash: ContentHash::from_hex_unchecked(url_hash),
        created_at: parse_created_at(created_at)?,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, original_url, url_hash, created_at
            FROM short_urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(record_from_row).transpose()
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, original_url, url_hash, created_at
            FROM short_urls
            WHERE url_hash = ?
            LIMIT 1
            "#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(record_from_row).transpose()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(
        &self,
        code: &ShortCode,
        original_url: &str,
        content_hash: &ContentHash,
    ) -> Result<UrlRecord> {
        let created_at = Timestamp::now();

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, url_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(code.as_str())
        .bind(original_url)
        .bind(content_hash.as_str())
        .bind(created_at.as_second())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(UrlRecord {
                code: code.clone(),
                original_url: original_url.to_owned(),
                content_hash: content_hash.clone(),
                created_at: parse_created_at(created_at.as_second())?,
            }),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(err.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}
