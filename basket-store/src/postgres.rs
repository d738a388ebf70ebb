//! Postgres-backed [`FileStore`].
//!
//! Queries live in [`queries`] as free functions over an explicit executor,
//! so callers can run them against the pool or inside a transaction they
//! opened with [`PgFileStore::begin`].

use async_trait::async_trait;
use basket_blob::SourceRef;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{File, FileStore, StoreResult};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// [`FileStore`] over a Postgres connection pool
#[derive(Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and wrap it. Migrations are not run.
    pub async fn connect(options: PgConnectOptions, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("metadata store migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a transaction on the pool.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn create(&self, file: &File) -> StoreResult<()> {
        queries::insert(&self.pool, file).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<File> {
        queries::fetch(&self.pool, id).await
    }

    async fn update(&self, file: &File) -> StoreResult<()> {
        queries::update(&self.pool, file).await
    }

    async fn record_download(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<File> {
        queries::increment_downloads(&self.pool, id, at).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        queries::delete(&self.pool, id).await
    }

    async fn exists_by_ref(&self, source_ref: &SourceRef) -> StoreResult<bool> {
        queries::exists_by_ref(&self.pool, source_ref).await
    }

    async fn remove_and_check_ref(&self, file: &File) -> StoreResult<bool> {
        let mut tx = self.begin().await?;
        queries::lock_ref(&mut *tx, &file.source_ref).await?;
        queries::delete(&mut *tx, file.id).await?;
        let still_referenced = queries::exists_by_ref(&mut *tx, &file.source_ref).await?;
        tx.commit().await?;

        tracing::debug!(
            file_id = %file.id,
            still_referenced,
            "removed file row"
        );
        Ok(still_referenced)
    }
}

/// Single-statement queries over any Postgres executor.
pub mod queries {
    use basket_blob::SourceRef;
    use chrono::{DateTime, Utc};
    use sqlx::postgres::PgRow;
    use sqlx::{PgExecutor, Row};
    use uuid::Uuid;

    use crate::{File, StoreError, StoreResult};

    const SELECT_COLUMNS: &str = "id, source_id, title, name, description, size, download_count, created_at, updated_at";

    // SQLSTATE for unique_violation
    const UNIQUE_VIOLATION: &str = "23505";

    pub async fn insert<'e, E>(executor: E, file: &File) -> StoreResult<()>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "INSERT INTO file (id, source_id, title, name, description, size, download_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(file.id)
        .bind(file.source_ref.as_str())
        .bind(&file.title)
        .bind(&file.name)
        .bind(&file.description)
        .bind(to_db(file.size, "size")?)
        .bind(to_db(file.download_count, "download_count")?)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(executor)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Err(StoreError::Conflict(file.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn fetch<'e, E>(executor: E, id: Uuid) -> StoreResult<File>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM file WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        row_to_file(&row)
    }

    /// Overwrite the mutable columns. `NotFound` if no row has this id.
    pub async fn update<'e, E>(executor: E, file: &File) -> StoreResult<()>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE file SET title = $2, name = $3, description = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(file.id)
        .bind(&file.title)
        .bind(&file.name)
        .bind(&file.description)
        .bind(file.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(file.id));
        }
        Ok(())
    }

    /// Bump `download_count` in place and return the updated row.
    pub async fn increment_downloads<'e, E>(executor: E, id: Uuid, at: DateTime<Utc>) -> StoreResult<File>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "UPDATE file SET download_count = download_count + 1, updated_at = $2 \
             WHERE id = $1 RETURNING {SELECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(executor)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        row_to_file(&row)
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> StoreResult<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM file WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn exists_by_ref<'e, E>(executor: E, source_ref: &SourceRef) -> StoreResult<bool>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM file WHERE source_id = $1)")
            .bind(source_ref.as_str())
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    /// Take a transaction-scoped advisory lock keyed by `source_ref`.
    /// Released on commit or rollback.
    pub async fn lock_ref<'e, E>(executor: E, source_ref: &SourceRef) -> StoreResult<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(source_ref.as_str())
            .execute(executor)
            .await?;
        Ok(())
    }

    fn row_to_file(row: &PgRow) -> StoreResult<File> {
        let source_id: String = row.try_get("source_id")?;
        let size: i64 = row.try_get("size")?;
        let download_count: i64 = row.try_get("download_count")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(File {
            id: row.try_get("id")?,
            source_ref: SourceRef::from(source_id),
            title: row.try_get("title")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            size: from_db(size, "size")?,
            download_count: from_db(download_count, "download_count")?,
            created_at,
            updated_at,
        })
    }

    fn to_db(value: u64, column: &str) -> StoreResult<i64> {
        i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
    }

    fn from_db(value: i64, column: &str) -> StoreResult<u64> {
        u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn numeric_columns_reject_out_of_range() {
            assert_eq!(to_db(5, "size").unwrap(), 5);
            assert!(matches!(to_db(u64::MAX, "size"), Err(StoreError::Corrupt(_))));
            assert_eq!(from_db(7, "size").unwrap(), 7);
            assert!(matches!(from_db(-1, "download_count"), Err(StoreError::Corrupt(m)) if m.contains("download_count")));
        }
    }
}
