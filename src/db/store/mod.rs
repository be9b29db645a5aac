//! `SqliteStore`: every accessor family over one `SqlitePool`.

mod event;
mod event_type;
mod generation;
mod ingredient;
mod lifecycle;
mod note;
mod photo;
mod source;
mod stage;
mod strain;
mod substrate;
mod timestamps;
mod vendor;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::ids::{DEFAULT_INSERT_ATTEMPTS, IdGenerator, RandomIds, insert_with_retry};
use super::reconstruct::{Aggregate, reconstruct};
use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    ids: Arc<dyn IdGenerator>,
    insert_attempts: u32,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("pool", &self.pool)
            .field("insert_attempts", &self.insert_attempts)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ids: Arc::new(RandomIds),
            insert_attempts: DEFAULT_INSERT_ATTEMPTS,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_insert_attempts(mut self, attempts: u32) -> Self {
        self.insert_attempts = attempts;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts one row into `table` outside any transaction.
    async fn insert_row<'q, F>(&self, table: &'static str, build: F) -> StoreResult<Uuid>
    where
        F: Fn(Uuid) -> Query<'q, Sqlite, SqliteArguments<'q>>,
    {
        let mut conn = self.pool.acquire().await?;
        self.insert_on(&mut conn, table, build).await
    }

    /// Inserts one row into `table` on `conn`, typically an open transaction.
    async fn insert_on<'q, F>(
        &self,
        conn: &mut SqliteConnection,
        table: &'static str,
        build: F,
    ) -> StoreResult<Uuid>
    where
        F: Fn(Uuid) -> Query<'q, Sqlite, SqliteArguments<'q>>,
    {
        insert_with_retry(conn, self.ids.as_ref(), self.insert_attempts, table, build).await
    }

    async fn select_one<T, F>(
        &self,
        sql: &'static str,
        id: Uuid,
        entity: &'static str,
        scan: F,
    ) -> StoreResult<T>
    where
        F: Fn(&SqliteRow) -> StoreResult<T>,
    {
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(entity, id))?;
        scan(&row)
    }

    async fn select_many<T, F>(&self, sql: &'static str, bind: Option<Uuid>, scan: F) -> StoreResult<Vec<T>>
    where
        F: Fn(&SqliteRow) -> StoreResult<T>,
    {
        let mut query = sqlx::query(sql);
        if let Some(id) = bind {
            query = query.bind(id);
        }
        query.fetch_all(&self.pool).await?.iter().map(scan).collect()
    }

    /// One aggregate with its child collection folded in.
    async fn select_nested<A, F>(
        &self,
        sql: &'static str,
        id: Uuid,
        entity: &'static str,
        scan: F,
    ) -> StoreResult<A>
    where
        A: Aggregate + fmt::Debug,
        F: FnMut(&SqliteRow) -> StoreResult<A>,
    {
        let rows = sqlx::query(sql).bind(id).fetch(&self.pool);
        let mut found = reconstruct(rows, scan).await?;
        match found.len() {
            0 => Err(StoreError::not_found(entity, id)),
            _ => Ok(found.swap_remove(0)),
        }
    }

    async fn select_all_nested<A, F>(&self, sql: &'static str, scan: F) -> StoreResult<Vec<A>>
    where
        A: Aggregate + fmt::Debug,
        F: FnMut(&SqliteRow) -> StoreResult<A>,
    {
        let rows = sqlx::query(sql).fetch(&self.pool);
        Ok(reconstruct(rows, scan).await?)
    }

    /// Soft delete: stamps `dtime` on a live row.
    async fn soft_delete(&self, sql: &'static str, entity: &'static str, id: Uuid) -> StoreResult<()> {
        let affected = sqlx::query(sql)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        expect_affected(affected, entity, id)
    }
}

/// Maps "no row changed" to `NotFound`.
fn expect_affected(affected: u64, entity: &'static str, id: Uuid) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::not_found(entity, id));
    }
    Ok(())
}

/// Stamps the parent's `mtime` ahead of a child mutation. A missing or
/// deleted parent surfaces as `NotFound` before the child is touched.
async fn touch_parent(
    conn: &mut SqliteConnection,
    sql: &'static str,
    entity: &'static str,
    id: Uuid,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    let affected = sqlx::query(sql)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    expect_affected(affected, entity, id)
}

fn require(entity: &str, field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{entity} {field} must not be empty")));
    }
    Ok(())
}
