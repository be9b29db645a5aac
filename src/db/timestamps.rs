//! Masked, optimistic overwrite of a row's ctime/mtime/dtime and undelete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::statements::STATEMENTS;
use super::tables;
use crate::error::{StoreError, StoreResult};

const FIELDS: [&str; 3] = ["ctime", "mtime", "dtime"];

/// One value per timestamp field. Absent and `null` both read as `None`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TimestampValues {
    #[serde(default)]
    pub ctime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mtime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dtime: Option<DateTime<Utc>>,
}

impl TimestampValues {
    fn get(&self, field: usize) -> Option<DateTime<Utc>> {
        match field {
            0 => self.ctime,
            1 => self.mtime,
            _ => self.dtime,
        }
    }
}

/// Overwrite request: `fields` names the columns to change, `values` the new
/// contents and `origin` what the caller last read. The write only lands if
/// every masked column still equals its origin value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimestampPatch {
    pub fields: Vec<String>,
    #[serde(default)]
    pub values: TimestampValues,
    #[serde(default)]
    pub origin: Option<TimestampValues>,
}

/// A patch that passed validation, in bind order.
#[derive(Debug, PartialEq)]
pub struct CheckedPatch {
    pub mask: usize,
    pub values: Vec<Option<DateTime<Utc>>>,
    pub origins: Vec<Option<DateTime<Utc>>>,
}

impl TimestampPatch {
    /// Checks, in order: empty mask, unknown names, duplicate names, missing
    /// origin, then missing value or origin for ctime/mtime. `dtime` may be
    /// null on either side.
    pub fn check(&self) -> StoreResult<CheckedPatch> {
        if self.fields.is_empty() {
            return Err(StoreError::validation("no timestamp fields selected"));
        }

        let mut mask = 0usize;
        let mut indices = Vec::with_capacity(self.fields.len());
        for name in &self.fields {
            let idx = FIELDS
                .iter()
                .position(|f| f == name)
                .ok_or_else(|| StoreError::validation(format!("unknown timestamp field `{name}`")))?;
            indices.push(idx);
        }
        for &idx in &indices {
            if mask & (1 << idx) != 0 {
                return Err(StoreError::validation(format!(
                    "timestamp field `{}` listed twice",
                    FIELDS[idx]
                )));
            }
            mask |= 1 << idx;
        }

        let origin = self
            .origin
            .as_ref()
            .ok_or_else(|| StoreError::validation("origin timestamps are required"))?;

        let mut values = Vec::new();
        let mut origins = Vec::new();
        for (idx, name) in FIELDS.iter().enumerate() {
            if mask & (1 << idx) == 0 {
                continue;
            }
            let (value, was) = (self.values.get(idx), origin.get(idx));
            if *name != "dtime" {
                if value.is_none() {
                    return Err(StoreError::validation(format!("new value for `{name}` is required")));
                }
                if was.is_none() {
                    return Err(StoreError::validation(format!("origin value for `{name}` is required")));
                }
            }
            values.push(value);
            origins.push(was);
        }

        Ok(CheckedPatch {
            mask,
            values,
            origins,
        })
    }
}

/// Applies `patch` to row `id` of `table`.
///
/// Returns `NotFound` when the row does not exist and `Conflict` when any
/// masked column no longer matches its origin; nothing is written in either
/// case.
pub async fn patch_timestamps(
    pool: &SqlitePool,
    table: &str,
    id: Uuid,
    patch: &TimestampPatch,
) -> StoreResult<()> {
    let spec = tables::lookup(table)?;
    let checked = patch.check()?;
    let stmts = STATEMENTS.table(spec.name)?;

    let mut tx = pool.begin().await?;
    let mut query = sqlx::query(&stmts.patch[checked.mask]);
    for value in &checked.values {
        query = query.bind(*value);
    }
    query = query.bind(id);
    for was in &checked.origins {
        query = query.bind(*was);
    }
    let affected = query.execute(&mut *tx).await?.rows_affected();

    if affected == 0 {
        let found = sqlx::query(&stmts.probe)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;
        return Err(match found {
            None => StoreError::not_found(spec.name, id),
            Some(_) => StoreError::Conflict {
                table: spec.name,
                id,
            },
        });
    }

    tx.commit().await?;
    debug!(table = spec.name, %id, mask = checked.mask, "timestamps patched");
    Ok(())
}

/// Clears `dtime` on row `id` of `table`.
pub async fn undelete(pool: &SqlitePool, table: &str, id: Uuid) -> StoreResult<()> {
    let spec = tables::lookup(table)?;
    let stmts = STATEMENTS.table(spec.name)?;

    let mut tx = pool.begin().await?;
    let affected = sqlx::query(&stmts.undelete)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if affected == 0 {
        let found = sqlx::query(&stmts.probe)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;
        return Err(match found {
            None => StoreError::not_found(spec.name, id),
            Some(_) => StoreError::NotDeleted {
                table: spec.name,
                id,
            },
        });
    }

    tx.commit().await?;
    debug!(table = spec.name, %id, "row undeleted");
    Ok(())
}
