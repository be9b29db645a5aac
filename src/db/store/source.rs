use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, touch_parent};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::{Generation, Source, SourceOrigin};
use crate::db::statements::STATEMENTS;
use crate::db::traits::{GenerationStore, SourceStore};
use crate::error::{StoreError, StoreResult};

/// Column values for one source row, checked against its origin.
struct SourceRow {
    origin: SourceOrigin,
    strain_id: Option<Uuid>,
    lifecycle_id: Option<Uuid>,
    event_id: Option<Uuid>,
}

impl SourceRow {
    fn from_source(source: &Source) -> StoreResult<Self> {
        let strain_id = source.strain.as_ref().map(|s| s.id);
        match (source.origin, strain_id, source.lifecycle_id, source.event_id) {
            (SourceOrigin::Strain, Some(_), _, _) => Ok(SourceRow {
                origin: SourceOrigin::Strain,
                strain_id,
                lifecycle_id: None,
                event_id: None,
            }),
            (SourceOrigin::Event, _, Some(_), Some(_)) => Ok(SourceRow {
                origin: SourceOrigin::Event,
                strain_id: None,
                lifecycle_id: source.lifecycle_id,
                event_id: source.event_id,
            }),
            (SourceOrigin::Strain, ..) => Err(StoreError::validation(
                "a strain source needs a strain",
            )),
            (SourceOrigin::Event, ..) => Err(StoreError::validation(
                "an event source needs a lifecycle and an event",
            )),
        }
    }
}

/// Stamps the generation first so the transaction holds the write lock
/// before anything reads.
async fn touch_generation(
    conn: &mut SqliteConnection,
    generation_id: Uuid,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    touch_parent(
        conn,
        &STATEMENTS.generation.touch,
        "generation",
        generation_id,
        now,
    )
    .await
}

impl SqliteStore {
    /// Inserts a source row; the caller has already touched the generation.
    async fn insert_source(
        &self,
        conn: &mut SqliteConnection,
        generation_id: Uuid,
        row: &SourceRow,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.insert_on(conn, "sources", |id| {
            sqlx::query(&STATEMENTS.source.add)
                .bind(id)
                .bind(generation_id)
                .bind(row.origin.as_str())
                .bind(row.strain_id)
                .bind(row.lifecycle_id)
                .bind(row.event_id)
                .bind(now)
                .bind(now)
        })
        .await?;
        Ok(())
    }
}

/// Fails unless `event_id` is a live event recorded on `lifecycle_id`.
async fn check_event_in_lifecycle(
    conn: &mut SqliteConnection,
    lifecycle_id: Uuid,
    event_id: Uuid,
) -> StoreResult<()> {
    let found = sqlx::query(&STATEMENTS.event_in_lifecycle)
        .bind(event_id)
        .bind(lifecycle_id)
        .fetch_optional(&mut *conn)
        .await?;
    if found.is_none() {
        return Err(StoreError::validation(format!(
            "event {event_id} is not part of lifecycle {lifecycle_id}"
        )));
    }
    Ok(())
}

#[async_trait]
impl SourceStore for SqliteStore {
    async fn add_strain_source(
        &self,
        generation_id: Uuid,
        strain_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("AddStrainSource", Some(generation_id), cid, async {
            let row = SourceRow {
                origin: SourceOrigin::Strain,
                strain_id: Some(strain_id),
                lifecycle_id: None,
                event_id: None,
            };
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_generation(&mut tx, generation_id, now).await?;
            self.insert_source(&mut tx, generation_id, &row, now).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }

    async fn add_event_source(
        &self,
        generation_id: Uuid,
        lifecycle_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("AddEventSource", Some(generation_id), cid, async {
            let row = SourceRow {
                origin: SourceOrigin::Event,
                strain_id: None,
                lifecycle_id: Some(lifecycle_id),
                event_id: Some(event_id),
            };
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_generation(&mut tx, generation_id, now).await?;
            check_event_in_lifecycle(&mut tx, lifecycle_id, event_id).await?;
            self.insert_source(&mut tx, generation_id, &row, now).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }

    async fn change_source(
        &self,
        generation_id: Uuid,
        source: &Source,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("ChangeSource", Some(generation_id), cid, async {
            let row = SourceRow::from_source(source)?;
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_generation(&mut tx, generation_id, now).await?;
            if let (SourceOrigin::Event, Some(lc), Some(ev)) =
                (row.origin, row.lifecycle_id, row.event_id)
            {
                check_event_in_lifecycle(&mut tx, lc, ev).await?;
            }
            let affected = sqlx::query(&STATEMENTS.source.change)
                .bind(row.origin.as_str())
                .bind(row.strain_id)
                .bind(row.lifecycle_id)
                .bind(row.event_id)
                .bind(now)
                .bind(source.id)
                .bind(generation_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "source", source.id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }

    async fn remove_source(
        &self,
        generation_id: Uuid,
        source_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("RemoveSource", Some(generation_id), cid, async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_generation(&mut tx, generation_id, now).await?;
            let affected = sqlx::query(&STATEMENTS.source.remove)
                .bind(now)
                .bind(source_id)
                .bind(generation_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "source", source_id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }
}
