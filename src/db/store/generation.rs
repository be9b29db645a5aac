use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Generation;
use crate::db::reconstruct::reconstruct;
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::GenerationStore;
use crate::error::{StoreError, StoreResult};

impl SqliteStore {
    /// Generation with its sources, then its events from a second query.
    /// Both reads share one transaction so they see the same snapshot.
    pub(super) async fn load_generation(&self, id: Uuid) -> StoreResult<Generation> {
        let mut tx = self.pool.begin().await?;
        let mut found = {
            let rows = sqlx::query(&STATEMENTS.generation.select)
                .bind(id)
                .fetch(&mut *tx);
            reconstruct(rows, scan::generation_with_source).await?
        };
        if found.is_empty() {
            return Err(StoreError::not_found("generation", id));
        }
        let mut generation = found.swap_remove(0);
        generation.events = sqlx::query(&STATEMENTS.generation_events)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(scan::event)
            .collect::<StoreResult<_>>()?;
        tx.commit().await?;
        Ok(generation)
    }
}

#[async_trait]
impl GenerationStore for SqliteStore {
    async fn select_generation_index(&self, cid: &Cid) -> StoreResult<Vec<Generation>> {
        observe("SelectGenerationIndex", None, cid, async {
            self.select_all_nested(
                &STATEMENTS.generation.select_all,
                scan::generation_with_source,
            )
            .await
        })
        .await
    }

    async fn select_generation(&self, id: Uuid, cid: &Cid) -> StoreResult<Generation> {
        observe("SelectGeneration", Some(id), cid, self.load_generation(id)).await
    }

    async fn insert_generation(&self, generation: &Generation, cid: &Cid) -> StoreResult<Generation> {
        let id = observe("InsertGeneration", None, cid, async {
            let now = Utc::now();
            self.insert_row("generations", |id| {
                sqlx::query(&STATEMENTS.generation.insert)
                    .bind(id)
                    .bind(generation.plating_substrate.id)
                    .bind(generation.liquid_substrate.id)
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_generation(id, cid).await
    }

    async fn update_generation(&self, generation: &Generation, cid: &Cid) -> StoreResult<Generation> {
        observe("UpdateGeneration", Some(generation.id), cid, async {
            let affected = sqlx::query(&STATEMENTS.generation.update)
                .bind(generation.plating_substrate.id)
                .bind(generation.liquid_substrate.id)
                .bind(Utc::now())
                .bind(generation.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "generation", generation.id)
        })
        .await?;
        self.select_generation(generation.id, cid).await
    }

    async fn delete_generation(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteGeneration", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.generation.delete, "generation", id)
                .await
        })
        .await
    }
}
