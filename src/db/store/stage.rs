use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Stage;
use crate::db::scan;
use crate::db::statements::{STATEMENTS, alias};
use crate::db::traits::StageStore;
use crate::error::StoreResult;

#[async_trait]
impl StageStore for SqliteStore {
    async fn select_all_stages(&self, cid: &Cid) -> StoreResult<Vec<Stage>> {
        observe("SelectAllStages", None, cid, async {
            self.select_many(&STATEMENTS.stage.select_all, None, |row| {
                scan::stage(row, alias::STAGE)
            })
            .await
        })
        .await
    }

    async fn select_stage(&self, id: Uuid, cid: &Cid) -> StoreResult<Stage> {
        observe("SelectStage", Some(id), cid, async {
            self.select_one(&STATEMENTS.stage.select, id, "stage", |row| {
                scan::stage(row, alias::STAGE)
            })
            .await
        })
        .await
    }

    async fn insert_stage(&self, stage: &Stage, cid: &Cid) -> StoreResult<Stage> {
        let id = observe("InsertStage", None, cid, async {
            require("stage", "name", &stage.name)?;
            let now = Utc::now();
            self.insert_row("stages", |id| {
                sqlx::query(&STATEMENTS.stage.insert)
                    .bind(id)
                    .bind(stage.name.as_str())
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_stage(id, cid).await
    }

    async fn update_stage(&self, stage: &Stage, cid: &Cid) -> StoreResult<Stage> {
        observe("UpdateStage", Some(stage.id), cid, async {
            require("stage", "name", &stage.name)?;
            let affected = sqlx::query(&STATEMENTS.stage.update)
                .bind(stage.name.as_str())
                .bind(Utc::now())
                .bind(stage.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "stage", stage.id)
        })
        .await?;
        self.select_stage(stage.id, cid).await
    }

    async fn delete_stage(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteStage", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.stage.delete, "stage", id).await
        })
        .await
    }
}
