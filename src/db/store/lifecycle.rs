use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Lifecycle;
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::LifecycleStore;
use crate::error::StoreResult;

#[async_trait]
impl LifecycleStore for SqliteStore {
    async fn select_lifecycle_index(&self, cid: &Cid) -> StoreResult<Vec<Lifecycle>> {
        observe("SelectLifecycleIndex", None, cid, async {
            self.select_many(&STATEMENTS.lifecycle.select_all, None, scan::lifecycle)
                .await
        })
        .await
    }

    async fn select_lifecycle(&self, id: Uuid, cid: &Cid) -> StoreResult<Lifecycle> {
        observe("SelectLifecycle", Some(id), cid, async {
            self.select_nested(
                &STATEMENTS.lifecycle.select,
                id,
                "lifecycle",
                scan::lifecycle_with_event,
            )
            .await
        })
        .await
    }

    async fn insert_lifecycle(&self, lifecycle: &Lifecycle, cid: &Cid) -> StoreResult<Lifecycle> {
        let id = observe("InsertLifecycle", None, cid, async {
            require("lifecycle", "location", &lifecycle.location)?;
            let now = Utc::now();
            self.insert_row("lifecycles", |id| {
                sqlx::query(&STATEMENTS.lifecycle.insert)
                    .bind(id)
                    .bind(lifecycle.location.as_str())
                    .bind(lifecycle.strain.id)
                    .bind(lifecycle.grain_substrate.id)
                    .bind(lifecycle.bulk_substrate.id)
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_lifecycle(id, cid).await
    }

    async fn update_lifecycle(&self, lifecycle: &Lifecycle, cid: &Cid) -> StoreResult<Lifecycle> {
        observe("UpdateLifecycle", Some(lifecycle.id), cid, async {
            require("lifecycle", "location", &lifecycle.location)?;
            let affected = sqlx::query(&STATEMENTS.lifecycle.update)
                .bind(lifecycle.location.as_str())
                .bind(lifecycle.strain.id)
                .bind(lifecycle.grain_substrate.id)
                .bind(lifecycle.bulk_substrate.id)
                .bind(Utc::now())
                .bind(lifecycle.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "lifecycle", lifecycle.id)
        })
        .await?;
        self.select_lifecycle(lifecycle.id, cid).await
    }

    async fn delete_lifecycle(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteLifecycle", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.lifecycle.delete, "lifecycle", id)
                .await
        })
        .await
    }
}
