use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::EventType;
use crate::db::scan;
use crate::db::statements::{STATEMENTS, alias};
use crate::db::traits::EventTypeStore;
use crate::error::StoreResult;

fn scan_event_type(row: &sqlx::sqlite::SqliteRow) -> StoreResult<EventType> {
    scan::event_type(row, alias::EVENT_TYPE, alias::EVENT_TYPE_STAGE)
}

fn check(event_type: &EventType) -> StoreResult<()> {
    require("event type", "name", &event_type.name)?;
    require("event type", "severity", &event_type.severity)
}

#[async_trait]
impl EventTypeStore for SqliteStore {
    async fn select_all_event_types(&self, cid: &Cid) -> StoreResult<Vec<EventType>> {
        observe("SelectAllEventTypes", None, cid, async {
            self.select_many(&STATEMENTS.event_type.select_all, None, scan_event_type)
                .await
        })
        .await
    }

    async fn select_event_type(&self, id: Uuid, cid: &Cid) -> StoreResult<EventType> {
        observe("SelectEventType", Some(id), cid, async {
            self.select_one(&STATEMENTS.event_type.select, id, "event type", scan_event_type)
                .await
        })
        .await
    }

    async fn insert_event_type(&self, event_type: &EventType, cid: &Cid) -> StoreResult<EventType> {
        let id = observe("InsertEventType", None, cid, async {
            check(event_type)?;
            let now = Utc::now();
            self.insert_row("event_types", |id| {
                sqlx::query(&STATEMENTS.event_type.insert)
                    .bind(id)
                    .bind(event_type.name.as_str())
                    .bind(event_type.severity.as_str())
                    .bind(event_type.stage.id)
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_event_type(id, cid).await
    }

    async fn update_event_type(&self, event_type: &EventType, cid: &Cid) -> StoreResult<EventType> {
        observe("UpdateEventType", Some(event_type.id), cid, async {
            check(event_type)?;
            let affected = sqlx::query(&STATEMENTS.event_type.update)
                .bind(event_type.name.as_str())
                .bind(event_type.severity.as_str())
                .bind(event_type.stage.id)
                .bind(Utc::now())
                .bind(event_type.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "event type", event_type.id)
        })
        .await?;
        self.select_event_type(event_type.id, cid).await
    }

    async fn delete_event_type(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteEventType", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.event_type.delete, "event type", id)
                .await
        })
        .await
    }
}
