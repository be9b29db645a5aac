use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, touch_parent};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::{Event, Generation, Lifecycle};
use crate::db::statements::{ChildOps, Crud, STATEMENTS};
use crate::db::traits::{GenerationEventStore, GenerationStore, LifecycleEventStore, LifecycleStore};
use crate::error::StoreResult;

/// Which parent an event hangs off.
struct Owner {
    entity: &'static str,
    parent: &'static Crud,
    events: &'static ChildOps,
}

fn lifecycle_owner() -> Owner {
    Owner {
        entity: "lifecycle",
        parent: &STATEMENTS.lifecycle,
        events: &STATEMENTS.lifecycle_event,
    }
}

fn generation_owner() -> Owner {
    Owner {
        entity: "generation",
        parent: &STATEMENTS.generation,
        events: &STATEMENTS.generation_event,
    }
}

/// An event's `ctime` is when it happened; a caller that leaves it unset
/// means "now".
fn occurred_at(event: &Event, now: DateTime<Utc>) -> DateTime<Utc> {
    if event.ts.ctime == DateTime::<Utc>::default() {
        now
    } else {
        event.ts.ctime
    }
}

impl SqliteStore {
    async fn add_event_on(
        &self,
        conn: &mut SqliteConnection,
        owner: &Owner,
        owner_id: Uuid,
        event: &Event,
    ) -> StoreResult<()> {
        let now = Utc::now();
        touch_parent(conn, &owner.parent.touch, owner.entity, owner_id, now).await?;
        let ctime = occurred_at(event, now);
        self.insert_on(conn, "events", |id| {
            sqlx::query(&owner.events.add)
                .bind(id)
                .bind(event.event_type.id)
                .bind(event.humidity)
                .bind(event.temperature)
                .bind(owner_id)
                .bind(ctime)
                .bind(now)
        })
        .await?;
        Ok(())
    }

    async fn change_event_on(
        &self,
        conn: &mut SqliteConnection,
        owner: &Owner,
        owner_id: Uuid,
        event: &Event,
    ) -> StoreResult<()> {
        let now = Utc::now();
        touch_parent(conn, &owner.parent.touch, owner.entity, owner_id, now).await?;
        let affected = sqlx::query(&owner.events.change)
            .bind(event.event_type.id)
            .bind(event.humidity)
            .bind(event.temperature)
            .bind(now)
            .bind(event.id)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        expect_affected(affected, "event", event.id)
    }

    async fn remove_event_on(
        &self,
        conn: &mut SqliteConnection,
        owner: &Owner,
        owner_id: Uuid,
        event_id: Uuid,
    ) -> StoreResult<()> {
        let now = Utc::now();
        touch_parent(conn, &owner.parent.touch, owner.entity, owner_id, now).await?;
        let affected = sqlx::query(&owner.events.remove)
            .bind(now)
            .bind(event_id)
            .bind(owner_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        expect_affected(affected, "event", event_id)
    }
}

#[async_trait]
impl LifecycleEventStore for SqliteStore {
    async fn add_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Lifecycle> {
        observe("AddLifecycleEvent", Some(lifecycle_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.add_event_on(&mut tx, &lifecycle_owner(), lifecycle_id, event)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_lifecycle(lifecycle_id, cid).await
    }

    async fn change_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Lifecycle> {
        observe("ChangeLifecycleEvent", Some(lifecycle_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.change_event_on(&mut tx, &lifecycle_owner(), lifecycle_id, event)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_lifecycle(lifecycle_id, cid).await
    }

    async fn remove_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Lifecycle> {
        observe("RemoveLifecycleEvent", Some(lifecycle_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.remove_event_on(&mut tx, &lifecycle_owner(), lifecycle_id, event_id)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_lifecycle(lifecycle_id, cid).await
    }
}

#[async_trait]
impl GenerationEventStore for SqliteStore {
    async fn add_generation_event(
        &self,
        generation_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("AddGenerationEvent", Some(generation_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.add_event_on(&mut tx, &generation_owner(), generation_id, event)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }

    async fn change_generation_event(
        &self,
        generation_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("ChangeGenerationEvent", Some(generation_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.change_event_on(&mut tx, &generation_owner(), generation_id, event)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }

    async fn remove_generation_event(
        &self,
        generation_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation> {
        observe("RemoveGenerationEvent", Some(generation_id), cid, async {
            let mut tx = self.pool.begin().await?;
            self.remove_event_on(&mut tx, &generation_owner(), generation_id, event_id)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_generation(generation_id, cid).await
    }
}
