use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Note;
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::NoteStore;
use crate::error::StoreResult;

impl SqliteStore {
    async fn list_notes(&self, owner_id: Uuid) -> StoreResult<Vec<Note>> {
        self.select_many(&STATEMENTS.note.list, Some(owner_id), scan::note)
            .await
    }
}

#[async_trait]
impl NoteStore for SqliteStore {
    async fn get_notes(&self, owner_id: Uuid, cid: &Cid) -> StoreResult<Vec<Note>> {
        observe("GetNotes", Some(owner_id), cid, self.list_notes(owner_id)).await
    }

    async fn add_note(&self, owner_id: Uuid, note: &str, cid: &Cid) -> StoreResult<Vec<Note>> {
        observe("AddNote", Some(owner_id), cid, async {
            require("note", "text", note)?;
            let now = Utc::now();
            self.insert_row("notes", |id| {
                sqlx::query(&STATEMENTS.note.add)
                    .bind(id)
                    .bind(owner_id)
                    .bind(note)
                    .bind(now)
                    .bind(now)
            })
            .await?;
            self.list_notes(owner_id).await
        })
        .await
    }

    async fn change_note(&self, note: &Note, cid: &Cid) -> StoreResult<Vec<Note>> {
        observe("ChangeNote", Some(note.id), cid, async {
            require("note", "text", &note.note)?;
            let affected = sqlx::query(&STATEMENTS.note.change)
                .bind(note.note.as_str())
                .bind(Utc::now())
                .bind(note.id)
                .bind(note.owner_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "note", note.id)?;
            self.list_notes(note.owner_id).await
        })
        .await
    }

    async fn remove_note(&self, owner_id: Uuid, note_id: Uuid, cid: &Cid) -> StoreResult<Vec<Note>> {
        observe("RemoveNote", Some(note_id), cid, async {
            let affected = sqlx::query(&STATEMENTS.note.remove)
                .bind(Utc::now())
                .bind(note_id)
                .bind(owner_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "note", note_id)?;
            self.list_notes(owner_id).await
        })
        .await
    }
}
