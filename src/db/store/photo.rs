use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Photo;
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::PhotoStore;
use crate::error::StoreResult;

impl SqliteStore {
    async fn list_photos(&self, owner_id: Uuid) -> StoreResult<Vec<Photo>> {
        self.select_many(&STATEMENTS.photo.list, Some(owner_id), scan::photo)
            .await
    }
}

#[async_trait]
impl PhotoStore for SqliteStore {
    async fn get_photos(&self, owner_id: Uuid, cid: &Cid) -> StoreResult<Vec<Photo>> {
        observe("GetPhotos", Some(owner_id), cid, self.list_photos(owner_id)).await
    }

    async fn add_photo(&self, owner_id: Uuid, filename: &str, cid: &Cid) -> StoreResult<Vec<Photo>> {
        observe("AddPhoto", Some(owner_id), cid, async {
            require("photo", "filename", filename)?;
            let now = Utc::now();
            self.insert_row("photos", |id| {
                sqlx::query(&STATEMENTS.photo.add)
                    .bind(id)
                    .bind(owner_id)
                    .bind(filename)
                    .bind(now)
                    .bind(now)
            })
            .await?;
            self.list_photos(owner_id).await
        })
        .await
    }

    async fn change_photo(&self, photo: &Photo, cid: &Cid) -> StoreResult<Vec<Photo>> {
        observe("ChangePhoto", Some(photo.id), cid, async {
            require("photo", "filename", &photo.filename)?;
            let affected = sqlx::query(&STATEMENTS.photo.change)
                .bind(photo.filename.as_str())
                .bind(Utc::now())
                .bind(photo.id)
                .bind(photo.owner_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "photo", photo.id)?;
            self.list_photos(photo.owner_id).await
        })
        .await
    }

    async fn remove_photo(
        &self,
        owner_id: Uuid,
        photo_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Vec<Photo>> {
        observe("RemovePhoto", Some(photo_id), cid, async {
            let affected = sqlx::query(&STATEMENTS.photo.remove)
                .bind(Utc::now())
                .bind(photo_id)
                .bind(owner_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "photo", photo_id)?;
            self.list_photos(owner_id).await
        })
        .await
    }
}
