use async_trait::async_trait;
use uuid::Uuid;

use super::SqliteStore;
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::timestamps::{self, TimestampPatch};
use crate::db::traits::Timestamper;
use crate::error::StoreResult;

#[async_trait]
impl Timestamper for SqliteStore {
    async fn patch_timestamps(
        &self,
        table: &str,
        id: Uuid,
        patch: &TimestampPatch,
        cid: &Cid,
    ) -> StoreResult<()> {
        observe(
            "PatchTimestamps",
            Some(id),
            cid,
            timestamps::patch_timestamps(&self.pool, table, id, patch),
        )
        .await
    }

    async fn undelete(&self, table: &str, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe(
            "Undelete",
            Some(id),
            cid,
            timestamps::undelete(&self.pool, table, id),
        )
        .await
    }
}
