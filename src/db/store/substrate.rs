use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require, touch_parent};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Substrate;
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::{SubstrateIngredientStore, SubstrateStore};
use crate::error::StoreResult;

#[async_trait]
impl SubstrateStore for SqliteStore {
    async fn select_all_substrates(&self, cid: &Cid) -> StoreResult<Vec<Substrate>> {
        observe("SelectAllSubstrates", None, cid, async {
            self.select_all_nested(
                &STATEMENTS.substrate.select_all,
                scan::substrate_with_ingredient,
            )
            .await
        })
        .await
    }

    async fn select_substrate(&self, id: Uuid, cid: &Cid) -> StoreResult<Substrate> {
        observe("SelectSubstrate", Some(id), cid, async {
            self.select_nested(
                &STATEMENTS.substrate.select,
                id,
                "substrate",
                scan::substrate_with_ingredient,
            )
            .await
        })
        .await
    }

    async fn insert_substrate(&self, substrate: &Substrate, cid: &Cid) -> StoreResult<Substrate> {
        let id = observe("InsertSubstrate", None, cid, async {
            require("substrate", "name", &substrate.name)?;
            let now = Utc::now();
            self.insert_row("substrates", |id| {
                sqlx::query(&STATEMENTS.substrate.insert)
                    .bind(id)
                    .bind(substrate.name.as_str())
                    .bind(substrate.kind.as_str())
                    .bind(substrate.vendor.id)
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_substrate(id, cid).await
    }

    async fn update_substrate(&self, substrate: &Substrate, cid: &Cid) -> StoreResult<Substrate> {
        observe("UpdateSubstrate", Some(substrate.id), cid, async {
            require("substrate", "name", &substrate.name)?;
            let affected = sqlx::query(&STATEMENTS.substrate.update)
                .bind(substrate.name.as_str())
                .bind(substrate.kind.as_str())
                .bind(substrate.vendor.id)
                .bind(Utc::now())
                .bind(substrate.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "substrate", substrate.id)
        })
        .await?;
        self.select_substrate(substrate.id, cid).await
    }

    async fn delete_substrate(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteSubstrate", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.substrate.delete, "substrate", id)
                .await
        })
        .await
    }
}

#[async_trait]
impl SubstrateIngredientStore for SqliteStore {
    async fn add_ingredient(
        &self,
        substrate_id: Uuid,
        ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate> {
        observe("AddIngredient", Some(substrate_id), cid, async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(
                &mut tx,
                &STATEMENTS.substrate.touch,
                "substrate",
                substrate_id,
                now,
            )
            .await?;
            self.insert_on(&mut tx, "substrate_ingredients", |id| {
                sqlx::query(&STATEMENTS.substrate_ingredient.add)
                    .bind(id)
                    .bind(substrate_id)
                    .bind(ingredient_id)
                    .bind(now)
                    .bind(now)
            })
            .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_substrate(substrate_id, cid).await
    }

    async fn change_ingredient(
        &self,
        substrate_id: Uuid,
        old_ingredient_id: Uuid,
        new_ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate> {
        observe("ChangeIngredient", Some(substrate_id), cid, async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(
                &mut tx,
                &STATEMENTS.substrate.touch,
                "substrate",
                substrate_id,
                now,
            )
            .await?;
            let affected = sqlx::query(&STATEMENTS.substrate_ingredient.change)
                .bind(new_ingredient_id)
                .bind(now)
                .bind(substrate_id)
                .bind(old_ingredient_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "substrate ingredient", old_ingredient_id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_substrate(substrate_id, cid).await
    }

    async fn remove_ingredient(
        &self,
        substrate_id: Uuid,
        ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate> {
        observe("RemoveIngredient", Some(substrate_id), cid, async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(
                &mut tx,
                &STATEMENTS.substrate.touch,
                "substrate",
                substrate_id,
                now,
            )
            .await?;
            let affected = sqlx::query(&STATEMENTS.substrate_ingredient.remove)
                .bind(now)
                .bind(substrate_id)
                .bind(ingredient_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "substrate ingredient", ingredient_id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_substrate(substrate_id, cid).await
    }
}
