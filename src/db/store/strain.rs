use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require, touch_parent};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::{Strain, StrainAttribute};
use crate::db::scan;
use crate::db::statements::STATEMENTS;
use crate::db::traits::{StrainAttributeStore, StrainStore};
use crate::error::StoreResult;

#[async_trait]
impl StrainStore for SqliteStore {
    async fn select_all_strains(&self, cid: &Cid) -> StoreResult<Vec<Strain>> {
        observe("SelectAllStrains", None, cid, async {
            self.select_all_nested(&STATEMENTS.strain.select_all, scan::strain_with_attribute)
                .await
        })
        .await
    }

    async fn select_strain(&self, id: Uuid, cid: &Cid) -> StoreResult<Strain> {
        observe("SelectStrain", Some(id), cid, async {
            self.select_nested(
                &STATEMENTS.strain.select,
                id,
                "strain",
                scan::strain_with_attribute,
            )
            .await
        })
        .await
    }

    async fn insert_strain(&self, strain: &Strain, cid: &Cid) -> StoreResult<Strain> {
        let id = observe("InsertStrain", None, cid, async {
            require("strain", "name", &strain.name)?;
            let now = Utc::now();
            self.insert_row("strains", |id| {
                sqlx::query(&STATEMENTS.strain.insert)
                    .bind(id)
                    .bind(strain.name.as_str())
                    .bind(strain.species.as_str())
                    .bind(strain.vendor.id)
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_strain(id, cid).await
    }

    async fn update_strain(&self, strain: &Strain, cid: &Cid) -> StoreResult<Strain> {
        observe("UpdateStrain", Some(strain.id), cid, async {
            require("strain", "name", &strain.name)?;
            let affected = sqlx::query(&STATEMENTS.strain.update)
                .bind(strain.name.as_str())
                .bind(strain.species.as_str())
                .bind(strain.vendor.id)
                .bind(Utc::now())
                .bind(strain.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "strain", strain.id)
        })
        .await?;
        self.select_strain(strain.id, cid).await
    }

    async fn delete_strain(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteStrain", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.strain.delete, "strain", id).await
        })
        .await
    }
}

#[async_trait]
impl StrainAttributeStore for SqliteStore {
    async fn known_attribute_names(&self, cid: &Cid) -> StoreResult<Vec<String>> {
        observe("KnownAttributeNames", None, cid, async {
            let names = sqlx::query_scalar::<_, String>(&STATEMENTS.attribute_names)
                .fetch_all(&self.pool)
                .await?;
            Ok(names)
        })
        .await
    }

    async fn add_attribute(
        &self,
        strain_id: Uuid,
        name: &str,
        value: &str,
        cid: &Cid,
    ) -> StoreResult<Strain> {
        observe("AddAttribute", Some(strain_id), cid, async {
            require("attribute", "name", name)?;
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(&mut tx, &STATEMENTS.strain.touch, "strain", strain_id, now).await?;
            self.insert_on(&mut tx, "strain_attributes", |id| {
                sqlx::query(&STATEMENTS.strain_attribute.add)
                    .bind(id)
                    .bind(strain_id)
                    .bind(name)
                    .bind(value)
                    .bind(now)
                    .bind(now)
            })
            .await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_strain(strain_id, cid).await
    }

    async fn change_attribute(
        &self,
        strain_id: Uuid,
        attribute: &StrainAttribute,
        cid: &Cid,
    ) -> StoreResult<Strain> {
        observe("ChangeAttribute", Some(strain_id), cid, async {
            require("attribute", "name", &attribute.name)?;
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(&mut tx, &STATEMENTS.strain.touch, "strain", strain_id, now).await?;
            let affected = sqlx::query(&STATEMENTS.strain_attribute.change)
                .bind(attribute.name.as_str())
                .bind(attribute.value.as_str())
                .bind(now)
                .bind(attribute.id)
                .bind(strain_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "strain attribute", attribute.id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_strain(strain_id, cid).await
    }

    async fn remove_attribute(
        &self,
        strain_id: Uuid,
        attribute_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Strain> {
        observe("RemoveAttribute", Some(strain_id), cid, async {
            let now = Utc::now();
            let mut tx = self.pool.begin().await?;
            touch_parent(&mut tx, &STATEMENTS.strain.touch, "strain", strain_id, now).await?;
            let affected = sqlx::query(&STATEMENTS.strain_attribute.remove)
                .bind(now)
                .bind(attribute_id)
                .bind(strain_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            expect_affected(affected, "strain attribute", attribute_id)?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        self.select_strain(strain_id, cid).await
    }
}
