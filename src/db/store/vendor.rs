use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SqliteStore, expect_affected, require};
use crate::cid::Cid;
use crate::db::access::observe;
use crate::db::models::Vendor;
use crate::db::scan;
use crate::db::statements::{STATEMENTS, alias};
use crate::db::traits::VendorStore;
use crate::error::StoreResult;

#[async_trait]
impl VendorStore for SqliteStore {
    async fn select_all_vendors(&self, cid: &Cid) -> StoreResult<Vec<Vendor>> {
        observe("SelectAllVendors", None, cid, async {
            self.select_many(&STATEMENTS.vendor.select_all, None, |row| {
                scan::vendor(row, alias::VENDOR)
            })
            .await
        })
        .await
    }

    async fn select_vendor(&self, id: Uuid, cid: &Cid) -> StoreResult<Vendor> {
        observe("SelectVendor", Some(id), cid, async {
            self.select_one(&STATEMENTS.vendor.select, id, "vendor", |row| {
                scan::vendor(row, alias::VENDOR)
            })
            .await
        })
        .await
    }

    async fn insert_vendor(&self, vendor: &Vendor, cid: &Cid) -> StoreResult<Vendor> {
        let id = observe("InsertVendor", None, cid, async {
            require("vendor", "name", &vendor.name)?;
            let now = Utc::now();
            self.insert_row("vendors", |id| {
                sqlx::query(&STATEMENTS.vendor.insert)
                    .bind(id)
                    .bind(vendor.name.as_str())
                    .bind(vendor.website.as_str())
                    .bind(now)
                    .bind(now)
            })
            .await
        })
        .await?;
        self.select_vendor(id, cid).await
    }

    async fn update_vendor(&self, vendor: &Vendor, cid: &Cid) -> StoreResult<Vendor> {
        observe("UpdateVendor", Some(vendor.id), cid, async {
            require("vendor", "name", &vendor.name)?;
            let affected = sqlx::query(&STATEMENTS.vendor.update)
                .bind(vendor.name.as_str())
                .bind(vendor.website.as_str())
                .bind(Utc::now())
                .bind(vendor.id)
                .execute(&self.pool)
                .await?
                .rows_affected();
            expect_affected(affected, "vendor", vendor.id)
        })
        .await?;
        self.select_vendor(vendor.id, cid).await
    }

    async fn delete_vendor(&self, id: Uuid, cid: &Cid) -> StoreResult<()> {
        observe("DeleteVendor", Some(id), cid, async {
            self.soft_delete(&STATEMENTS.vendor.delete, "vendor", id).await
        })
        .await
    }
}
