mod common;

use chrono::{Duration, TimeZone, Utc};
use cffc::StoreError;
use cffc::db::{TimestampPatch, TimestampValues, Timestamper, Vendor, VendorStore};
use common::{cid, store};
use uuid::Uuid;

async fn seeded() -> (cffc::SqliteStore, Vendor) {
    let store = store("timestamps").await;
    let vendor = store
        .insert_vendor(
            &Vendor {
                name: "stamped".to_string(),
                ..Vendor::default()
            },
            &cid(),
        )
        .await
        .unwrap();
    (store, vendor)
}

fn ctime_patch(new: chrono::DateTime<Utc>, origin: chrono::DateTime<Utc>) -> TimestampPatch {
    TimestampPatch {
        fields: vec!["ctime".to_string()],
        values: TimestampValues {
            ctime: Some(new),
            ..TimestampValues::default()
        },
        origin: Some(TimestampValues {
            ctime: Some(origin),
            ..TimestampValues::default()
        }),
    }
}

#[tokio::test]
async fn fresh_origin_overwrites_only_masked_field() {
    let (store, vendor) = seeded().await;
    let backdated = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();

    store
        .patch_timestamps("vendors", vendor.id, &ctime_patch(backdated, vendor.ts.ctime), &cid())
        .await
        .unwrap();

    let after = store.select_vendor(vendor.id, &cid()).await.unwrap();
    assert_eq!(after.ts.ctime, backdated);
    assert_eq!(after.ts.mtime, vendor.ts.mtime);
    assert!(after.ts.dtime.is_none());
}

#[tokio::test]
async fn stale_origin_conflicts_and_changes_nothing() {
    let (store, vendor) = seeded().await;
    let stale = vendor.ts.ctime - Duration::seconds(60);
    let target = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();

    let err = store
        .patch_timestamps("vendors", vendor.id, &ctime_patch(target, stale), &cid())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { table: "vendors", id } if id == vendor.id));

    let after = store.select_vendor(vendor.id, &cid()).await.unwrap();
    assert_eq!(after.ts, vendor.ts);
}

fn mtime_patch(new: chrono::DateTime<Utc>, origin: chrono::DateTime<Utc>) -> TimestampPatch {
    TimestampPatch {
        fields: vec!["mtime".to_string()],
        values: TimestampValues {
            mtime: Some(new),
            ..TimestampValues::default()
        },
        origin: Some(TimestampValues {
            mtime: Some(origin),
            ..TimestampValues::default()
        }),
    }
}

#[tokio::test]
async fn reusing_a_consumed_origin_conflicts() {
    let (store, vendor) = seeded().await;
    let t1 = vendor.ts.mtime;
    let first = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();

    store
        .patch_timestamps("vendors", vendor.id, &mtime_patch(first, t1), &cid())
        .await
        .unwrap();

    let err = store
        .patch_timestamps("vendors", vendor.id, &mtime_patch(second, t1), &cid())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { table: "vendors", id } if id == vendor.id));

    let after = store.select_vendor(vendor.id, &cid()).await.unwrap();
    assert_eq!(after.ts.mtime, first);
    assert_eq!(after.ts.ctime, vendor.ts.ctime);
}

#[tokio::test]
async fn missing_row_is_not_found() {
    let (store, vendor) = seeded().await;
    let err = store
        .patch_timestamps(
            "vendors",
            Uuid::new_v4(),
            &ctime_patch(vendor.ts.ctime, vendor.ts.ctime),
            &cid(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn table_outside_allow_list_is_rejected() {
    let (store, vendor) = seeded().await;
    for table in ["sqlite_master", "vendors; DROP TABLE vendors", "Vendors"] {
        let err = store
            .patch_timestamps(
                table,
                vendor.id,
                &ctime_patch(vendor.ts.ctime, vendor.ts.ctime),
                &cid(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{table}: {err:?}");

        let err = store.undelete(table, vendor.id, &cid()).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{table}: {err:?}");
    }
    // Still there.
    store.select_vendor(vendor.id, &cid()).await.unwrap();
}

#[tokio::test]
async fn patching_dtime_soft_deletes_and_undelete_restores() {
    let (store, vendor) = seeded().await;
    let when = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
    let patch = TimestampPatch {
        fields: vec!["dtime".to_string()],
        values: TimestampValues {
            dtime: Some(when),
            ..TimestampValues::default()
        },
        origin: Some(TimestampValues::default()),
    };

    store
        .patch_timestamps("vendors", vendor.id, &patch, &cid())
        .await
        .unwrap();
    assert!(matches!(
        store.select_vendor(vendor.id, &cid()).await,
        Err(StoreError::NotFound { .. })
    ));

    store.undelete("vendors", vendor.id, &cid()).await.unwrap();
    let back = store.select_vendor(vendor.id, &cid()).await.unwrap();
    assert!(back.ts.dtime.is_none());
    assert_eq!(back.ts.mtime, vendor.ts.mtime);
}

#[tokio::test]
async fn undelete_distinguishes_missing_from_active() {
    let (store, vendor) = seeded().await;

    let err = store.undelete("vendors", vendor.id, &cid()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotDeleted { table: "vendors", .. }));

    let err = store
        .undelete("vendors", Uuid::new_v4(), &cid())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn validation_runs_before_the_database_is_touched() {
    let (store, vendor) = seeded().await;
    let patch = TimestampPatch {
        fields: vec!["ctime".to_string(), "ctime".to_string()],
        values: TimestampValues::default(),
        origin: None,
    };
    let err = store
        .patch_timestamps("vendors", vendor.id, &patch, &cid())
        .await
        .unwrap_err();
    match err {
        StoreError::Validation(message) => assert!(message.contains("listed twice"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}
