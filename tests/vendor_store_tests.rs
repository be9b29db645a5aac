mod common;

use cffc::StoreError;
use cffc::db::{Timestamper, Vendor, VendorStore};
use common::{cid, store};
use uuid::Uuid;

fn vendor(name: &str) -> Vendor {
    Vendor {
        name: name.to_string(),
        website: format!("https://{name}.test"),
        ..Vendor::default()
    }
}

#[tokio::test]
async fn insert_then_select_round_trips() {
    let store = store("vendor-roundtrip").await;
    let cid = cid();

    let inserted = store.insert_vendor(&vendor("alpha"), &cid).await.unwrap();
    assert_ne!(inserted.id, Uuid::nil());
    assert_eq!(inserted.name, "alpha");
    assert_eq!(inserted.website, "https://alpha.test");
    assert_eq!(inserted.ts.ctime, inserted.ts.mtime);
    assert!(inserted.ts.dtime.is_none());

    let selected = store.select_vendor(inserted.id, &cid).await.unwrap();
    assert_eq!(selected, inserted);
}

#[tokio::test]
async fn update_stamps_mtime_and_keeps_ctime() {
    let store = store("vendor-update").await;
    let cid = cid();
    let inserted = store.insert_vendor(&vendor("beta"), &cid).await.unwrap();

    let mut changed = inserted.clone();
    changed.website = "https://beta.example".to_string();
    let updated = store.update_vendor(&changed, &cid).await.unwrap();

    assert_eq!(updated.website, "https://beta.example");
    assert_eq!(updated.ts.ctime, inserted.ts.ctime);
    assert!(updated.ts.mtime >= inserted.ts.mtime);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let store = store("vendor-update-missing").await;
    let mut ghost = vendor("ghost");
    ghost.id = Uuid::new_v4();

    let err = store.update_vendor(&ghost, &cid()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "vendor", .. }));
}

#[tokio::test]
async fn soft_delete_hides_row_until_undeleted() {
    let store = store("vendor-soft-delete").await;
    let cid = cid();
    let keep = store.insert_vendor(&vendor("keep"), &cid).await.unwrap();
    let gone = store.insert_vendor(&vendor("gone"), &cid).await.unwrap();

    store.delete_vendor(gone.id, &cid).await.unwrap();

    let err = store.select_vendor(gone.id, &cid).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    let all = store.select_all_vendors(&cid).await.unwrap();
    assert_eq!(all.iter().map(|v| v.id).collect::<Vec<_>>(), vec![keep.id]);

    // A second delete finds no live row.
    let err = store.delete_vendor(gone.id, &cid).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    store.undelete("vendors", gone.id, &cid).await.unwrap();
    let back = store.select_vendor(gone.id, &cid).await.unwrap();
    assert_eq!(back.name, "gone");
    assert!(back.ts.dtime.is_none());
    assert_eq!(store.select_all_vendors(&cid).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_name_is_a_constraint_violation() {
    let store = store("vendor-duplicate").await;
    let cid = cid();
    store.insert_vendor(&vendor("twin"), &cid).await.unwrap();

    let err = store.insert_vendor(&vendor("twin"), &cid).await.unwrap_err();
    match err {
        StoreError::Constraint { op, message } => {
            assert_eq!(op, "InsertVendor");
            assert!(message.contains("vendors.name"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_name_is_rejected_before_sql() {
    let store = store("vendor-empty").await;
    let err = store.insert_vendor(&vendor("  "), &cid()).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
