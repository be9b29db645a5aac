mod common;

use chrono::{TimeZone, Utc};
use cffc::StoreError;
use cffc::db::{Event, Lifecycle, LifecycleEventStore, LifecycleStore};
use common::{Fixtures, cid, seed, store};
use uuid::Uuid;

fn draft(fx: &Fixtures, location: &str) -> Lifecycle {
    Lifecycle {
        location: location.to_string(),
        strain: fx.strain.clone(),
        grain_substrate: fx.grain.clone(),
        bulk_substrate: fx.bulk.clone(),
        ..Lifecycle::default()
    }
}

fn reading(fx: &Fixtures, humidity: i32, temperature: f64) -> Event {
    Event {
        event_type: fx.event_type.clone(),
        humidity,
        temperature,
        ..Event::default()
    }
}

#[tokio::test]
async fn insert_embeds_references() {
    let store = store("lc-insert").await;
    let fx = seed(&store).await;

    let lc = store.insert_lifecycle(&draft(&fx, "Tub 3"), &cid()).await.unwrap();
    assert_eq!(lc.location, "Tub 3");
    assert_eq!(lc.strain.id, fx.strain.id);
    assert_eq!(lc.strain.vendor, fx.vendor);
    assert_eq!(lc.grain_substrate.kind, fx.grain.kind);
    assert_eq!(lc.bulk_substrate.name, "Coco coir");
    assert!(lc.events.is_empty());
}

#[tokio::test]
async fn events_add_change_remove_and_touch_parent() {
    let store = store("lc-events").await;
    let fx = seed(&store).await;
    let cid = cid();
    let lc = store.insert_lifecycle(&draft(&fx, "Tent"), &cid).await.unwrap();

    let lc2 = store
        .add_lifecycle_event(lc.id, &reading(&fx, 85, 23.0), &cid)
        .await
        .unwrap();
    assert_eq!(lc2.events.len(), 1);
    assert!(lc2.ts.mtime >= lc.ts.mtime);
    let ev = lc2.events[0].clone();
    assert_eq!(ev.event_type.id, fx.event_type.id);
    assert_eq!(ev.event_type.stage.name, "Colonization");
    assert_eq!(ev.humidity, 85);

    let mut changed = ev.clone();
    changed.humidity = 92;
    changed.temperature = 24.5;
    let lc3 = store
        .change_lifecycle_event(lc.id, &changed, &cid)
        .await
        .unwrap();
    assert_eq!(lc3.events[0].humidity, 92);
    assert_eq!(lc3.events[0].temperature, 24.5);
    assert_eq!(lc3.events[0].ts.ctime, ev.ts.ctime);
    assert!(lc3.events[0].ts.mtime >= ev.ts.mtime);

    let lc4 = store
        .remove_lifecycle_event(lc.id, ev.id, &cid)
        .await
        .unwrap();
    assert!(lc4.events.is_empty());

    let err = store
        .remove_lifecycle_event(lc.id, ev.id, &cid)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "event", .. }));
}

#[tokio::test]
async fn events_are_ordered_by_when_they_happened() {
    let store = store("lc-order").await;
    let fx = seed(&store).await;
    let cid = cid();
    let lc = store.insert_lifecycle(&draft(&fx, "Rack"), &cid).await.unwrap();

    for (day, humidity) in [(3, 30), (1, 10), (2, 20)] {
        let mut ev = reading(&fx, humidity, 20.0);
        ev.ts.ctime = Utc.with_ymd_and_hms(2023, 9, day, 8, 0, 0).unwrap();
        store.add_lifecycle_event(lc.id, &ev, &cid).await.unwrap();
    }

    let lc = store.select_lifecycle(lc.id, &cid).await.unwrap();
    assert_eq!(
        lc.events.iter().map(|e| e.humidity).collect::<Vec<_>>(),
        vec![10, 20, 30]
    );
}

#[tokio::test]
async fn index_lists_live_lifecycles_without_events() {
    let store = store("lc-index").await;
    let fx = seed(&store).await;
    let cid = cid();

    let first = store.insert_lifecycle(&draft(&fx, "A"), &cid).await.unwrap();
    let second = store.insert_lifecycle(&draft(&fx, "B"), &cid).await.unwrap();
    let third = store.insert_lifecycle(&draft(&fx, "C"), &cid).await.unwrap();
    store
        .add_lifecycle_event(first.id, &reading(&fx, 50, 21.0), &cid)
        .await
        .unwrap();
    store.delete_lifecycle(second.id, &cid).await.unwrap();

    let index = store.select_lifecycle_index(&cid).await.unwrap();
    assert_eq!(
        index.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![first.id, third.id]
    );
    assert!(index.iter().all(|l| l.events.is_empty()));
}

#[tokio::test]
async fn child_calls_on_missing_or_deleted_parent_are_not_found() {
    let store = store("lc-missing").await;
    let fx = seed(&store).await;
    let cid = cid();

    let err = store
        .add_lifecycle_event(Uuid::new_v4(), &reading(&fx, 1, 1.0), &cid)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "lifecycle", .. }));

    let lc = store.insert_lifecycle(&draft(&fx, "Gone"), &cid).await.unwrap();
    store.delete_lifecycle(lc.id, &cid).await.unwrap();
    let err = store
        .add_lifecycle_event(lc.id, &reading(&fx, 1, 1.0), &cid)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "lifecycle", .. }));
}

#[tokio::test]
async fn update_rewrites_references_and_location() {
    let store = store("lc-update").await;
    let fx = seed(&store).await;
    let cid = cid();
    let lc = store.insert_lifecycle(&draft(&fx, "Old"), &cid).await.unwrap();

    let mut changed = lc.clone();
    changed.location = "New".to_string();
    changed.bulk_substrate = fx.grain.clone();
    let updated = store.update_lifecycle(&changed, &cid).await.unwrap();
    assert_eq!(updated.location, "New");
    assert_eq!(updated.bulk_substrate.id, fx.grain.id);

    changed.location = String::new();
    let err = store.update_lifecycle(&changed, &cid).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}
