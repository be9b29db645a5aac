#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use cffc::Cid;
use cffc::config::DatabaseConfig;
use cffc::db::{
    EventType, EventTypeStore, IdGenerator, Stage, StageStore, Strain, StrainStore, Substrate,
    SubstrateStore, SubstrateType, Vendor, VendorStore,
};
use cffc::SqliteStore;
use uuid::Uuid;

pub fn cid() -> Cid {
    Cid::from("test-cid")
}

fn temp_database_url(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "cffc-{tag}-{}-{nanos}.sqlite",
        std::process::id()
    ));
    format!("sqlite:{}", temp_path.display())
}

pub async fn store(tag: &str) -> SqliteStore {
    let cfg = DatabaseConfig {
        database_url: temp_database_url(tag),
        ..DatabaseConfig::default()
    };
    let pool = cffc::db::connect(&cfg).await.expect("connect temp database");
    SqliteStore::new(pool)
}

/// Hands out `Uuid::from_u128(1)`, `2`, ... so ids sort in creation order.
#[derive(Default)]
pub struct SequentialIds(Mutex<u128>);

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> Uuid {
        let mut next = self.0.lock().unwrap();
        *next += 1;
        Uuid::from_u128(*next)
    }
}

/// Replays a fixed list of ids, then falls back to random ones; counts draws.
#[derive(Default)]
pub struct ScriptedIds {
    script: Mutex<VecDeque<Uuid>>,
    drawn: AtomicUsize,
}

impl ScriptedIds {
    pub fn new(ids: &[Uuid]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(ids.iter().copied().collect()),
            drawn: AtomicUsize::new(0),
        })
    }

    pub fn drawn(&self) -> usize {
        self.drawn.load(Ordering::SeqCst)
    }
}

impl IdGenerator for ScriptedIds {
    fn new_id(&self) -> Uuid {
        self.drawn.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Uuid::new_v4)
    }
}

/// Reference rows most aggregates point at.
pub struct Fixtures {
    pub vendor: Vendor,
    pub grain: Substrate,
    pub bulk: Substrate,
    pub plating: Substrate,
    pub liquid: Substrate,
    pub strain: Strain,
    pub stage: Stage,
    pub event_type: EventType,
}

async fn substrate(store: &SqliteStore, vendor: &Vendor, name: &str, kind: SubstrateType) -> Substrate {
    store
        .insert_substrate(
            &Substrate {
                name: name.to_string(),
                kind,
                vendor: vendor.clone(),
                ..Substrate::default()
            },
            &cid(),
        )
        .await
        .expect("insert substrate")
}

pub async fn seed(store: &SqliteStore) -> Fixtures {
    let cid = cid();
    let vendor = store
        .insert_vendor(
            &Vendor {
                name: "Mycelium Supply".to_string(),
                website: "https://example.test".to_string(),
                ..Vendor::default()
            },
            &cid,
        )
        .await
        .expect("insert vendor");

    let grain = substrate(store, &vendor, "Rye", SubstrateType::Grain).await;
    let bulk = substrate(store, &vendor, "Coco coir", SubstrateType::Bulk).await;
    let plating = substrate(store, &vendor, "MEA", SubstrateType::Plating).await;
    let liquid = substrate(store, &vendor, "LME", SubstrateType::Liquid).await;

    let strain = store
        .insert_strain(
            &Strain {
                name: "Golden Teacher".to_string(),
                species: "P. cubensis".to_string(),
                vendor: vendor.clone(),
                ..Strain::default()
            },
            &cid,
        )
        .await
        .expect("insert strain");

    let stage = store
        .insert_stage(
            &Stage {
                name: "Colonization".to_string(),
                ..Stage::default()
            },
            &cid,
        )
        .await
        .expect("insert stage");

    let event_type = store
        .insert_event_type(
            &EventType {
                name: "Contamination".to_string(),
                severity: "fatal".to_string(),
                stage: stage.clone(),
                ..EventType::default()
            },
            &cid,
        )
        .await
        .expect("insert event type");

    Fixtures {
        vendor,
        grain,
        bulk,
        plating,
        liquid,
        strain,
        stage,
        event_type,
    }
}
