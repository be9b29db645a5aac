//! Persistence: schema, statements, row reconstruction and the accessor traits.
//!
//! Layout:
//! - `schema.rs`: SQL DDL applied at startup (SQLite)
//! - `statements.rs`: every statement the accessors run, built once
//! - `reconstruct.rs` / `scan.rs`: joined rows -> nested aggregates
//! - `ids.rs`: identifier generation and the collision retry loop
//! - `timestamps.rs` / `tables.rs`: timestamp patching, undelete, table allow-list
//! - `traits.rs` / `store/`: accessor families and their SQLite implementation

pub mod access;
pub mod ids;
pub mod models;
pub mod pool;
pub mod reconstruct;
pub mod scan;
pub mod schema;
pub mod statements;
pub mod store;
pub mod tables;
pub mod timestamps;
pub mod traits;

pub use ids::{DEFAULT_INSERT_ATTEMPTS, IdGenerator, RandomIds};
pub use models::{
    Event, EventType, Generation, Ingredient, Lifecycle, Note, Photo, Source, SourceOrigin, Stage,
    Strain, StrainAttribute, Substrate, SubstrateType, Timestamps, Vendor,
};
pub use pool::{apply_schema, connect};
pub use schema::SQLITE_INIT;
pub use store::SqliteStore;
pub use timestamps::{TimestampPatch, TimestampValues};
pub use traits::{
    EventTypeStore, GenerationEventStore, GenerationStore, IngredientStore,
    LifecycleEventStore, LifecycleStore, NoteStore, PhotoStore, SourceStore, StageStore, Store,
    StrainAttributeStore, StrainStore, SubstrateIngredientStore, SubstrateStore, Timestamper,
    VendorStore,
};
