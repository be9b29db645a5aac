//! One accessor trait per entity family.
//!
//! Every method takes the caller's correlation id and returns a fully
//! populated domain value. Soft-deleted rows are invisible to selects.

use async_trait::async_trait;
use uuid::Uuid;

use super::models::{
    Event, EventType, Generation, Ingredient, Lifecycle, Note, Photo, Source, Stage, Strain,
    StrainAttribute, Substrate, Vendor,
};
use super::timestamps::TimestampPatch;
use crate::cid::Cid;
use crate::error::StoreResult;

#[async_trait]
pub trait VendorStore: Send + Sync {
    async fn select_all_vendors(&self, cid: &Cid) -> StoreResult<Vec<Vendor>>;
    async fn select_vendor(&self, id: Uuid, cid: &Cid) -> StoreResult<Vendor>;
    async fn insert_vendor(&self, vendor: &Vendor, cid: &Cid) -> StoreResult<Vendor>;
    async fn update_vendor(&self, vendor: &Vendor, cid: &Cid) -> StoreResult<Vendor>;
    async fn delete_vendor(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait StageStore: Send + Sync {
    async fn select_all_stages(&self, cid: &Cid) -> StoreResult<Vec<Stage>>;
    async fn select_stage(&self, id: Uuid, cid: &Cid) -> StoreResult<Stage>;
    async fn insert_stage(&self, stage: &Stage, cid: &Cid) -> StoreResult<Stage>;
    async fn update_stage(&self, stage: &Stage, cid: &Cid) -> StoreResult<Stage>;
    async fn delete_stage(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait EventTypeStore: Send + Sync {
    async fn select_all_event_types(&self, cid: &Cid) -> StoreResult<Vec<EventType>>;
    async fn select_event_type(&self, id: Uuid, cid: &Cid) -> StoreResult<EventType>;
    async fn insert_event_type(&self, event_type: &EventType, cid: &Cid) -> StoreResult<EventType>;
    async fn update_event_type(&self, event_type: &EventType, cid: &Cid) -> StoreResult<EventType>;
    async fn delete_event_type(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait IngredientStore: Send + Sync {
    async fn select_all_ingredients(&self, cid: &Cid) -> StoreResult<Vec<Ingredient>>;
    async fn select_ingredient(&self, id: Uuid, cid: &Cid) -> StoreResult<Ingredient>;
    async fn insert_ingredient(&self, ingredient: &Ingredient, cid: &Cid) -> StoreResult<Ingredient>;
    async fn update_ingredient(&self, ingredient: &Ingredient, cid: &Cid) -> StoreResult<Ingredient>;
    async fn delete_ingredient(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait SubstrateStore: Send + Sync {
    async fn select_all_substrates(&self, cid: &Cid) -> StoreResult<Vec<Substrate>>;
    async fn select_substrate(&self, id: Uuid, cid: &Cid) -> StoreResult<Substrate>;
    async fn insert_substrate(&self, substrate: &Substrate, cid: &Cid) -> StoreResult<Substrate>;
    async fn update_substrate(&self, substrate: &Substrate, cid: &Cid) -> StoreResult<Substrate>;
    async fn delete_substrate(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

/// Ingredient membership of a substrate. Each call returns the substrate as
/// it reads after the change.
#[async_trait]
pub trait SubstrateIngredientStore: Send + Sync {
    async fn add_ingredient(
        &self,
        substrate_id: Uuid,
        ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate>;
    async fn change_ingredient(
        &self,
        substrate_id: Uuid,
        old_ingredient_id: Uuid,
        new_ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate>;
    async fn remove_ingredient(
        &self,
        substrate_id: Uuid,
        ingredient_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Substrate>;
}

#[async_trait]
pub trait StrainStore: Send + Sync {
    async fn select_all_strains(&self, cid: &Cid) -> StoreResult<Vec<Strain>>;
    async fn select_strain(&self, id: Uuid, cid: &Cid) -> StoreResult<Strain>;
    async fn insert_strain(&self, strain: &Strain, cid: &Cid) -> StoreResult<Strain>;
    async fn update_strain(&self, strain: &Strain, cid: &Cid) -> StoreResult<Strain>;
    async fn delete_strain(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait StrainAttributeStore: Send + Sync {
    /// Distinct names of live attributes across all strains, sorted.
    async fn known_attribute_names(&self, cid: &Cid) -> StoreResult<Vec<String>>;
    async fn add_attribute(
        &self,
        strain_id: Uuid,
        name: &str,
        value: &str,
        cid: &Cid,
    ) -> StoreResult<Strain>;
    async fn change_attribute(
        &self,
        strain_id: Uuid,
        attribute: &StrainAttribute,
        cid: &Cid,
    ) -> StoreResult<Strain>;
    async fn remove_attribute(
        &self,
        strain_id: Uuid,
        attribute_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Strain>;
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// All live lifecycles without their events.
    async fn select_lifecycle_index(&self, cid: &Cid) -> StoreResult<Vec<Lifecycle>>;
    async fn select_lifecycle(&self, id: Uuid, cid: &Cid) -> StoreResult<Lifecycle>;
    async fn insert_lifecycle(&self, lifecycle: &Lifecycle, cid: &Cid) -> StoreResult<Lifecycle>;
    async fn update_lifecycle(&self, lifecycle: &Lifecycle, cid: &Cid) -> StoreResult<Lifecycle>;
    async fn delete_lifecycle(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait LifecycleEventStore: Send + Sync {
    async fn add_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Lifecycle>;
    async fn change_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Lifecycle>;
    async fn remove_lifecycle_event(
        &self,
        lifecycle_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Lifecycle>;
}

#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// All live generations with their sources; events are not loaded.
    async fn select_generation_index(&self, cid: &Cid) -> StoreResult<Vec<Generation>>;
    async fn select_generation(&self, id: Uuid, cid: &Cid) -> StoreResult<Generation>;
    async fn insert_generation(&self, generation: &Generation, cid: &Cid) -> StoreResult<Generation>;
    async fn update_generation(&self, generation: &Generation, cid: &Cid) -> StoreResult<Generation>;
    async fn delete_generation(&self, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

#[async_trait]
pub trait GenerationEventStore: Send + Sync {
    async fn add_generation_event(
        &self,
        generation_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Generation>;
    async fn change_generation_event(
        &self,
        generation_id: Uuid,
        event: &Event,
        cid: &Cid,
    ) -> StoreResult<Generation>;
    async fn remove_generation_event(
        &self,
        generation_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation>;
}

#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn add_strain_source(
        &self,
        generation_id: Uuid,
        strain_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation>;
    /// The event must belong to `lifecycle_id`.
    async fn add_event_source(
        &self,
        generation_id: Uuid,
        lifecycle_id: Uuid,
        event_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation>;
    async fn change_source(
        &self,
        generation_id: Uuid,
        source: &Source,
        cid: &Cid,
    ) -> StoreResult<Generation>;
    async fn remove_source(
        &self,
        generation_id: Uuid,
        source_id: Uuid,
        cid: &Cid,
    ) -> StoreResult<Generation>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get_notes(&self, owner_id: Uuid, cid: &Cid) -> StoreResult<Vec<Note>>;
    async fn add_note(&self, owner_id: Uuid, note: &str, cid: &Cid) -> StoreResult<Vec<Note>>;
    async fn change_note(&self, note: &Note, cid: &Cid) -> StoreResult<Vec<Note>>;
    async fn remove_note(&self, owner_id: Uuid, note_id: Uuid, cid: &Cid) -> StoreResult<Vec<Note>>;
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn get_photos(&self, owner_id: Uuid, cid: &Cid) -> StoreResult<Vec<Photo>>;
    async fn add_photo(&self, owner_id: Uuid, filename: &str, cid: &Cid) -> StoreResult<Vec<Photo>>;
    async fn change_photo(&self, photo: &Photo, cid: &Cid) -> StoreResult<Vec<Photo>>;
    async fn remove_photo(&self, owner_id: Uuid, photo_id: Uuid, cid: &Cid)
    -> StoreResult<Vec<Photo>>;
}

/// Administrative timestamp control over any allow-listed table.
#[async_trait]
pub trait Timestamper: Send + Sync {
    async fn patch_timestamps(
        &self,
        table: &str,
        id: Uuid,
        patch: &TimestampPatch,
        cid: &Cid,
    ) -> StoreResult<()>;
    async fn undelete(&self, table: &str, id: Uuid, cid: &Cid) -> StoreResult<()>;
}

/// Every accessor family behind one object.
pub trait Store:
    VendorStore
    + StageStore
    + EventTypeStore
    + IngredientStore
    + SubstrateStore
    + SubstrateIngredientStore
    + StrainStore
    + StrainAttributeStore
    + LifecycleStore
    + LifecycleEventStore
    + GenerationStore
    + GenerationEventStore
    + SourceStore
    + NoteStore
    + PhotoStore
    + Timestamper
{
}

impl<T> Store for T where
    T: VendorStore
        + StageStore
        + EventTypeStore
        + IngredientStore
        + SubstrateStore
        + SubstrateIngredientStore
        + StrainStore
        + StrainAttributeStore
        + LifecycleStore
        + LifecycleEventStore
        + GenerationStore
        + GenerationEventStore
        + SourceStore
        + NoteStore
        + PhotoStore
        + Timestamper
{
}
