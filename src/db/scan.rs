//! Row scanners for the aliased column lists produced by `db::statements`.
//!
//! Each scanner reads `<alias>_<column>` from the row. Scanners for entities
//! that embed others take one alias per embedded row.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Decode, Row, Sqlite, Type};
use uuid::Uuid;

use super::models::{
    Event, EventType, Generation, Ingredient, Lifecycle, Note, Photo, Source, SourceOrigin, Stage,
    Strain, StrainAttribute, Substrate, Timestamps, Vendor,
};
use super::reconstruct::Aggregate;
use super::statements::alias;
use crate::error::StoreResult;

fn get<'r, T>(row: &'r SqliteRow, alias: &str, col: &str) -> StoreResult<T>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    Ok(row.try_get(format!("{alias}_{col}").as_str())?)
}

/// `Some(id)` when the LEFT JOINed row behind `alias` is present.
fn present(row: &SqliteRow, alias: &str) -> StoreResult<Option<Uuid>> {
    get::<Option<Uuid>>(row, alias, "id")
}

pub fn timestamps(row: &SqliteRow, a: &str) -> StoreResult<Timestamps> {
    Ok(Timestamps {
        ctime: get::<DateTime<Utc>>(row, a, "ctime")?,
        mtime: get::<DateTime<Utc>>(row, a, "mtime")?,
        dtime: get::<Option<DateTime<Utc>>>(row, a, "dtime")?,
    })
}

pub fn vendor(row: &SqliteRow, a: &str) -> StoreResult<Vendor> {
    Ok(Vendor {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        website: get(row, a, "website")?,
        ts: timestamps(row, a)?,
    })
}

pub fn stage(row: &SqliteRow, a: &str) -> StoreResult<Stage> {
    Ok(Stage {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        ts: timestamps(row, a)?,
    })
}

pub fn event_type(row: &SqliteRow, a: &str, stage_alias: &str) -> StoreResult<EventType> {
    Ok(EventType {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        severity: get(row, a, "severity")?,
        stage: stage(row, stage_alias)?,
        ts: timestamps(row, a)?,
    })
}

pub fn ingredient(row: &SqliteRow, a: &str) -> StoreResult<Ingredient> {
    Ok(Ingredient {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        ts: timestamps(row, a)?,
    })
}

/// Substrate with its vendor; ingredients are left empty.
pub fn substrate(row: &SqliteRow, a: &str, vendor_alias: &str) -> StoreResult<Substrate> {
    Ok(Substrate {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        kind: get::<String>(row, a, "type")?.parse()?,
        vendor: vendor(row, vendor_alias)?,
        ingredients: Vec::new(),
        ts: timestamps(row, a)?,
    })
}

/// Substrate row from the substrate select, carrying at most one ingredient.
pub fn substrate_with_ingredient(row: &SqliteRow) -> StoreResult<Substrate> {
    let mut s = substrate(row, alias::SUBSTRATE, alias::SUBSTRATE_VENDOR)?;
    if present(row, alias::INGREDIENT)?.is_some() {
        s.ingredients.push(ingredient(row, alias::INGREDIENT)?);
    }
    Ok(s)
}

/// Strain with its vendor; attributes are left empty.
pub fn strain(row: &SqliteRow, a: &str, vendor_alias: &str) -> StoreResult<Strain> {
    Ok(Strain {
        id: get(row, a, "id")?,
        name: get(row, a, "name")?,
        species: get(row, a, "species")?,
        vendor: vendor(row, vendor_alias)?,
        attributes: Vec::new(),
        ts: timestamps(row, a)?,
    })
}

pub fn strain_with_attribute(row: &SqliteRow) -> StoreResult<Strain> {
    let mut s = strain(row, alias::STRAIN, alias::STRAIN_VENDOR)?;
    let a = alias::ATTRIBUTE;
    if present(row, a)?.is_some() {
        s.attributes.push(StrainAttribute {
            id: get(row, a, "id")?,
            name: get(row, a, "name")?,
            value: get(row, a, "value")?,
            ts: timestamps(row, a)?,
        });
    }
    Ok(s)
}

pub fn event(row: &SqliteRow) -> StoreResult<Event> {
    let a = alias::EVENT;
    Ok(Event {
        id: get(row, a, "id")?,
        event_type: event_type(row, alias::EVENT_EVENT_TYPE, alias::EVENT_STAGE)?,
        humidity: get(row, a, "humidity")?,
        temperature: get(row, a, "temperature")?,
        ts: timestamps(row, a)?,
    })
}

pub fn lifecycle(row: &SqliteRow) -> StoreResult<Lifecycle> {
    use alias::*;
    Ok(Lifecycle {
        id: get(row, LIFECYCLE, "id")?,
        location: get(row, LIFECYCLE, "location")?,
        strain: strain(row, LC_STRAIN, LC_STRAIN_VENDOR)?,
        grain_substrate: substrate(row, GRAIN, GRAIN_VENDOR)?,
        bulk_substrate: substrate(row, BULK, BULK_VENDOR)?,
        events: Vec::new(),
        ts: timestamps(row, LIFECYCLE)?,
    })
}

pub fn lifecycle_with_event(row: &SqliteRow) -> StoreResult<Lifecycle> {
    let mut lc = lifecycle(row)?;
    if present(row, alias::EVENT)?.is_some() {
        lc.events.push(event(row)?);
    }
    Ok(lc)
}

/// Source columns, including the optional strain it was taken from.
pub fn source(row: &SqliteRow) -> StoreResult<Source> {
    let a = alias::SOURCE;
    let strain = match present(row, alias::SOURCE_STRAIN)? {
        Some(_) => Some(strain(
            row,
            alias::SOURCE_STRAIN,
            alias::SOURCE_STRAIN_VENDOR,
        )?),
        None => None,
    };
    Ok(Source {
        id: get(row, a, "id")?,
        origin: get::<String>(row, a, "origin")?.parse::<SourceOrigin>()?,
        strain,
        lifecycle_id: get(row, a, "lifecycle_id")?,
        event_id: get(row, a, "event_id")?,
        ts: timestamps(row, a)?,
    })
}

/// Generation row carrying at most one source; events are loaded separately.
pub fn generation_with_source(row: &SqliteRow) -> StoreResult<Generation> {
    use alias::*;
    let mut g = Generation {
        id: get(row, GENERATION, "id")?,
        plating_substrate: substrate(row, PLATING, PLATING_VENDOR)?,
        liquid_substrate: substrate(row, LIQUID, LIQUID_VENDOR)?,
        events: Vec::new(),
        sources: Vec::new(),
        ts: timestamps(row, GENERATION)?,
    };
    if present(row, SOURCE)?.is_some() {
        g.sources.push(source(row)?);
    }
    Ok(g)
}

pub fn note(row: &SqliteRow) -> StoreResult<Note> {
    let a = alias::NOTE;
    Ok(Note {
        id: get(row, a, "id")?,
        owner_id: get(row, a, "owner_id")?,
        note: get(row, a, "note")?,
        ts: timestamps(row, a)?,
    })
}

pub fn photo(row: &SqliteRow) -> StoreResult<Photo> {
    let a = alias::PHOTO;
    Ok(Photo {
        id: get(row, a, "id")?,
        owner_id: get(row, a, "owner_id")?,
        filename: get(row, a, "filename")?,
        ts: timestamps(row, a)?,
    })
}

impl Aggregate for Substrate {
    fn key(&self) -> Uuid {
        self.id
    }

    fn absorb(&mut self, row: Self) {
        self.ingredients.extend(row.ingredients);
    }
}

impl Aggregate for Strain {
    fn key(&self) -> Uuid {
        self.id
    }

    fn absorb(&mut self, row: Self) {
        self.attributes.extend(row.attributes);
    }
}

impl Aggregate for Lifecycle {
    fn key(&self) -> Uuid {
        self.id
    }

    fn absorb(&mut self, row: Self) {
        self.events.extend(row.events);
    }
}

impl Aggregate for Generation {
    fn key(&self) -> Uuid {
        self.id
    }

    fn absorb(&mut self, row: Self) {
        self.sources.extend(row.sources);
    }
}
