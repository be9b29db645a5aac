use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::StoreError;

/// Creation / modification / deletion instants carried by every persisted row.
/// `dtime` is `Some` while the row is soft-deleted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Timestamps {
    #[serde(default)]
    pub ctime: DateTime<Utc>,
    #[serde(default)]
    pub mtime: DateTime<Utc>,
    #[serde(default)]
    pub dtime: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stage {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventType {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub severity: String,
    pub stage: Stage,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubstrateType {
    #[default]
    Grain,
    Bulk,
    Plating,
    Liquid,
}

impl SubstrateType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubstrateType::Grain => "grain",
            SubstrateType::Bulk => "bulk",
            SubstrateType::Plating => "plating",
            SubstrateType::Liquid => "liquid",
        }
    }
}

impl FromStr for SubstrateType {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "grain" => Ok(SubstrateType::Grain),
            "bulk" => Ok(SubstrateType::Bulk),
            "plating" => Ok(SubstrateType::Plating),
            "liquid" => Ok(SubstrateType::Liquid),
            other => Err(StoreError::validation(format!(
                "unknown substrate type `{other}`"
            ))),
        }
    }
}

impl fmt::Display for SubstrateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Substrate {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SubstrateType,
    pub vendor: Vendor,
    /// Populated on substrate selects; empty when the substrate is embedded
    /// in an index projection.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StrainAttribute {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub value: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Strain {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub species: String,
    pub vendor: Vendor,
    #[serde(default)]
    pub attributes: Vec<StrainAttribute>,
    #[serde(flatten)]
    pub ts: Timestamps,
}

/// A recorded observation. `ts.ctime` is the instant it occurred.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Event {
    #[serde(default)]
    pub id: Uuid,
    pub event_type: EventType,
    #[serde(default)]
    pub humidity: i32,
    #[serde(default)]
    pub temperature: f64,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Lifecycle {
    #[serde(default)]
    pub id: Uuid,
    pub location: String,
    pub strain: Strain,
    pub grain_substrate: Substrate,
    pub bulk_substrate: Substrate,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    #[default]
    Strain,
    Event,
}

impl SourceOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceOrigin::Strain => "strain",
            SourceOrigin::Event => "event",
        }
    }
}

impl FromStr for SourceOrigin {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "strain" => Ok(SourceOrigin::Strain),
            "event" => Ok(SourceOrigin::Event),
            other => Err(StoreError::validation(format!(
                "unknown source origin `{other}`"
            ))),
        }
    }
}

/// Where a generation's material came from: a strain directly, or an event
/// recorded on some lifecycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Source {
    #[serde(default)]
    pub id: Uuid,
    #[serde(rename = "type")]
    pub origin: SourceOrigin,
    #[serde(default)]
    pub strain: Option<Strain>,
    /// Back-reference to the lifecycle an event-origin source came from.
    #[serde(default)]
    pub lifecycle_id: Option<Uuid>,
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Generation {
    #[serde(default)]
    pub id: Uuid,
    pub plating_substrate: Substrate,
    pub liquid_substrate: Substrate,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(flatten)]
    pub ts: Timestamps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Note {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub owner_id: Uuid,
    pub note: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}

/// Photo metadata. The image bytes live outside the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub owner_id: Uuid,
    pub filename: String,
    #[serde(flatten)]
    pub ts: Timestamps,
}
