//! Allow-list of tables whose timestamps may be patched or undeleted by name.
//!
//! Table names arrive from the outside (URL path segments), so they are only
//! ever used to look up a `TableSpec`; SQL is built from the entry's own
//! `&'static str` identifiers.

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub id_column: &'static str,
    pub ctime: &'static str,
    pub mtime: &'static str,
    pub dtime: &'static str,
}

impl TableSpec {
    const fn standard(name: &'static str) -> Self {
        TableSpec {
            name,
            id_column: "id",
            ctime: "ctime",
            mtime: "mtime",
            dtime: "dtime",
        }
    }
}

pub static TABLES: &[TableSpec] = &[
    TableSpec::standard("vendors"),
    TableSpec::standard("stages"),
    TableSpec::standard("event_types"),
    TableSpec::standard("ingredients"),
    TableSpec::standard("substrates"),
    TableSpec::standard("substrate_ingredients"),
    TableSpec::standard("strains"),
    TableSpec::standard("strain_attributes"),
    TableSpec::standard("lifecycles"),
    TableSpec::standard("generations"),
    TableSpec::standard("events"),
    TableSpec::standard("sources"),
    TableSpec::standard("notes"),
    TableSpec::standard("photos"),
];

pub fn lookup(name: &str) -> StoreResult<&'static TableSpec> {
    TABLES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| StoreError::validation(format!("unknown table `{name}`")))
}
