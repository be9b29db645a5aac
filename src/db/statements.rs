//! Every SQL statement the store runs, built once on first use.
//!
//! Joined selects alias each column as `<alias>_<column>` so the scanners in
//! `db::scan` can pull several rows of the same table (e.g. three vendors in a
//! lifecycle) out of one result row. Child collections are LEFT JOINed and
//! ordered after their parent so `db::reconstruct` can fold them in one pass.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::db::tables::{TABLES, TableSpec};
use crate::error::{StoreError, StoreResult};

/// Column aliases shared by the statements and the row scanners.
pub mod alias {
    pub const VENDOR: &str = "v";
    pub const STAGE: &str = "stg";
    pub const EVENT_TYPE: &str = "et";
    pub const EVENT_TYPE_STAGE: &str = "ets";
    pub const INGREDIENT: &str = "ing";
    pub const SUBSTRATE: &str = "sub";
    pub const SUBSTRATE_VENDOR: &str = "subv";
    pub const STRAIN: &str = "str";
    pub const STRAIN_VENDOR: &str = "strv";
    pub const ATTRIBUTE: &str = "attr";

    pub const LIFECYCLE: &str = "lc";
    pub const LC_STRAIN: &str = "lcs";
    pub const LC_STRAIN_VENDOR: &str = "lcsv";
    pub const GRAIN: &str = "gs";
    pub const GRAIN_VENDOR: &str = "gsv";
    pub const BULK: &str = "bs";
    pub const BULK_VENDOR: &str = "bsv";

    pub const GENERATION: &str = "gen";
    pub const PLATING: &str = "ps";
    pub const PLATING_VENDOR: &str = "psv";
    pub const LIQUID: &str = "ls";
    pub const LIQUID_VENDOR: &str = "lsv";
    pub const SOURCE: &str = "src";
    pub const SOURCE_STRAIN: &str = "srcs";
    pub const SOURCE_STRAIN_VENDOR: &str = "srcsv";

    pub const EVENT: &str = "ev";
    pub const EVENT_EVENT_TYPE: &str = "evt";
    pub const EVENT_STAGE: &str = "evts";

    pub const NOTE: &str = "note";
    pub const PHOTO: &str = "photo";
}

const TS: [&str; 3] = ["ctime", "mtime", "dtime"];

const VENDOR_COLS: &[&str] = &["id", "name", "website"];
const STAGE_COLS: &[&str] = &["id", "name"];
const EVENT_TYPE_COLS: &[&str] = &["id", "name", "severity"];
const INGREDIENT_COLS: &[&str] = &["id", "name"];
const SUBSTRATE_COLS: &[&str] = &["id", "name", "type"];
const STRAIN_COLS: &[&str] = &["id", "name", "species"];
const ATTRIBUTE_COLS: &[&str] = &["id", "name", "value"];
const LIFECYCLE_COLS: &[&str] = &["id", "location"];
const GENERATION_COLS: &[&str] = &["id"];
const EVENT_COLS: &[&str] = &["id", "humidity", "temperature"];
const SOURCE_COLS: &[&str] = &["id", "origin", "lifecycle_id", "event_id"];
const NOTE_COLS: &[&str] = &["id", "owner_id", "note"];
const PHOTO_COLS: &[&str] = &["id", "owner_id", "filename"];

/// `a.col AS a_col, ...` for `cols` plus the timestamp triple.
fn select_list(alias: &str, cols: &[&str]) -> String {
    cols.iter()
        .chain(TS.iter())
        .map(|c| format!("{alias}.{c} AS {alias}_{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_cols(parts: &[String]) -> String {
    parts.join(",\n       ")
}

/// Plain per-entity statements.
#[derive(Debug)]
pub struct Crud {
    pub select_all: String,
    pub select: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
    /// Stamps `mtime` on a live row after one of its children changed.
    pub touch: String,
}

/// Statements for a child collection hanging off a parent row.
#[derive(Debug)]
pub struct ChildOps {
    pub add: String,
    pub change: String,
    pub remove: String,
}

/// Statements for owner-attached records (notes, photos).
#[derive(Debug)]
pub struct OwnedOps {
    pub list: String,
    pub add: String,
    pub change: String,
    pub remove: String,
}

/// Statements the timestamp manager runs against one allow-listed table.
#[derive(Debug)]
pub struct TableStatements {
    /// Yields the row's `dtime` (one row) or nothing when the id is unknown.
    pub probe: String,
    pub undelete: String,
    /// Conditional overwrite indexed by field mask
    /// (bit 0 = ctime, bit 1 = mtime, bit 2 = dtime). Index 0 is unused.
    pub patch: [String; 8],
}

#[derive(Debug)]
pub struct Statements {
    pub vendor: Crud,
    pub stage: Crud,
    pub event_type: Crud,
    pub ingredient: Crud,
    pub substrate: Crud,
    pub substrate_ingredient: ChildOps,
    pub strain: Crud,
    pub strain_attribute: ChildOps,
    pub attribute_names: String,
    pub lifecycle: Crud,
    pub lifecycle_event: ChildOps,
    pub generation: Crud,
    pub generation_event: ChildOps,
    pub generation_events: String,
    pub source: ChildOps,
    pub event_in_lifecycle: String,
    pub note: OwnedOps,
    pub photo: OwnedOps,
    tables: HashMap<&'static str, TableStatements>,
}

pub static STATEMENTS: LazyLock<Statements> = LazyLock::new(Statements::build);

impl Statements {
    pub fn table(&self, name: &str) -> StoreResult<&TableStatements> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::validation(format!("unknown table `{name}`")))
    }

    fn build() -> Self {
        Statements {
            vendor: vendor(),
            stage: stage(),
            event_type: event_type(),
            ingredient: ingredient(),
            substrate: substrate(),
            substrate_ingredient: substrate_ingredient(),
            strain: strain(),
            strain_attribute: strain_attribute(),
            attribute_names: "SELECT DISTINCT name FROM strain_attributes \
                              WHERE dtime IS NULL ORDER BY name"
                .to_string(),
            lifecycle: lifecycle(),
            lifecycle_event: events_of("lifecycle_id"),
            generation: generation(),
            generation_event: events_of("generation_id"),
            generation_events: generation_events(),
            source: source(),
            event_in_lifecycle: "SELECT 1 FROM events \
                                 WHERE id = ? AND lifecycle_id = ? AND dtime IS NULL"
                .to_string(),
            note: owned("notes", alias::NOTE, NOTE_COLS, "note"),
            photo: owned("photos", alias::PHOTO, PHOTO_COLS, "filename"),
            tables: TABLES.iter().map(|t| (t.name, table_statements(t))).collect(),
        }
    }
}

fn update_live(table: &str, set: &str) -> String {
    format!("UPDATE {table} SET {set}, mtime = ? WHERE id = ? AND dtime IS NULL")
}

fn delete_live(table: &str) -> String {
    format!("UPDATE {table} SET dtime = ? WHERE id = ? AND dtime IS NULL")
}

fn touch_live(table: &str) -> String {
    format!("UPDATE {table} SET mtime = ? WHERE id = ? AND dtime IS NULL")
}

fn insert_into(table: &str, cols: &[&str]) -> String {
    let placeholders = vec!["?"; cols.len() + 2].join(", ");
    format!(
        "INSERT INTO {table} ({}, ctime, mtime) VALUES ({placeholders})",
        cols.join(", ")
    )
}

/// Single-table entity whose columns need no joins.
fn flat_crud(table: &str, a: &str, cols: &[&str], order: &str) -> Crud {
    let base = format!("SELECT {} FROM {table} {a}", select_list(a, cols));
    let settable: Vec<String> = cols[1..].iter().map(|c| format!("{c} = ?")).collect();
    Crud {
        select_all: format!("{base} WHERE {a}.dtime IS NULL ORDER BY {a}.{order}"),
        select: format!("{base} WHERE {a}.id = ? AND {a}.dtime IS NULL"),
        insert: insert_into(table, cols),
        update: update_live(table, &settable.join(", ")),
        delete: delete_live(table),
        touch: touch_live(table),
    }
}

fn vendor() -> Crud {
    flat_crud("vendors", alias::VENDOR, VENDOR_COLS, "name")
}

fn stage() -> Crud {
    flat_crud("stages", alias::STAGE, STAGE_COLS, "name")
}

fn ingredient() -> Crud {
    flat_crud("ingredients", alias::INGREDIENT, INGREDIENT_COLS, "name")
}

fn event_type() -> Crud {
    let (et, s) = (alias::EVENT_TYPE, alias::EVENT_TYPE_STAGE);
    let base = format!(
        "SELECT {}\nFROM event_types {et}\nJOIN stages {s} ON {s}.id = {et}.stage_id",
        join_cols(&[select_list(et, EVENT_TYPE_COLS), select_list(s, STAGE_COLS)])
    );
    Crud {
        select_all: format!("{base}\nWHERE {et}.dtime IS NULL ORDER BY {s}.name, {et}.name"),
        select: format!("{base}\nWHERE {et}.id = ? AND {et}.dtime IS NULL"),
        insert: insert_into("event_types", &["id", "name", "severity", "stage_id"]),
        update: update_live("event_types", "name = ?, severity = ?, stage_id = ?"),
        delete: delete_live("event_types"),
        touch: touch_live("event_types"),
    }
}

fn substrate() -> Crud {
    let (s, v, i) = (alias::SUBSTRATE, alias::SUBSTRATE_VENDOR, alias::INGREDIENT);
    let base = format!(
        "SELECT {}\nFROM substrates {s}\nJOIN vendors {v} ON {v}.id = {s}.vendor_id\n\
         LEFT JOIN substrate_ingredients si ON si.substrate_id = {s}.id AND si.dtime IS NULL\n\
         LEFT JOIN ingredients {i} ON {i}.id = si.ingredient_id",
        join_cols(&[
            select_list(s, SUBSTRATE_COLS),
            select_list(v, VENDOR_COLS),
            select_list(i, INGREDIENT_COLS),
        ])
    );
    Crud {
        select_all: format!(
            "{base}\nWHERE {s}.dtime IS NULL ORDER BY {s}.name, {s}.id, si.rowid"
        ),
        select: format!("{base}\nWHERE {s}.id = ? AND {s}.dtime IS NULL ORDER BY si.rowid"),
        insert: insert_into("substrates", &["id", "name", "type", "vendor_id"]),
        update: update_live("substrates", "name = ?, type = ?, vendor_id = ?"),
        delete: delete_live("substrates"),
        touch: touch_live("substrates"),
    }
}

fn substrate_ingredient() -> ChildOps {
    ChildOps {
        add: insert_into("substrate_ingredients", &["id", "substrate_id", "ingredient_id"]),
        change: "UPDATE substrate_ingredients SET ingredient_id = ?, mtime = ? \
                 WHERE substrate_id = ? AND ingredient_id = ? AND dtime IS NULL"
            .to_string(),
        remove: "UPDATE substrate_ingredients SET dtime = ? \
                 WHERE substrate_id = ? AND ingredient_id = ? AND dtime IS NULL"
            .to_string(),
    }
}

fn strain() -> Crud {
    let (s, v, a) = (alias::STRAIN, alias::STRAIN_VENDOR, alias::ATTRIBUTE);
    let base = format!(
        "SELECT {}\nFROM strains {s}\nJOIN vendors {v} ON {v}.id = {s}.vendor_id\n\
         LEFT JOIN strain_attributes {a} ON {a}.strain_id = {s}.id AND {a}.dtime IS NULL",
        join_cols(&[
            select_list(s, STRAIN_COLS),
            select_list(v, VENDOR_COLS),
            select_list(a, ATTRIBUTE_COLS),
        ])
    );
    Crud {
        select_all: format!(
            "{base}\nWHERE {s}.dtime IS NULL ORDER BY {s}.name, {s}.id, {a}.rowid"
        ),
        select: format!("{base}\nWHERE {s}.id = ? AND {s}.dtime IS NULL ORDER BY {a}.rowid"),
        insert: insert_into("strains", &["id", "name", "species", "vendor_id"]),
        update: update_live("strains", "name = ?, species = ?, vendor_id = ?"),
        delete: delete_live("strains"),
        touch: touch_live("strains"),
    }
}

fn strain_attribute() -> ChildOps {
    ChildOps {
        add: insert_into("strain_attributes", &["id", "strain_id", "name", "value"]),
        change: "UPDATE strain_attributes SET name = ?, value = ?, mtime = ? \
                 WHERE id = ? AND strain_id = ? AND dtime IS NULL"
            .to_string(),
        remove: "UPDATE strain_attributes SET dtime = ? \
                 WHERE id = ? AND strain_id = ? AND dtime IS NULL"
            .to_string(),
    }
}

/// Event columns with their event type and the type's stage.
fn event_select_list() -> Vec<String> {
    vec![
        select_list(alias::EVENT, EVENT_COLS),
        select_list(alias::EVENT_EVENT_TYPE, EVENT_TYPE_COLS),
        select_list(alias::EVENT_STAGE, STAGE_COLS),
    ]
}

fn event_type_joins(join: &str) -> String {
    let (e, et, s) = (alias::EVENT, alias::EVENT_EVENT_TYPE, alias::EVENT_STAGE);
    format!(
        "{join} event_types {et} ON {et}.id = {e}.event_type_id\n\
         {join} stages {s} ON {s}.id = {et}.stage_id"
    )
}

fn lifecycle() -> Crud {
    use alias::*;
    let (lc, e) = (LIFECYCLE, EVENT);
    let mut cols = vec![
        select_list(lc, LIFECYCLE_COLS),
        select_list(LC_STRAIN, STRAIN_COLS),
        select_list(LC_STRAIN_VENDOR, VENDOR_COLS),
        select_list(GRAIN, SUBSTRATE_COLS),
        select_list(GRAIN_VENDOR, VENDOR_COLS),
        select_list(BULK, SUBSTRATE_COLS),
        select_list(BULK_VENDOR, VENDOR_COLS),
    ];
    let head = format!(
        "FROM lifecycles {lc}\n\
         JOIN strains {LC_STRAIN} ON {LC_STRAIN}.id = {lc}.strain_id\n\
         JOIN vendors {LC_STRAIN_VENDOR} ON {LC_STRAIN_VENDOR}.id = {LC_STRAIN}.vendor_id\n\
         JOIN substrates {GRAIN} ON {GRAIN}.id = {lc}.grain_substrate_id\n\
         JOIN vendors {GRAIN_VENDOR} ON {GRAIN_VENDOR}.id = {GRAIN}.vendor_id\n\
         JOIN substrates {BULK} ON {BULK}.id = {lc}.bulk_substrate_id\n\
         JOIN vendors {BULK_VENDOR} ON {BULK_VENDOR}.id = {BULK}.vendor_id"
    );
    let index = format!(
        "SELECT {}\n{head}\nWHERE {lc}.dtime IS NULL ORDER BY {lc}.rowid",
        join_cols(&cols)
    );
    cols.extend(event_select_list());
    let select = format!(
        "SELECT {}\n{head}\n\
         LEFT JOIN events {e} ON {e}.lifecycle_id = {lc}.id AND {e}.dtime IS NULL\n{}\n\
         WHERE {lc}.id = ? AND {lc}.dtime IS NULL ORDER BY {e}.ctime, {e}.rowid",
        join_cols(&cols),
        event_type_joins("LEFT JOIN"),
    );
    Crud {
        select_all: index,
        select,
        insert: insert_into(
            "lifecycles",
            &["id", "location", "strain_id", "grain_substrate_id", "bulk_substrate_id"],
        ),
        update: update_live(
            "lifecycles",
            "location = ?, strain_id = ?, grain_substrate_id = ?, bulk_substrate_id = ?",
        ),
        delete: delete_live("lifecycles"),
        touch: touch_live("lifecycles"),
    }
}

/// Event add/change/remove for events owned through `owner_column`.
fn events_of(owner_column: &str) -> ChildOps {
    ChildOps {
        add: format!(
            "INSERT INTO events (id, event_type_id, humidity, temperature, {owner_column}, ctime, mtime) \
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        ),
        change: format!(
            "UPDATE events SET event_type_id = ?, humidity = ?, temperature = ?, mtime = ? \
             WHERE id = ? AND {owner_column} = ? AND dtime IS NULL"
        ),
        remove: format!(
            "UPDATE events SET dtime = ? WHERE id = ? AND {owner_column} = ? AND dtime IS NULL"
        ),
    }
}

fn generation() -> Crud {
    use alias::*;
    let (g, src) = (GENERATION, SOURCE);
    let select = format!(
        "SELECT {}\nFROM generations {g}\n\
         JOIN substrates {PLATING} ON {PLATING}.id = {g}.plating_substrate_id\n\
         JOIN vendors {PLATING_VENDOR} ON {PLATING_VENDOR}.id = {PLATING}.vendor_id\n\
         JOIN substrates {LIQUID} ON {LIQUID}.id = {g}.liquid_substrate_id\n\
         JOIN vendors {LIQUID_VENDOR} ON {LIQUID_VENDOR}.id = {LIQUID}.vendor_id\n\
         LEFT JOIN sources {src} ON {src}.generation_id = {g}.id AND {src}.dtime IS NULL\n\
         LEFT JOIN strains {SOURCE_STRAIN} ON {SOURCE_STRAIN}.id = {src}.strain_id\n\
         LEFT JOIN vendors {SOURCE_STRAIN_VENDOR} ON {SOURCE_STRAIN_VENDOR}.id = {SOURCE_STRAIN}.vendor_id",
        join_cols(&[
            select_list(g, GENERATION_COLS),
            select_list(PLATING, SUBSTRATE_COLS),
            select_list(PLATING_VENDOR, VENDOR_COLS),
            select_list(LIQUID, SUBSTRATE_COLS),
            select_list(LIQUID_VENDOR, VENDOR_COLS),
            select_list(src, SOURCE_COLS),
            select_list(SOURCE_STRAIN, STRAIN_COLS),
            select_list(SOURCE_STRAIN_VENDOR, VENDOR_COLS),
        ])
    );
    Crud {
        select_all: format!(
            "{select}\nWHERE {g}.dtime IS NULL ORDER BY {g}.rowid, {src}.rowid"
        ),
        select: format!("{select}\nWHERE {g}.id = ? AND {g}.dtime IS NULL ORDER BY {src}.rowid"),
        insert: insert_into(
            "generations",
            &["id", "plating_substrate_id", "liquid_substrate_id"],
        ),
        update: update_live(
            "generations",
            "plating_substrate_id = ?, liquid_substrate_id = ?",
        ),
        delete: delete_live("generations"),
        touch: touch_live("generations"),
    }
}

fn generation_events() -> String {
    let e = alias::EVENT;
    format!(
        "SELECT {}\nFROM events {e}\n{}\n\
         WHERE {e}.generation_id = ? AND {e}.dtime IS NULL ORDER BY {e}.ctime, {e}.rowid",
        join_cols(&event_select_list()),
        event_type_joins("JOIN"),
    )
}

fn source() -> ChildOps {
    ChildOps {
        add: insert_into(
            "sources",
            &["id", "generation_id", "origin", "strain_id", "lifecycle_id", "event_id"],
        ),
        change: "UPDATE sources SET origin = ?, strain_id = ?, lifecycle_id = ?, event_id = ?, mtime = ? \
                 WHERE id = ? AND generation_id = ? AND dtime IS NULL"
            .to_string(),
        remove: "UPDATE sources SET dtime = ? \
                 WHERE id = ? AND generation_id = ? AND dtime IS NULL"
            .to_string(),
    }
}

fn owned(table: &str, a: &str, cols: &[&str], body: &str) -> OwnedOps {
    OwnedOps {
        list: format!(
            "SELECT {} FROM {table} {a} \
             WHERE {a}.owner_id = ? AND {a}.dtime IS NULL ORDER BY {a}.ctime, {a}.rowid",
            select_list(a, cols)
        ),
        add: insert_into(table, cols),
        change: format!(
            "UPDATE {table} SET {body} = ?, mtime = ? \
             WHERE id = ? AND owner_id = ? AND dtime IS NULL"
        ),
        remove: format!(
            "UPDATE {table} SET dtime = ? WHERE id = ? AND owner_id = ? AND dtime IS NULL"
        ),
    }
}

fn table_statements(t: &TableSpec) -> TableStatements {
    let fields = [t.ctime, t.mtime, t.dtime];
    let patch = std::array::from_fn(|mask| {
        let chosen: Vec<&str> = fields
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, col)| *col)
            .collect();
        if chosen.is_empty() {
            return String::new();
        }
        let set: Vec<String> = chosen.iter().map(|c| format!("{c} = ?")).collect();
        let guard: Vec<String> = chosen.iter().map(|c| format!("{c} IS ?")).collect();
        format!(
            "UPDATE {} SET {} WHERE {} = ? AND {}",
            t.name,
            set.join(", "),
            t.id_column,
            guard.join(" AND ")
        )
    });

    TableStatements {
        probe: format!("SELECT {} FROM {} WHERE {} = ?", t.dtime, t.name, t.id_column),
        undelete: format!(
            "UPDATE {} SET {dtime} = NULL WHERE {} = ? AND {dtime} IS NOT NULL",
            t.name,
            t.id_column,
            dtime = t.dtime
        ),
        patch,
    }
}

#[cfg(test)]
impl Statements {
    fn all(&self) -> Vec<(String, &str)> {
        let mut out: Vec<(String, &str)> = Vec::new();
        let crud = [
            ("vendor", &self.vendor),
            ("stage", &self.stage),
            ("event_type", &self.event_type),
            ("ingredient", &self.ingredient),
            ("substrate", &self.substrate),
            ("strain", &self.strain),
            ("lifecycle", &self.lifecycle),
            ("generation", &self.generation),
        ];
        for (name, c) in crud {
            for (op, sql) in [
                ("select_all", &c.select_all),
                ("select", &c.select),
                ("insert", &c.insert),
                ("update", &c.update),
                ("delete", &c.delete),
                ("touch", &c.touch),
            ] {
                out.push((format!("{name}.{op}"), sql.as_str()));
            }
        }
        let children = [
            ("substrate_ingredient", &self.substrate_ingredient),
            ("strain_attribute", &self.strain_attribute),
            ("lifecycle_event", &self.lifecycle_event),
            ("generation_event", &self.generation_event),
            ("source", &self.source),
        ];
        for (name, c) in children {
            for (op, sql) in [("add", &c.add), ("change", &c.change), ("remove", &c.remove)] {
                out.push((format!("{name}.{op}"), sql.as_str()));
            }
        }
        for (name, o) in [("note", &self.note), ("photo", &self.photo)] {
            for (op, sql) in [
                ("list", &o.list),
                ("add", &o.add),
                ("change", &o.change),
                ("remove", &o.remove),
            ] {
                out.push((format!("{name}.{op}"), sql.as_str()));
            }
        }
        out.push(("attribute_names".into(), self.attribute_names.as_str()));
        out.push(("generation_events".into(), self.generation_events.as_str()));
        out.push(("event_in_lifecycle".into(), self.event_in_lifecycle.as_str()));
        for (table, ts) in &self.tables {
            out.push((format!("{table}.probe"), ts.probe.as_str()));
            out.push((format!("{table}.undelete"), ts.undelete.as_str()));
            for (mask, sql) in ts.patch.iter().enumerate().skip(1) {
                out.push((format!("{table}.patch[{mask}]"), sql.as_str()));
            }
        }
        out
    }
}
