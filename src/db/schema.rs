//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes one table per entity kind plus the association tables
/// (`substrate_ingredients`, `strain_attributes`, `sources`). Every table carries
/// the `ctime` / `mtime` / `dtime` triple; a non-null `dtime` marks a soft delete.
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Reference data
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS vendors (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    website TEXT NOT NULL DEFAULT '',
    ctime TEXT NOT NULL, -- RFC3339
    mtime TEXT NOT NULL, -- RFC3339
    dtime TEXT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS stages (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE TABLE IF NOT EXISTS event_types (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    severity TEXT NOT NULL,
    stage_id BLOB NOT NULL REFERENCES stages(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL,
    UNIQUE(name, stage_id)
);

CREATE TABLE IF NOT EXISTS ingredients (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

-- ---------------------------------------------------------------------------
-- Substrates and their ingredients
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS substrates (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('grain', 'bulk', 'plating', 'liquid')),
    vendor_id BLOB NOT NULL REFERENCES vendors(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE TABLE IF NOT EXISTS substrate_ingredients (
    id BLOB PRIMARY KEY NOT NULL,
    substrate_id BLOB NOT NULL REFERENCES substrates(id),
    ingredient_id BLOB NOT NULL REFERENCES ingredients(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_substrate_ingredients_substrate ON substrate_ingredients(substrate_id);
CREATE UNIQUE INDEX IF NOT EXISTS ux_substrate_ingredients_live
    ON substrate_ingredients(substrate_id, ingredient_id) WHERE dtime IS NULL;

-- ---------------------------------------------------------------------------
-- Strains and their attributes
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS strains (
    id BLOB PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    species TEXT NOT NULL DEFAULT '',
    vendor_id BLOB NOT NULL REFERENCES vendors(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE TABLE IF NOT EXISTS strain_attributes (
    id BLOB PRIMARY KEY NOT NULL,
    strain_id BLOB NOT NULL REFERENCES strains(id),
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_strain_attributes_strain ON strain_attributes(strain_id);
CREATE UNIQUE INDEX IF NOT EXISTS ux_strain_attributes_live
    ON strain_attributes(strain_id, name) WHERE dtime IS NULL;

-- ---------------------------------------------------------------------------
-- Lifecycles, generations and the events/sources hanging off them
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS lifecycles (
    id BLOB PRIMARY KEY NOT NULL,
    location TEXT NOT NULL,
    strain_id BLOB NOT NULL REFERENCES strains(id),
    grain_substrate_id BLOB NOT NULL REFERENCES substrates(id),
    bulk_substrate_id BLOB NOT NULL REFERENCES substrates(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE TABLE IF NOT EXISTS generations (
    id BLOB PRIMARY KEY NOT NULL,
    plating_substrate_id BLOB NOT NULL REFERENCES substrates(id),
    liquid_substrate_id BLOB NOT NULL REFERENCES substrates(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id BLOB PRIMARY KEY NOT NULL,
    event_type_id BLOB NOT NULL REFERENCES event_types(id),
    humidity INTEGER NOT NULL DEFAULT 0,
    temperature REAL NOT NULL DEFAULT 0,
    lifecycle_id BLOB NULL REFERENCES lifecycles(id),
    generation_id BLOB NULL REFERENCES generations(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL,
    CHECK ((lifecycle_id IS NULL) <> (generation_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_events_lifecycle ON events(lifecycle_id);
CREATE INDEX IF NOT EXISTS idx_events_generation ON events(generation_id);

CREATE TABLE IF NOT EXISTS sources (
    id BLOB PRIMARY KEY NOT NULL,
    generation_id BLOB NOT NULL REFERENCES generations(id),
    origin TEXT NOT NULL CHECK (origin IN ('strain', 'event')),
    strain_id BLOB NULL REFERENCES strains(id),
    lifecycle_id BLOB NULL REFERENCES lifecycles(id),
    event_id BLOB NULL REFERENCES events(id),
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL,
    CHECK (
        (origin = 'strain' AND strain_id IS NOT NULL)
        OR (origin = 'event' AND event_id IS NOT NULL AND lifecycle_id IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS idx_sources_generation ON sources(generation_id);

-- ---------------------------------------------------------------------------
-- Notes and photos attach to any owner row by id
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notes (
    id BLOB PRIMARY KEY NOT NULL,
    owner_id BLOB NOT NULL,
    note TEXT NOT NULL,
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id);

CREATE TABLE IF NOT EXISTS photos (
    id BLOB PRIMARY KEY NOT NULL,
    owner_id BLOB NOT NULL,
    filename TEXT NOT NULL,
    ctime TEXT NOT NULL,
    mtime TEXT NOT NULL,
    dtime TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_photos_owner ON photos(owner_id);
"#;
