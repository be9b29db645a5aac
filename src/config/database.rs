use serde::{Deserialize, Serialize};

/// Storage configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL for SQLite.
    /// TOML: `database.database_url`. Default: `sqlite://data.db`.
    #[serde(default)]
    pub database_url: String,

    /// Upper bound on pooled connections.
    /// TOML: `database.max_connections`. Default: `8`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a connection waits on a locked database before failing.
    /// TOML: `database.busy_timeout_secs`. Default: `5`.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Attempts an insert makes before giving up on identifier collisions.
    /// TOML: `database.insert_retry_limit`. Default: `5`.
    #[serde(default = "default_insert_retry_limit")]
    pub insert_retry_limit: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data.db".to_string(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            insert_retry_limit: default_insert_retry_limit(),
        }
    }
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_insert_retry_limit() -> u32 {
    crate::db::ids::DEFAULT_INSERT_ATTEMPTS
}
