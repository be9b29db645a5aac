use crate::config::DatabaseConfig;
use crate::db::schema::SQLITE_INIT;
use crate::error::{IsRetryable, StoreError, StoreResult};
use backon::{ExponentialBuilder, Retryable};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, sync::LazyLock, time::Duration};
use tracing::{debug, info};

static CONNECT_RETRY_POLICY: LazyLock<ExponentialBuilder> = LazyLock::new(|| {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(3)
        .with_jitter()
});

/// Opens the pool and applies the schema.
///
/// Connecting is retried with a short backoff when the failure is transient;
/// a malformed URL or a schema error fails immediately.
pub async fn connect(cfg: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let connect_opts = SqliteConnectOptions::from_str(cfg.database_url.as_str())?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(cfg.busy_timeout_secs))
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = (|| {
        let connect_opts = connect_opts.clone();
        async move {
            SqlitePoolOptions::new()
                .max_connections(cfg.max_connections)
                .connect_with(connect_opts)
                .await
                .map_err(StoreError::from)
        }
    })
    .retry(*CONNECT_RETRY_POLICY)
    .when(|err: &StoreError| err.is_retryable())
    .notify(|err, after| debug!(error = %err, ?after, "database connect failed, retrying"))
    .await?;

    apply_schema(&pool).await?;

    info!(database_url = %cfg.database_url, "database ready");
    Ok(pool)
}

pub async fn apply_schema(pool: &SqlitePool) -> StoreResult<()> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
