use rusqlite::Connection;
use stratum_common::{Error, Result};
use stratum_config::DatabaseConfig;
use tracing::{debug, info};

/// Open the target store and apply the configured pragmas.
///
/// The returned connection is exclusively owned by one orchestration run and
/// is released when dropped, on every exit path. Cross-process contention is
/// left to SQLite's own locking via `busy_timeout`.
pub fn connect(config: &DatabaseConfig) -> Result<Connection> {
    info!("opening store at {}", config.path.display());
    let conn = Connection::open(&config.path)
        .map_err(|e| Error::Database(format!("failed to open {}: {e}", config.path.display())))?;

    let pragmas = format!(
        "PRAGMA synchronous = {};
         PRAGMA busy_timeout = {};
         PRAGMA cache_size = {};
         PRAGMA foreign_keys = {};
         PRAGMA temp_store = {};
         PRAGMA mmap_size = {};",
        config.synchronous,
        config.busy_timeout_ms,
        config.cache_size,
        if config.foreign_keys { "ON" } else { "OFF" },
        config.temp_store,
        config.mmap_size,
    );
    conn.execute_batch(&pragmas)
        .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

    debug!("pragmas applied to {}", config.path.display());
    Ok(conn)
}
