use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration. Resolved once at process start, read-only
/// thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
}

/// SQLite connection settings, applied as pragmas when the store is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// How long a writer waits on a locked database before giving up.
    pub busy_timeout_ms: u32,
    /// Page cache size; negative values are KiB.
    pub cache_size: i64,
    pub mmap_size: u64,
    pub foreign_keys: bool,
    pub synchronous: String,
    pub temp_store: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/stratum.db"),
            busy_timeout_ms: 5000,
            cache_size: -20_000,
            mmap_size: 268_435_456,
            foreign_keys: true,
            synchronous: "NORMAL".into(),
            temp_store: "MEMORY".into(),
        }
    }
}

/// Where migration scripts are discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("migrations"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_pragma_values() {
        let config = AppConfig::default();
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.database.cache_size, -20_000);
        assert!(config.database.foreign_keys);
        assert_eq!(config.database.synchronous, "NORMAL");
        assert_eq!(config.migrations.dir, PathBuf::from("migrations"));
    }
}
