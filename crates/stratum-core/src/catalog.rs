use std::path::PathBuf;

use stratum_common::{Error, Result};
use tracing::debug;

/// One unit of schema change: a numbered SQL script on disk.
///
/// Identity is the version number, parsed from the file stem. The SQL itself
/// is read at apply time, not at discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub version: u32,
    pub path: PathBuf,
}

impl MigrationScript {
    /// Read the script's SQL text.
    pub fn sql(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Catalog(format!("failed to read {}: {e}", self.path.display())))
    }
}

/// Discovers the available migrations in a directory.
///
/// Only `*.sql` entries whose stem parses as a non-negative integer count as
/// migrations; anything else (notes, helper scripts) is skipped silently.
/// Duplicate versions are left in the listing for the orchestrator to reject
/// before anything is applied.
pub struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List available migrations, sorted ascending by version.
    ///
    /// Reading the catalog never touches the database connection.
    pub fn list(&self) -> Result<Vec<MigrationScript>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            Error::Catalog(format!(
                "failed to read migrations directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let mut scripts = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| Error::Catalog(format!("failed to read directory entry: {e}")))?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(version) = stem.parse::<u32>() else {
                debug!("skipping non-migration file {}", path.display());
                continue;
            };

            scripts.push(MigrationScript { version, path });
        }

        scripts.sort_by_key(|s| s.version);
        Ok(scripts)
    }
}
