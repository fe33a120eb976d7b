use chrono::{DateTime, Utc};
use serde::Serialize;
use stratum_common::{Error, Result};
use stratum_config::AppConfig;
use tracing::{debug, info};

use crate::catalog::{Catalog, MigrationScript};
use crate::{executor, store, tracker};

/// Outcome of an upgrade run.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<u32>,
}

/// Read-only view of the store's schema state.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaStatus {
    pub current_version: u32,
    pub updated_at: Option<DateTime<Utc>>,
    pub pending: Vec<u32>,
}

/// The single public entry point: bring the store up to the latest known
/// schema version.
///
/// Each run owns its connection for the whole duration; at most one upgrade
/// per store should be in flight at a time. Concurrent invocations from other
/// processes are not coordinated here and rely on SQLite's locking via the
/// configured `busy_timeout`.
pub struct Upgrader {
    config: AppConfig,
}

impl Upgrader {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Apply all pending migrations in ascending version order, committing
    /// the whole batch atomically.
    pub fn upgrade(&self) -> Result<UpgradeReport> {
        self.upgrade_with(|_| Ok(()))
    }

    /// Like [`upgrade`](Self::upgrade), invoking `on_migration` after each
    /// version is applied and recorded, before the next one starts. An error
    /// returned by the callback aborts the batch exactly like a failing
    /// statement: nothing becomes durable.
    pub fn upgrade_with<F>(&self, mut on_migration: F) -> Result<UpgradeReport>
    where
        F: FnMut(u32) -> Result<()>,
    {
        let mut conn = store::connect(&self.config.database)?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        let from_version = tracker::current_version(&tx)?;
        let scripts = Catalog::new(&self.config.migrations.dir).list()?;
        reject_duplicates(&scripts)?;

        let pending: Vec<&MigrationScript> = scripts
            .iter()
            .filter(|s| s.version > from_version)
            .collect();

        if pending.is_empty() {
            debug!("schema already at version {from_version}, nothing to apply");
        } else {
            info!(
                "upgrading schema from version {from_version}: {} migrations pending",
                pending.len()
            );
            tracker::ensure_tracking_table(&tx)?;
        }

        let mut applied = Vec::with_capacity(pending.len());
        for script in pending {
            executor::apply_script(&tx, script)?;
            tracker::set_version(&tx, script.version)?;
            on_migration(script.version)?;
            applied.push(script.version);
        }

        let to_version = applied.last().copied().unwrap_or(from_version);
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit upgrade: {e}")))?;

        info!("schema up to date at version {to_version}");
        Ok(UpgradeReport {
            from_version,
            to_version,
            applied,
        })
    }

    /// Current version and pending migrations, without applying anything.
    pub fn status(&self) -> Result<SchemaStatus> {
        let conn = store::connect(&self.config.database)?;
        let current_version = tracker::current_version(&conn)?;
        let updated_at = tracker::last_updated_at(&conn)?;

        let scripts = Catalog::new(&self.config.migrations.dir).list()?;
        reject_duplicates(&scripts)?;
        let pending = scripts
            .iter()
            .filter(|s| s.version > current_version)
            .map(|s| s.version)
            .collect();

        Ok(SchemaStatus {
            current_version,
            updated_at,
            pending,
        })
    }
}

/// Duplicate versions have undefined precedence: applying either copy would
/// silently double-apply or skip work. The whole run is rejected before any
/// statement executes.
fn reject_duplicates(scripts: &[MigrationScript]) -> Result<()> {
    for pair in scripts.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(Error::Catalog(format!(
                "duplicate migration version {} ({} and {})",
                pair[0].version,
                pair[0].path.display(),
                pair[1].path.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn script(version: u32) -> MigrationScript {
        MigrationScript {
            version,
            path: PathBuf::from(format!("{version:03}.sql")),
        }
    }

    #[test]
    fn distinct_versions_pass_the_duplicate_check() {
        assert!(reject_duplicates(&[script(1), script(2), script(3)]).is_ok());
        assert!(reject_duplicates(&[]).is_ok());
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let err = reject_duplicates(&[script(1), script(2), script(2)]).unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
        assert!(err.to_string().contains("duplicate migration version 2"));
    }
}
