//! Reads and persists the currently-applied schema version inside the target
//! store, in a singleton row: `schema_version(id = 'singleton', version,
//! updated_at)`. All writes happen on the orchestrator's transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use stratum_common::{Error, Result};

const SINGLETON_ID: &str = "singleton";

fn table_exists(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT count(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::Version(format!("failed to probe schema_version table: {e}")))
}

/// Current applied version. Returns 0 when the tracking table does not exist
/// yet (first-run bootstrap) or holds no row; any other access failure is
/// surfaced.
pub fn current_version(conn: &Connection) -> Result<u32> {
    if !table_exists(conn)? {
        return Ok(0);
    }

    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM schema_version WHERE id = ?1",
            params![SINGLETON_ID],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Version(format!("failed to read schema version: {e}")))?;

    match version {
        Some(v) if v >= 0 => Ok(v as u32),
        Some(v) => Err(Error::Version(format!(
            "stored schema version {v} is negative"
        ))),
        None => Ok(0),
    }
}

/// Create the tracking table and seed the singleton row at version 0 if
/// missing. Runs on the batch transaction, so a failed upgrade leaves no
/// trace of it.
pub fn ensure_tracking_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        INSERT OR IGNORE INTO schema_version (id, version) VALUES ('singleton', 0);",
    )
    .map_err(|e| Error::Version(format!("failed to create schema_version table: {e}")))
}

/// Record `version` as applied.
///
/// Precondition: strictly greater than the value read at the start of the
/// run. The orchestrator guarantees this by construction; the tracker only
/// checks that the singleton row was actually written.
pub fn set_version(conn: &Connection, version: u32) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE schema_version SET version = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![version, SINGLETON_ID],
        )
        .map_err(|e| Error::Version(format!("failed to record version {version}: {e}")))?;

    if updated != 1 {
        return Err(Error::Version(format!(
            "schema_version singleton row missing while recording version {version}"
        )));
    }
    Ok(())
}

/// When the tracked version last changed, if the store records one.
pub fn last_updated_at(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    if !table_exists(conn)? {
        return Ok(None);
    }

    let raw: Option<String> = conn
        .query_row(
            "SELECT updated_at FROM schema_version WHERE id = ?1",
            params![SINGLETON_ID],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::Version(format!("failed to read schema_version timestamp: {e}")))?;

    Ok(raw.as_deref().and_then(parse_datetime))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn absent_table_reads_as_version_zero() {
        assert_eq!(current_version(&conn()).unwrap(), 0);
    }

    #[test]
    fn ensure_seeds_singleton_at_zero() {
        let conn = conn();
        ensure_tracking_table(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn ensure_is_idempotent() {
        let conn = conn();
        ensure_tracking_table(&conn).unwrap();
        set_version(&conn, 4).unwrap();
        ensure_tracking_table(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 4);
    }

    #[test]
    fn set_then_read_round_trips() {
        let conn = conn();
        ensure_tracking_table(&conn).unwrap();
        set_version(&conn, 3).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 3);
    }

    #[test]
    fn set_without_table_is_an_error() {
        let err = set_version(&conn(), 1).unwrap_err();
        assert!(matches!(err, Error::Version(_)));
    }

    #[test]
    fn updated_at_tracks_writes() {
        let conn = conn();
        assert!(last_updated_at(&conn).unwrap().is_none());

        ensure_tracking_table(&conn).unwrap();
        set_version(&conn, 1).unwrap();
        assert!(last_updated_at(&conn).unwrap().is_some());
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        assert!(parse_datetime("2026-08-07 12:30:00").is_some());
        assert!(parse_datetime("2026-08-07T12:30:00Z").is_some());
        assert!(parse_datetime("not a timestamp").is_none());
    }
}
