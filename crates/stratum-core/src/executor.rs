use rusqlite::{Batch, Connection};
use stratum_common::{Error, Result};
use tracing::{debug, info};

use crate::catalog::MigrationScript;

/// Apply one migration script to the connection, statement by statement, in
/// source order.
///
/// Statements are split with SQLite's own tokenizer, so terminators inside
/// string literals, comments and trigger bodies are handled correctly; empty
/// statements and trailing terminators are skipped. The first failing
/// statement aborts the rest of the script and surfaces the failing version.
///
/// Commit and rollback belong to the caller.
pub fn apply_script(conn: &Connection, script: &MigrationScript) -> Result<()> {
    let sql = script.sql()?;
    execute_statements(conn, script.version, &sql)?;
    info!("applied migration {}", script.version);
    Ok(())
}

fn execute_statements(conn: &Connection, version: u32, sql: &str) -> Result<()> {
    let mut batch = Batch::new(conn, sql);
    let mut index = 0usize;
    loop {
        let next = batch.next().map_err(|e| Error::Migration {
            version,
            message: format!("statement {} failed to parse: {e}", index + 1),
        })?;
        let Some(mut stmt) = next else {
            break;
        };

        index += 1;
        debug!("migration {version}: executing statement {index}");
        stmt.execute([]).map_err(|e| Error::Migration {
            version,
            message: format!("statement {index} failed: {e}"),
        })?;
    }
    Ok(())
}
