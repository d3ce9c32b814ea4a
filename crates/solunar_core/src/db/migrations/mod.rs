//! Schema migration registry and runner.
//!
//! # Responsibility
//! - Hold every schema step this binary knows, in version order.
//! - Bring an opened database up to the newest version atomically.
//!
//! # Invariants
//! - Registry versions increase strictly; steps never get reordered.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - A database ahead of this binary is rejected, never downgraded.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "event_indexes",
        sql: include_str!("0002_event_indexes.sql"),
    },
];

/// Newest schema version this binary can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |last| last.version)
}

/// Brings the connection's schema up to `latest_version()`.
///
/// All pending steps run inside one transaction; a database left mid-way is
/// indistinguishable from one never migrated.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = stored_user_version(conn)?;
    let target = latest_version();

    if current_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: target,
        });
    }

    if current_version == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in MIGRATIONS
        .iter()
        .filter(|step| step.version > current_version)
    {
        debug!(
            "event=db_migrate module=db status=apply version={} name={}",
            step.version, step.name
        );
        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={current_version} to_version={target}"
    );

    Ok(())
}

fn stored_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
