use rusqlite::{Connection, Transaction};

use crate::errors::{DopamindError, DopamindResult};

pub const CURRENT_SCHEMA_VERSION: i32 = 2;

pub fn run_migrations(conn: &mut Connection) -> DopamindResult<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| DopamindError::database("reading user_version pragma", e))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(DopamindError::config(format!(
            "history database version ({version}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
        )));
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|e| DopamindError::database("opening migration transaction", e))?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .map_err(|e| DopamindError::database("updating user_version pragma", e))?;
    tx.commit()
        .map_err(|e| DopamindError::database("committing migrations", e))?;

    tracing::info!("History schema migrated to version {CURRENT_SCHEMA_VERSION}");
    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> DopamindResult<()> {
    let sql = match version {
        1 => include_str!("schemas/schema_v1.sql"),
        2 => include_str!("schemas/schema_v2.sql"),
        other => {
            return Err(DopamindError::config(format!(
                "no migration defined for version {other}"
            )))
        }
    };
    tx.execute_batch(sql)
        .map_err(|e| DopamindError::database(format!("migration to version {version}"), e))
}
