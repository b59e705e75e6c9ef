use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::schema;

/// Creates whatever part of `schema` is missing. Existing tables are never
/// dropped or altered, so this is safe to run on every start.
pub fn ensure_schema(conn: &mut Connection, schema: &str) -> Result<()> {
    trace!("trying to get schema version");

    conn.execute_batch(schema::META_SCHEMA)?;

    let schema_version: Option<u32> = conn
        .query_row("SELECT value FROM Meta WHERE key = 'schema'", [], |row| {
            row.get(0)
        })
        .optional()?;

    let tran = conn.transaction()?;

    if let Some(schema_version) = schema_version {
        if schema_version != schema::SCHEMA_VERSION {
            error!(
                "unsupported schema version: got {}, expected {}",
                schema_version,
                schema::SCHEMA_VERSION
            );
            return Err(Error::SchemaVersion {
                found: schema_version,
                expected: schema::SCHEMA_VERSION,
            });
        }

        debug!("schema version up-to-date, creating missing tables only");
    } else {
        debug!("schema meta not present, creating schema");

        tran.execute(
            "INSERT INTO Meta (key, value) VALUES ('schema', ?)",
            [schema::SCHEMA_VERSION],
        )?;
    }

    tran.execute_batch(schema)?;
    tran.commit()?;

    Ok(())
}
