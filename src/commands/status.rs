use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

pub fn run(db_path: &Path) -> Result<()> {
    info!(db_path = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let schema_version = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .unwrap_or_default();
    let vehicles = query_count(&conn, "SELECT COUNT(*) FROM vehicle").unwrap_or(0);
    let crops = query_count(&conn, "SELECT COUNT(*) FROM crop").unwrap_or(0);
    let fields = query_count(&conn, "SELECT COUNT(*) FROM field").unwrap_or(0);

    info!(
        path = %db_path.display(),
        schema_version = %schema_version,
        vehicles,
        crops,
        fields,
        "database status"
    );

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
