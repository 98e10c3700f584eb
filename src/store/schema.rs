use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.2.0";

pub(crate) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}

pub(crate) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vehicle (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          model TEXT NOT NULL,
          brand TEXT NOT NULL,
          category TEXT NOT NULL,
          img_url TEXT,
          price INTEGER NOT NULL,
          power INTEGER
        );

        CREATE TABLE IF NOT EXISTS crop (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          crop_type TEXT NOT NULL UNIQUE,
          nitrogen_level INTEGER NOT NULL,
          growth_stages INTEGER NOT NULL,
          yield_per_ha INTEGER NOT NULL,
          seeds_per_ha INTEGER NOT NULL,
          price_per_tonne REAL NOT NULL,
          root_crop INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS field (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
          number INTEGER NOT NULL UNIQUE,
          ground_type TEXT,
          soil_type TEXT,
          nitrogen_level INTEGER,
          ph_level REAL,
          plowed INTEGER,
          rolled INTEGER,
          weeded INTEGER,
          mulched INTEGER
        );

        CREATE TABLE IF NOT EXISTS field_crop (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          type TEXT NOT NULL,
          growth_stage INTEGER NOT NULL DEFAULT 1,
          growth_tense TEXT NOT NULL CHECK (growth_tense IN ('past', 'present', 'future')),
          field_id INTEGER NOT NULL,
          FOREIGN KEY(type) REFERENCES crop(crop_type),
          FOREIGN KEY(field_id) REFERENCES field(number)
        );

        CREATE INDEX IF NOT EXISTS idx_field_crop_field ON field_crop(field_id, growth_tense);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
