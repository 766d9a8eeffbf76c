// Database schema — ordered migrations tracked in `schema_version`.
//
// Each entry in MIGRATIONS runs at most once, inside its own transaction,
// and is recorded by version number. New tables or columns go in a new
// entry at the end; existing entries never change.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// (version, SQL) pairs, applied in order.
const MIGRATIONS: &[(i64, &str)] = &[
    (
        1,
        "CREATE TABLE keyword_profiles (
            entity TEXT PRIMARY KEY,
            candidate TEXT,                    -- election candidate label, if any
            keywords_json TEXT NOT NULL,       -- keyword -> frequency, rank order
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX idx_profiles_candidate ON keyword_profiles(candidate);",
    ),
    (
        // One row per `extract` invocation.
        2,
        "CREATE TABLE extraction_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            candidate TEXT,
            embedder TEXT NOT NULL,
            top_k INTEGER NOT NULL,
            min_freq INTEGER NOT NULL,
            records INTEGER NOT NULL,
            profiles INTEGER NOT NULL,
            ran_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    ),
];

/// Bring the schema up to date. Safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("Failed to create schema_version table")?;

    let current = schema_version(conn)?;
    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("Migration v{version} failed"))?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    Ok(())
}

/// Highest applied migration, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Number of user tables, shown after `init`.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
