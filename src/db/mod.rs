// Database layer — a single SQLite file holding keyword profiles and the
// extraction run log.
//
// rusqlite is built with the "bundled" feature, so no system SQLite is
// needed. The file path comes from THEMEBUZZ_DB_PATH (default ./themebuzz.db).

pub mod models;
pub mod queries;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the database if needed and apply pending migrations.
///
/// Used by `init` and by `extract`, which may be the first command run
/// against a new path.
pub fn initialize(db_path: &str) -> Result<Connection> {
    let path = Path::new(db_path);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {} for the database", dir.display()))?;
    }

    let conn = connect(path)?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

/// Open a database that `init` has already created.
pub fn open(db_path: &str) -> Result<Connection> {
    let path = Path::new(db_path);
    if !path.exists() {
        anyhow::bail!("No database at {db_path}. Run `themebuzz init` first.");
    }
    connect(path)
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}
