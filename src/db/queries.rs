// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::ExtractionRun;
use crate::keywords::profile::{KeywordMap, KeywordProfile};

// --- Keyword profiles ---

/// Save or replace an entity's keyword profile.
pub fn save_profile(conn: &Connection, profile: &KeywordProfile) -> Result<()> {
    conn.execute(
        "INSERT INTO keyword_profiles (entity, candidate, keywords_json, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(entity) DO UPDATE SET
            candidate = ?2,
            keywords_json = ?3,
            updated_at = datetime('now')",
        params![
            profile.entity,
            profile.candidate,
            profile.keywords.to_json()
        ],
    )?;
    Ok(())
}

/// Load one entity's profile. A stored keyword map that fails strict
/// parsing is a `MalformedProfile` error.
pub fn get_profile(conn: &Connection, entity: &str) -> Result<Option<KeywordProfile>> {
    let mut stmt = conn.prepare(
        "SELECT entity, candidate, keywords_json FROM keyword_profiles WHERE entity = ?1",
    )?;
    let row: Option<(String, Option<String>, String)> = stmt
        .query_row(params![entity], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .optional()?;

    match row {
        Some(row) => Ok(Some(row_to_profile(row)?)),
        None => Ok(None),
    }
}

/// List stored profiles in entity order, optionally for one candidate only.
pub fn list_profiles(conn: &Connection, candidate: Option<&str>) -> Result<Vec<KeywordProfile>> {
    let mut stmt = conn.prepare(
        "SELECT entity, candidate, keywords_json FROM keyword_profiles
         WHERE ?1 IS NULL OR candidate = ?1
         ORDER BY entity",
    )?;
    let rows = stmt
        .query_map(params![candidate], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<(String, Option<String>, String)>>>()?;

    rows.into_iter().map(row_to_profile).collect()
}

/// Distinct candidate labels among stored profiles.
pub fn list_candidates(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT candidate FROM keyword_profiles
         WHERE candidate IS NOT NULL ORDER BY candidate",
    )?;
    let candidates = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(candidates)
}

pub fn profile_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM keyword_profiles", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_profile(
    (entity, candidate, keywords_json): (String, Option<String>, String),
) -> Result<KeywordProfile> {
    let keywords = KeywordMap::from_json(&entity, &keywords_json)?;
    Ok(KeywordProfile {
        entity,
        candidate,
        keywords,
    })
}

// --- Extraction runs ---

/// Log an extraction run.
pub fn record_run(conn: &Connection, run: &ExtractionRun) -> Result<()> {
    conn.execute(
        "INSERT INTO extraction_runs (candidate, embedder, top_k, min_freq, records, profiles)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.candidate,
            run.embedder,
            run.top_k,
            run.min_freq,
            run.records,
            run.profiles
        ],
    )?;
    Ok(())
}

/// The most recent extraction run, if any.
pub fn last_run(conn: &Connection) -> Result<Option<ExtractionRun>> {
    let mut stmt = conn.prepare(
        "SELECT candidate, embedder, top_k, min_freq, records, profiles, ran_at
         FROM extraction_runs ORDER BY id DESC LIMIT 1",
    )?;
    let run = stmt
        .query_row([], |row| {
            Ok(ExtractionRun {
                candidate: row.get(0)?,
                embedder: row.get(1)?,
                top_k: row.get(2)?,
                min_freq: row.get(3)?,
                records: row.get(4)?,
                profiles: row.get(5)?,
                ran_at: row.get(6)?,
            })
        })
        .optional()?;
    Ok(run)
}
