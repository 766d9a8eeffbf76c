// Data models — Rust structs that map to database rows.
//
// Keyword profiles themselves live in `keywords::profile`; this module only
// holds row types that exist purely for storage.

use serde::{Deserialize, Serialize};

/// One `extract` invocation, as logged in `extraction_runs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRun {
    pub candidate: Option<String>,
    pub embedder: String,
    pub top_k: u32,
    pub min_freq: u32,
    pub records: u32,
    pub profiles: u32,
    pub ran_at: String,
}
