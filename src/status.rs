// System status display — DB stats, stored profiles, last extraction, model files.

use anyhow::Result;
use std::path::Path;

use crate::config::{Config, EmbedderBackend};
use crate::db::queries;
use crate::keywords::download;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let db_path = config.db_path.as_str();

    if download::embedding_files_present(&config.model_dir) {
        println!(
            "Embedding model: {} (in {})",
            download::EMBEDDING_MODEL_NAME,
            config.model_dir.display()
        );
    } else {
        println!("Embedding model: not downloaded");
        println!("  Run `themebuzz download-model` to download it");
    }
    if config.embedder_backend == EmbedderBackend::Hash {
        println!("  (THEMEBUZZ_EMBEDDER=hash: ranking without the model)");
    }

    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `themebuzz init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let conn = crate::db::open(db_path)?;

    let count = queries::profile_count(&conn)?;
    let candidates = queries::list_candidates(&conn)?;
    if count == 0 {
        println!("Keyword profiles: none yet");
        println!("  Run `themebuzz extract --corpus <file>` to build them");
    } else if candidates.is_empty() {
        println!("Keyword profiles: {count}");
    } else {
        println!(
            "Keyword profiles: {count} (candidates: {})",
            candidates.join(", ")
        );
    }

    match queries::last_run(&conn)? {
        Some(run) => crate::output::terminal::display_run(&run),
        None => println!("Last extraction: never"),
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
