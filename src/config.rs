use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::corpus::DateWindow;
use crate::keywords::extractor::{DEFAULT_MIN_FREQ, DEFAULT_TOP_K};

/// Which embedding backend to use for keyword ranking.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedderBackend {
    /// Local ONNX encoder (default) — needs `download-model` first
    Onnx,
    /// Character n-gram hashing — no model files, lower quality
    Hash,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override the extraction parameters per run.
pub struct Config {
    pub db_path: String,
    /// Directory containing downloaded model files
    pub model_dir: PathBuf,
    pub embedder_backend: EmbedderBackend,
    /// Keywords kept per entity
    pub top_k: usize,
    /// Minimum candidate frequency
    pub min_freq: u32,
}

impl Config {
    /// Load configuration from environment variables. Every value has a default.
    pub fn load() -> Result<Self> {
        let embedder_backend = match env::var("THEMEBUZZ_EMBEDDER").as_deref() {
            Ok("hash") => EmbedderBackend::Hash,
            // "onnx" or unset both default to ONNX
            _ => EmbedderBackend::Onnx,
        };

        let model_dir = env::var("THEMEBUZZ_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::keywords::download::default_model_dir());

        let top_k = match env::var("THEMEBUZZ_TOP_K") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("THEMEBUZZ_TOP_K is not a number: {v}"))?,
            Err(_) => DEFAULT_TOP_K,
        };
        let min_freq = match env::var("THEMEBUZZ_MIN_FREQ") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("THEMEBUZZ_MIN_FREQ is not a number: {v}"))?,
            Err(_) => DEFAULT_MIN_FREQ,
        };

        Ok(Self {
            db_path: env::var("THEMEBUZZ_DB_PATH").unwrap_or_else(|_| "./themebuzz.db".to_string()),
            model_dir,
            embedder_backend,
            top_k,
            min_freq,
        })
    }

    /// Validate that the chosen embedder has what it needs.
    pub fn require_embedder(&self) -> Result<()> {
        match self.embedder_backend {
            EmbedderBackend::Onnx => {
                if !crate::keywords::download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `themebuzz download-model` to download them.\n\
                         Or set THEMEBUZZ_EMBEDDER=hash to rank without a model.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::Hash => Ok(()),
        }
    }
}

/// A presidential election analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionRound {
    pub number: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ElectionRound {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(Some(self.start), Some(self.end))
    }

    /// Look up a known round (20th, 21st presidential elections).
    pub fn lookup(number: u32) -> Option<Self> {
        let (start, end) = match number {
            20 => ((2022, 2, 5), (2022, 3, 16)),
            21 => ((2025, 5, 3), (2025, 6, 10)),
            _ => return None,
        };
        Some(Self {
            number,
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2)?,
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2)?,
        })
    }
}

/// Resolve the analysis window: explicit dates override the round's bounds.
pub fn resolve_window(
    round: Option<u32>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DateWindow> {
    let base = match round {
        Some(n) => ElectionRound::lookup(n)
            .with_context(|| format!("Unknown election round {n} (known: 20, 21)"))?
            .window(),
        None => DateWindow::unbounded(),
    };

    let window = DateWindow::new(start.or(base.start), end.or(base.end));
    if let (Some(s), Some(e)) = (window.start, window.end) {
        if s > e {
            anyhow::bail!("Start date {s} is after end date {e}");
        }
    }
    Ok(window)
}
