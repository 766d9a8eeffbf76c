// Model download — fetch the sentence encoder from HuggingFace.
//
// The multilingual encoder (Korean + English) is exported to ONNX upstream;
// we need `onnx/model.onnx` and `tokenizer.json`, stored flat under
// <model_dir>/<model name>/. The default model_dir is the platform data
// directory (~/.local/share/themebuzz/models/ on Linux).

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Name of the embedding model; also its subdirectory under the model dir.
pub const EMBEDDING_MODEL_NAME: &str = "paraphrase-multilingual-MiniLM-L12-v2";

const HF_REPO: &str = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

/// One file to fetch: path inside the repo, local file name, and whether it
/// is large enough to deserve a progress bar.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
    large: bool,
}

const MODEL_FILES: &[ModelFile] = &[
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        large: false,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
        large: true,
    },
];

/// Platform data directory for model files, falling back to `./themebuzz/models`.
pub fn default_model_dir() -> PathBuf {
    let root = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    root.join("themebuzz").join("models")
}

/// Where the embedding model's files live under `base`.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(EMBEDDING_MODEL_NAME)
}

/// True when every model file is already on disk.
pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    MODEL_FILES.iter().all(|f| dir.join(f.local).exists())
}

/// Download whichever model files are missing under `base`.
pub async fn download_model(base: &Path) -> Result<()> {
    let dir = embedding_model_dir(base);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    println!("\n{EMBEDDING_MODEL_NAME}:");

    let client = reqwest::Client::new();
    for file in MODEL_FILES {
        let dest = dir.join(file.local);
        if dest.exists() {
            debug!(file = file.local, "Model file present, skipping");
            println!("  {} (already downloaded)", file.local);
            continue;
        }

        println!("  Fetching {}...", file.remote);
        let url = format!("https://huggingface.co/{HF_REPO}/resolve/main/{}", file.remote);
        fetch(&client, &url, &dest, file.large).await?;
    }

    Ok(())
}

/// Stream `url` into `dest` via a `.part` file, renamed into place once complete.
async fn fetch(client: &reqwest::Client, url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{url} returned HTTP {status}");
    }

    let progress = show_progress.then(|| progress_bar(response.content_length()));

    let partial = dest.with_extension("part");
    let mut out = File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {url} was interrupted"))?
    {
        out.write_all(&chunk)
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        written += chunk.len() as u64;
        if let Some(pb) = &progress {
            pb.set_position(written);
        }
    }
    out.flush()?;
    drop(out);

    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    info!(url, bytes = written, dest = %dest.display(), "Model file downloaded");
    Ok(())
}

/// A byte bar when the size is known, otherwise a spinner.
fn progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    {bar:40.green/white} {bytes:>10}/{total_bytes} eta {eta}")
                    .expect("valid template")
                    .progress_chars("#>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes} received")
                    .expect("valid template"),
            );
            pb
        }
    }
}
