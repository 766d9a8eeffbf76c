use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use themebuzz::buzz::{aggregate, merge, periods};
use themebuzz::config::{self, Config, EmbedderBackend};
use themebuzz::corpus::{loader, DateWindow, TextRecord};
use themebuzz::db::{self, models::ExtractionRun, queries};
use themebuzz::error::AnalysisError;
use themebuzz::keywords::extractor::KeywordExtractor;
use themebuzz::keywords::profile::{KeywordProfile, ProfileSet};
use themebuzz::keywords::traits::TextEmbedder;
use themebuzz::output::terminal;

/// Themebuzz: keyword buzz vs. price for election theme stocks.
///
/// Extracts representative keywords for each stock from news and community
/// posts, then counts daily keyword mentions against the stock's closing
/// price.
#[derive(Parser)]
#[command(name = "themebuzz", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Download the ONNX sentence embedding model (~470 MB)
    DownloadModel,

    /// Extract keyword profiles from a text corpus and store them
    Extract {
        /// Normalized corpus CSV (entity,date,title,body)
        #[arg(long)]
        corpus: PathBuf,

        /// Election candidate the stocks are themed on (e.g. 이재명)
        #[arg(long)]
        candidate: Option<String>,

        /// Only extract this entity
        #[arg(long)]
        entity: Option<String>,

        /// Keywords kept per entity (default: THEMEBUZZ_TOP_K or 15)
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum candidate frequency (default: THEMEBUZZ_MIN_FREQ or 2)
        #[arg(long)]
        min_freq: Option<u32>,
    },

    /// Show stored keyword profiles
    Keywords {
        /// Show one entity's keywords as a chart
        #[arg(long)]
        entity: Option<String>,

        /// Only list profiles for this candidate
        #[arg(long)]
        candidate: Option<String>,

        /// Number of keywords to show (default: 15)
        #[arg(long, default_value = "15")]
        top: usize,
    },

    /// Count keyword mentions per day and merge them with closing prices
    Buzz {
        /// Normalized corpus CSV (entity,date,title,body)
        #[arg(long)]
        corpus: PathBuf,

        /// Directory of per-entity price CSVs (Date,Close,...)
        #[arg(long)]
        prices: PathBuf,

        /// Entity to analyze. Without it, every stored profile is analyzed.
        #[arg(long)]
        entity: Option<String>,

        /// With no --entity, only analyze profiles for this candidate
        #[arg(long)]
        candidate: Option<String>,

        /// Election round window (20 or 21)
        #[arg(long)]
        round: Option<u32>,

        /// Window start (YYYY-MM-DD), overrides the round's start
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Window end (YYYY-MM-DD), overrides the round's end
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Write <entity>.csv (date,close,total_mentions) into this directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also print the quiet-period summary
        #[arg(long)]
        summary: bool,
    },

    /// Show system status (DB stats, stored profiles, last extraction)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("themebuzz=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing themebuzz database...");
            let config = Config::load()?;
            let conn = db::initialize(&config.db_path)?;
            let table_count = db::schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext steps:");
            println!("  themebuzz download-model");
            println!("  themebuzz extract --corpus <corpus.csv> --candidate <name>");
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX model...");
            println!("  Destination: {}", model_dir.display());

            themebuzz::keywords::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `themebuzz extract --corpus <corpus.csv>`.");
        }

        Commands::Extract {
            corpus,
            candidate,
            entity,
            top_k,
            min_freq,
        } => {
            let config = Config::load()?;
            config.require_embedder()?;
            let conn = db::initialize(&config.db_path)?;

            let top_k = top_k.unwrap_or(config.top_k);
            let min_freq = min_freq.unwrap_or(config.min_freq);

            let records = loader::load_corpus(&corpus)?;
            let record_count = records.len();
            let embedder = create_embedder(&config)?;

            println!(
                "Extracting keywords from {} records (top_k={}, min_freq={})...",
                record_count, top_k, min_freq
            );

            // Inference is CPU-bound; keep it off the async runtime.
            let run_candidate = candidate.clone();
            let profiles = tokio::task::spawn_blocking(move || {
                extract_profiles(
                    embedder.as_ref(),
                    &records,
                    entity.as_deref(),
                    run_candidate.as_deref(),
                    top_k,
                    min_freq,
                )
            })
            .await??;

            for profile in &profiles {
                queries::save_profile(&conn, profile)?;
            }

            queries::record_run(
                &conn,
                &ExtractionRun {
                    candidate,
                    embedder: backend_name(&config.embedder_backend).to_string(),
                    top_k: u32::try_from(top_k).unwrap_or(u32::MAX),
                    min_freq,
                    records: u32::try_from(record_count).unwrap_or(u32::MAX),
                    profiles: u32::try_from(profiles.len()).unwrap_or(u32::MAX),
                    ran_at: String::new(),
                },
            )?;

            terminal::display_profile_list(&profiles);
            println!(
                "{}",
                format!("Saved {} keyword profiles.", profiles.len()).bold()
            );
        }

        Commands::Keywords {
            entity,
            candidate,
            top,
        } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;

            match entity {
                Some(entity) => {
                    let profile = queries::get_profile(&conn, &entity)?.ok_or_else(|| {
                        AnalysisError::MissingKeywordData {
                            entity: entity.clone(),
                        }
                    })?;
                    terminal::display_profile(&profile, top);
                }
                None => {
                    let profiles = queries::list_profiles(&conn, candidate.as_deref())?;
                    terminal::display_profile_list(&profiles);
                }
            }
        }

        Commands::Buzz {
            corpus,
            prices,
            entity,
            candidate,
            round,
            start,
            end,
            output,
            summary,
        } => {
            let config = Config::load()?;
            let conn = db::open(&config.db_path)?;
            let window = config::resolve_window(round, start, end)?;

            let records = loader::load_corpus(&corpus)?;

            let single = entity.is_some();
            let stored: Vec<KeywordProfile> = match &entity {
                Some(entity) => queries::get_profile(&conn, entity)?.into_iter().collect(),
                None => queries::list_profiles(&conn, candidate.as_deref())?,
            };
            let entities: Vec<String> = match entity {
                Some(entity) => vec![entity],
                None => stored.iter().map(|p| p.entity.clone()).collect(),
            };
            let profiles: ProfileSet = stored.into_iter().collect();

            if entities.is_empty() {
                println!("No keyword profiles stored. Run `themebuzz extract` first.");
                return Ok(());
            }

            for entity in &entities {
                let result = run_buzz(entity, &profiles, &records, &prices, &window);
                let merged = match result {
                    Ok(merged) => merged,
                    // With several entities, one without data shouldn't stop the rest.
                    Err(e) if !single && is_data_missing(&e) => {
                        warn!(entity = %entity, error = %e, "Skipping entity");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                terminal::display_merged(&merged);
                if summary {
                    terminal::display_quiet_periods(&periods::summarize(&merged));
                }
                if let Some(dir) = &output {
                    let path = dir.join(format!("{entity}.csv"));
                    loader::write_merged(&merged, &path)?;
                    println!("Wrote {}", path.display());
                }
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            themebuzz::status::show(&config)?;
        }
    }

    Ok(())
}

/// Build the configured embedder. Loading the ONNX model is the only
/// fatal startup cost; it happens once per command.
fn create_embedder(config: &Config) -> Result<Arc<dyn TextEmbedder>> {
    match config.embedder_backend {
        EmbedderBackend::Onnx => {
            info!("Using local ONNX sentence embedder");
            let dir = themebuzz::keywords::download::embedding_model_dir(&config.model_dir);
            let embedder = themebuzz::keywords::embeddings::OnnxEmbedder::load(&dir)?;
            Ok(Arc::new(embedder))
        }
        EmbedderBackend::Hash => {
            warn!("Using hashing embedder; keyword ranking will be approximate");
            Ok(Arc::new(themebuzz::keywords::hashing::HashEmbedder::default()))
        }
    }
}

fn backend_name(backend: &EmbedderBackend) -> &'static str {
    match backend {
        EmbedderBackend::Onnx => "onnx",
        EmbedderBackend::Hash => "hash",
    }
}

fn extract_profiles(
    embedder: &dyn TextEmbedder,
    records: &[TextRecord],
    entity: Option<&str>,
    candidate: Option<&str>,
    top_k: usize,
    min_freq: u32,
) -> Result<Vec<KeywordProfile>> {
    let extractor = KeywordExtractor::new(embedder, top_k, min_freq)?;

    let Some(entity) = entity else {
        return extractor.extract_all(records, candidate);
    };

    if !records.iter().any(|r| r.entity == entity) {
        return Err(AnalysisError::MissingTextData {
            entity: entity.to_string(),
        }
        .into());
    }

    let mut profile = extractor.extract(entity, records)?;
    if profile.is_empty() {
        warn!(
            entity,
            min_freq, "No noun reached the minimum frequency; nothing saved"
        );
        return Ok(Vec::new());
    }
    profile.candidate = candidate.map(str::to_string);
    Ok(vec![profile])
}

fn run_buzz(
    entity: &str,
    profiles: &ProfileSet,
    records: &[TextRecord],
    price_dir: &std::path::Path,
    window: &DateWindow,
) -> Result<merge::MergedSeries> {
    let buzz = aggregate::aggregate(entity, profiles, records, window)?;
    let prices = loader::load_price_series(price_dir, entity)?;
    let merged = merge::merge_with_prices(entity, &prices, &buzz, window)?;
    Ok(merged)
}

fn is_data_missing(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AnalysisError>()
        .is_some_and(AnalysisError::is_data_missing)
}
