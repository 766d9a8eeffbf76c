// Typed pipeline errors.
//
// Entity-level failures (no text, no keywords, no prices) are surfaced as
// distinct variants so callers can decide per entity whether to skip or
// abort. Everything else in the crate flows through anyhow; these variants
// can be recovered from an anyhow::Error with `downcast_ref`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No text records exist for the requested entity.
    #[error("no text records for {entity}")]
    MissingTextData { entity: String },

    /// No keyword profile exists for the requested entity. Usually means
    /// `extract` was never run for it.
    #[error("no keyword data for {entity}; run `themebuzz extract` first")]
    MissingKeywordData { entity: String },

    /// No price rows (or no price file) for the requested entity.
    #[error("no price data for {entity}")]
    MissingPriceData { entity: String },

    /// A persisted keyword map failed strict parsing.
    #[error("malformed keyword profile for {entity}: {source}")]
    MalformedProfile {
        entity: String,
        #[source]
        source: serde_json::Error,
    },

    /// The embedding model could not be loaded.
    #[error("failed to load embedding model: {0}")]
    ModelLoad(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An embedder returned a different number of vectors than tokens.
    #[error("embedder returned {actual} token embeddings for {expected} tokens")]
    EmbeddingCount { expected: usize, actual: usize },
}

impl AnalysisError {
    /// True for the "no data for this entity" family of errors.
    pub fn is_data_missing(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingTextData { .. }
                | AnalysisError::MissingKeywordData { .. }
                | AnalysisError::MissingPriceData { .. }
        )
    }
}
