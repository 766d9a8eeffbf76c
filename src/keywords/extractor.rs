// Keyword extraction — rank frequent noun candidates by semantic similarity
// to the entity's whole text.
//
// For one entity:
// 1. Count noun candidates across every record's title and body
// 2. Keep candidates seen at least `min_freq` times
// 3. Embed the entity's concatenated text once
// 4. Embed each candidate and score it by cosine similarity to the document
// 5. Stable-sort by score (ties keep first-seen order) and keep the top K
//
// The profile stores raw frequencies, not scores: downstream consumers
// re-sort by frequency for display and use the keys for buzz counting.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, info};

use super::profile::{KeywordEntry, KeywordProfile};
use super::tokenizer::NounTokenizer;
use super::traits::TextEmbedder;
use crate::corpus::TextRecord;
use crate::error::AnalysisError;

/// Default number of keywords kept per entity.
pub const DEFAULT_TOP_K: usize = 15;

/// Default minimum candidate frequency.
pub const DEFAULT_MIN_FREQ: u32 = 2;

pub struct KeywordExtractor<'a> {
    tokenizer: NounTokenizer,
    embedder: &'a dyn TextEmbedder,
    top_k: usize,
    min_freq: u32,
}

impl<'a> KeywordExtractor<'a> {
    /// Build an extractor around a shared embedder.
    ///
    /// `top_k` and `min_freq` must both be at least 1.
    pub fn new(
        embedder: &'a dyn TextEmbedder,
        top_k: usize,
        min_freq: u32,
    ) -> Result<Self, AnalysisError> {
        if top_k == 0 {
            return Err(AnalysisError::InvalidParameter(
                "top_k must be greater than 0".to_string(),
            ));
        }
        if min_freq == 0 {
            return Err(AnalysisError::InvalidParameter(
                "min_freq must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            tokenizer: NounTokenizer::new(),
            embedder,
            top_k,
            min_freq,
        })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn min_freq(&self) -> u32 {
        self.min_freq
    }

    /// Extract the keyword profile for one entity.
    ///
    /// Records belonging to other entities are ignored. No records, or no
    /// candidate reaching `min_freq`, gives an empty profile rather than an
    /// error.
    pub fn extract(&self, entity: &str, records: &[TextRecord]) -> Result<KeywordProfile> {
        let own: Vec<&TextRecord> = records.iter().filter(|r| r.entity == entity).collect();
        if own.is_empty() {
            debug!(entity, "No records for entity");
            return Ok(KeywordProfile::new(entity, None, Vec::new()));
        }

        let counts = self.tokenizer.count(
            own.iter()
                .flat_map(|r| [r.title.as_deref(), r.body.as_deref()]),
        );
        let candidates = counts.surviving(self.min_freq);

        if candidates.is_empty() {
            debug!(
                entity,
                distinct_nouns = counts.len(),
                min_freq = self.min_freq,
                "No candidates reached the minimum frequency"
            );
            return Ok(KeywordProfile::new(entity, None, Vec::new()));
        }

        let document: String = own
            .iter()
            .map(|r| r.full_text())
            .collect::<Vec<_>>()
            .join(" ");
        let doc_embedding = self.embedder.embed_document(&document)?;

        let tokens: Vec<String> = candidates.iter().map(|(t, _)| t.clone()).collect();
        let token_embeddings = self.embedder.embed_tokens(&tokens)?;
        if token_embeddings.len() != tokens.len() {
            return Err(AnalysisError::EmbeddingCount {
                expected: tokens.len(),
                actual: token_embeddings.len(),
            }
            .into());
        }

        let mut scored: Vec<(String, u32, f64)> = candidates
            .into_iter()
            .zip(token_embeddings.iter())
            .map(|((token, freq), emb)| (token, freq, doc_embedding.similarity(emb)))
            .collect();

        // sort_by is stable: equal scores keep first-seen order.
        scored.sort_by(|a, b| b.2.total_cmp(&a.2));
        scored.truncate(self.top_k);

        if let Some((top, _, score)) = scored.first() {
            info!(
                entity,
                records = own.len(),
                candidates = tokens.len(),
                kept = scored.len(),
                top_keyword = %top,
                top_score = score,
                "Extracted keywords"
            );
        }

        let entries = scored
            .into_iter()
            .map(|(keyword, frequency, _)| KeywordEntry { keyword, frequency })
            .collect();

        Ok(KeywordProfile::new(entity, None, entries))
    }

    /// Extract profiles for every entity in the corpus, in entity name order.
    ///
    /// Entities that produce no keywords are left out.
    pub fn extract_all(
        &self,
        records: &[TextRecord],
        candidate: Option<&str>,
    ) -> Result<Vec<KeywordProfile>> {
        let entities: BTreeSet<&str> = records.iter().map(|r| r.entity.as_str()).collect();
        let mut profiles = Vec::with_capacity(entities.len());

        for entity in entities {
            let mut profile = self.extract(entity, records)?;
            if profile.is_empty() {
                info!(entity, "No keywords extracted, skipping");
                continue;
            }
            profile.candidate = candidate.map(str::to_string);
            profiles.push(profile);
        }

        Ok(profiles)
    }
}
