// Embeddings for keyword ranking, using a local BERT-style ONNX encoder.
//
// Two pooling strategies, matching how the ranking compares text:
//   - documents use the [CLS] hidden state, input truncated to 512 tokens
//   - single tokens use the attention-masked mean of hidden states,
//     input truncated to 20 tokens
// Cosine similarity between a document vector and a token vector is the
// ranking signal for keyword extraction.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::debug;

use super::traits::TextEmbedder;
use crate::error::AnalysisError;

/// Maximum tokens fed to the encoder for a document embedding.
pub const DOCUMENT_MAX_TOKENS: usize = 512;

/// Maximum tokens fed to the encoder for a single keyword.
pub const TOKEN_MAX_TOKENS: usize = 20;

/// A dense vector for a span of text. Only comparable with embeddings from
/// the same embedder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity with another embedding, in [-1, 1].
    pub fn similarity(&self, other: &Embedding) -> f64 {
        cosine_similarity(&self.0, &other.0)
    }
}

/// Cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]; mismatched dimensions, empty input, a zero
/// vector or non-finite components give 0.0. Symmetric in its arguments.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (&x, &y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let norms = (norm_a * norm_b).sqrt();
    let score = dot / norms;
    if norms <= f64::EPSILON || !score.is_finite() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0)
}

/// BERT-style encoder running on ONNX Runtime.
///
/// `Session::run` takes `&mut self`, so the session sits behind a Mutex:
/// concurrent callers sharing one embedder are serialized around each
/// inference call.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    document_tokenizer: Tokenizer,
    token_tokenizer: Tokenizer,
    pad_id: i64,
    graph_inputs: GraphInputs,
}

/// Optional encoder inputs, as declared by the loaded graph.
///
/// BERT exports take `token_type_ids`; XLM-RoBERTa exports (the default
/// multilingual model) take only `input_ids` and `attention_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GraphInputs {
    token_type_ids: bool,
}

impl GraphInputs {
    fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            token_type_ids: names.into_iter().any(|n| n == "token_type_ids"),
        }
    }
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    ///
    /// Missing or unreadable files are a `ModelLoad` error; run
    /// `themebuzz download-model` first.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if let Some(missing) = [&model_path, &tokenizer_path]
            .into_iter()
            .find(|p| !p.exists())
        {
            return Err(AnalysisError::ModelLoad(format!(
                "{} not found. Run `themebuzz download-model` to download it.",
                missing.display()
            ))
            .into());
        }

        let session = Session::builder()
            .map_err(|e| AnalysisError::ModelLoad(format!("session builder: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| AnalysisError::ModelLoad(format!("{}: {e}", model_path.display())))?;

        let graph_inputs = GraphInputs::from_names(session.inputs().iter().map(|i| i.name()));

        let base = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| AnalysisError::ModelLoad(format!("tokenizer: {e}")))?;

        // BERT vocabularies use [PAD]; XLM-R style ones use <pad>.
        let pad_id = ["[PAD]", "<pad>"]
            .iter()
            .find_map(|t| base.token_to_id(t))
            .unwrap_or(0) as i64;

        let document_tokenizer = with_max_length(base.clone(), DOCUMENT_MAX_TOKENS)?;
        let token_tokenizer = with_max_length(base, TOKEN_MAX_TOKENS)?;

        debug!(
            model_dir = %model_dir.display(),
            pad_id,
            token_type_ids = graph_inputs.token_type_ids,
            "Loaded ONNX embedding model"
        );

        Ok(Self {
            session: Mutex::new(session),
            document_tokenizer,
            token_tokenizer,
            pad_id,
            graph_inputs,
        })
    }

    /// Run the encoder over a batch and keep the last hidden state.
    fn forward(&self, encodings: &[Encoding]) -> Result<HiddenStates> {
        let batch = BatchInputs::pad(encodings, self.pad_id);
        if batch.rows == 0 || batch.max_len == 0 {
            return Ok(HiddenStates {
                data: Vec::new(),
                mask: Vec::new(),
                max_len: batch.max_len,
                dim: 0,
            });
        }

        let (rows, max_len) = (batch.rows, batch.max_len);
        let shape = [rows as i64, max_len as i64];
        let mask = batch.attention_mask.clone();
        let feeds = batch
            .into_feeds(self.graph_inputs)
            .into_iter()
            .map(|(name, values)| {
                Tensor::from_array((shape, values))
                    .map(|tensor| (name, tensor))
                    .with_context(|| format!("{name} tensor"))
            })
            .collect::<Result<Vec<_>>>()?;

        let data = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Embedding session lock poisoned: {e}"))?;
            let outputs = session.run(feeds).context("Embedding inference failed")?;

            // Output 0: last_hidden_state [batch, seq_len, hidden]
            let (_, hidden) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Unexpected hidden state output")?;
            hidden.to_vec()
        };

        let dim = data.len() / (rows * max_len);
        Ok(HiddenStates {
            data,
            mask,
            max_len,
            dim,
        })
    }

    fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoding> {
        tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Failed to tokenize {text:?}: {e}"))
    }
}

fn with_max_length(mut tokenizer: Tokenizer, max_length: usize) -> Result<Tokenizer> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| AnalysisError::ModelLoad(format!("tokenizer truncation: {e}")))?;
    Ok(tokenizer)
}

/// Row-major encoder inputs, right-padded to the longest encoding.
struct BatchInputs {
    rows: usize,
    max_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl BatchInputs {
    fn pad(encodings: &[Encoding], pad_id: i64) -> Self {
        let rows = encodings.len();
        let max_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);
        let cells = rows * max_len;

        let mut batch = Self {
            rows,
            max_len,
            input_ids: Vec::with_capacity(cells),
            attention_mask: Vec::with_capacity(cells),
            token_type_ids: vec![0; cells],
        };

        for encoding in encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();
            batch.input_ids.extend(
                ids.iter()
                    .map(|&id| i64::from(id))
                    .chain(std::iter::repeat_n(pad_id, padding)),
            );
            batch.attention_mask.extend(
                encoding
                    .get_attention_mask()
                    .iter()
                    .map(|&m| i64::from(m))
                    .chain(std::iter::repeat_n(0, padding)),
            );
        }

        batch
    }

    /// Named input columns, in feed order. `token_type_ids` is fed only
    /// when the graph declares it.
    fn into_feeds(self, graph: GraphInputs) -> Vec<(&'static str, Vec<i64>)> {
        let mut feeds = vec![
            ("input_ids", self.input_ids),
            ("attention_mask", self.attention_mask),
        ];
        if graph.token_type_ids {
            feeds.push(("token_type_ids", self.token_type_ids));
        }
        feeds
    }
}

/// Flattened `[rows, max_len, dim]` hidden states plus the attention mask.
struct HiddenStates {
    data: Vec<f32>,
    mask: Vec<i64>,
    max_len: usize,
    dim: usize,
}

impl HiddenStates {
    fn position(&self, row: usize, pos: usize) -> &[f32] {
        let start = (row * self.max_len + pos) * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Hidden state of the first position ([CLS]).
    fn cls(&self, row: usize) -> Vec<f64> {
        self.position(row, 0).iter().map(|&v| f64::from(v)).collect()
    }

    /// Mean over positions whose attention mask is set.
    fn mean_pooled(&self, row: usize) -> Vec<f64> {
        let mut sum = vec![0.0_f64; self.dim];
        let mut count = 0usize;

        let row_mask = &self.mask[row * self.max_len..(row + 1) * self.max_len];
        for (pos, _) in row_mask.iter().enumerate().filter(|(_, &m)| m > 0) {
            for (acc, &v) in sum.iter_mut().zip(self.position(row, pos)) {
                *acc += f64::from(v);
            }
            count += 1;
        }

        if count > 0 {
            let n = count as f64;
            sum.iter_mut().for_each(|v| *v /= n);
        }
        sum
    }
}

impl TextEmbedder for OnnxEmbedder {
    fn embed_document(&self, text: &str) -> Result<Embedding> {
        let encoding = Self::encode(&self.document_tokenizer, text)?;
        let states = self.forward(std::slice::from_ref(&encoding))?;
        if states.dim == 0 {
            return Ok(Embedding::new(Vec::new()));
        }
        Ok(Embedding::new(states.cls(0)))
    }

    fn embed_token(&self, token: &str) -> Result<Embedding> {
        let encoding = Self::encode(&self.token_tokenizer, token)?;
        let states = self.forward(std::slice::from_ref(&encoding))?;
        if states.dim == 0 {
            return Ok(Embedding::new(Vec::new()));
        }
        Ok(Embedding::new(states.mean_pooled(0)))
    }

    /// One forward pass for the whole batch, mean-pooled per token.
    fn embed_tokens(&self, tokens: &[String]) -> Result<Vec<Embedding>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = tokens
            .iter()
            .map(|t| Self::encode(&self.token_tokenizer, t))
            .collect::<Result<Vec<_>>>()?;

        let states = self.forward(&encodings)?;
        if states.dim == 0 {
            return Ok(vec![Embedding::new(Vec::new()); tokens.len()]);
        }

        debug!(
            batch_size = tokens.len(),
            dim = states.dim,
            "Computed token embeddings"
        );

        Ok((0..tokens.len())
            .map(|row| Embedding::new(states.mean_pooled(row)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_same_direction_scores_one() {
        assert!(close(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0));
        assert!(close(cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0));
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(close(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(close(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0));
    }

    #[test]
    fn test_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[f64::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = Embedding::new(vec![1.0, 3.0, -2.0, 0.5]);
        let b = Embedding::new(vec![2.0, -1.0, 4.0, 0.0]);
        assert!((a.similarity(&b) - b.similarity(&a)).abs() < 1e-12);
    }

    #[test]
    fn test_pooling_skips_padding() {
        // One row, three positions, the last padded; hidden dim 2.
        let states = HiddenStates {
            data: vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0],
            mask: vec![1, 1, 0],
            max_len: 3,
            dim: 2,
        };
        assert_eq!(states.mean_pooled(0), vec![2.0, 3.0]);
        assert_eq!(states.cls(0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_pooling_second_row() {
        let states = HiddenStates {
            data: vec![0.0, 0.0, 0.0, 0.0, 5.0, 7.0, 9.0, 11.0],
            mask: vec![1, 1, 1, 0],
            max_len: 2,
            dim: 2,
        };
        assert_eq!(states.cls(1), vec![5.0, 7.0]);
        assert_eq!(states.mean_pooled(1), vec![5.0, 7.0]);
    }

    /// Word-level tokenizer over a five-word vocabulary, split on whitespace.
    fn word_tokenizer() -> Tokenizer {
        let json = r#"{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {"type": "WhitespaceSplit"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {"[PAD]": 0, "[UNK]": 1, "a": 2, "b": 3, "c": 4},
                "unk_token": "[UNK]"
            }
        }"#;
        json.parse().unwrap()
    }

    fn encode(tokenizer: &Tokenizer, text: &str) -> Encoding {
        OnnxEmbedder::encode(tokenizer, text).unwrap()
    }

    #[test]
    fn test_batch_right_padded_and_masked() {
        let tokenizer = word_tokenizer();
        let encodings = [encode(&tokenizer, "a b c"), encode(&tokenizer, "c")];

        let batch = BatchInputs::pad(&encodings, 0);
        assert_eq!((batch.rows, batch.max_len), (2, 3));
        assert_eq!(batch.input_ids, vec![2, 3, 4, 4, 0, 0]);
        assert_eq!(batch.attention_mask, vec![1, 1, 1, 1, 0, 0]);
        assert_eq!(batch.token_type_ids, vec![0; 6]);
    }

    #[test]
    fn test_batch_pads_with_given_id() {
        let tokenizer = word_tokenizer();
        let encodings = [encode(&tokenizer, "a"), encode(&tokenizer, "b z")];

        let batch = BatchInputs::pad(&encodings, 7);
        // Unknown words map to [UNK].
        assert_eq!(batch.input_ids, vec![2, 7, 3, 1]);
        assert_eq!(batch.attention_mask, vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_empty_batch() {
        let batch = BatchInputs::pad(&[], 0);
        assert_eq!((batch.rows, batch.max_len), (0, 0));
        assert!(batch.input_ids.is_empty());
    }

    #[test]
    fn test_long_input_truncated() {
        let long_text = vec!["a"; DOCUMENT_MAX_TOKENS + 100].join(" ");

        let document = with_max_length(word_tokenizer(), DOCUMENT_MAX_TOKENS).unwrap();
        assert_eq!(encode(&document, &long_text).len(), DOCUMENT_MAX_TOKENS);

        let token = with_max_length(word_tokenizer(), TOKEN_MAX_TOKENS).unwrap();
        assert_eq!(encode(&token, &long_text).len(), TOKEN_MAX_TOKENS);
        assert_eq!(encode(&token, "a b").len(), 2);
    }

    #[test]
    fn test_token_type_ids_fed_only_when_declared() {
        let bert = GraphInputs::from_names(["input_ids", "attention_mask", "token_type_ids"]);
        let xlm_r = GraphInputs::from_names(["input_ids", "attention_mask"]);
        assert!(bert.token_type_ids);
        assert!(!xlm_r.token_type_ids);

        let tokenizer = word_tokenizer();
        let encodings = [encode(&tokenizer, "a b")];

        let names = |graph: GraphInputs| -> Vec<&'static str> {
            BatchInputs::pad(&encodings, 0)
                .into_feeds(graph)
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        };
        assert_eq!(names(xlm_r), vec!["input_ids", "attention_mask"]);
        assert_eq!(
            names(bert),
            vec!["input_ids", "attention_mask", "token_type_ids"]
        );
    }

    #[test]
    fn test_feed_columns_carry_batch_values() {
        let tokenizer = word_tokenizer();
        let encodings = [encode(&tokenizer, "a b"), encode(&tokenizer, "c")];
        let graph = GraphInputs::from_names(["input_ids", "attention_mask"]);

        let feeds = BatchInputs::pad(&encodings, 0).into_feeds(graph);
        assert_eq!(feeds[0].1, vec![2, 3, 4, 0]);
        assert_eq!(feeds[1].1, vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_load_without_files_is_model_load_error() {
        let dir = std::env::temp_dir().join("themebuzz-missing-model");
        let err = match OnnxEmbedder::load(&dir) {
            Ok(_) => panic!("load should fail without model files"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::ModelLoad(_))
        ));
    }
}
