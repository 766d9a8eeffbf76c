// Text embedder trait — swap-ready abstraction over the embedding backend.
//
// The keyword extractor only needs "turn this text into a vector". The
// default implementation runs a local ONNX encoder; HashEmbedder is a
// model-free fallback that keeps the pipeline usable before the model is
// downloaded.

use anyhow::Result;

use super::embeddings::Embedding;

/// Produces embeddings for documents and single tokens.
///
/// Implementations are expensive to construct and cheap to share: build one
/// at startup and pass it by reference. Outputs must be deterministic for a
/// given input and configuration.
pub trait TextEmbedder: Send + Sync {
    /// Embed a whole document. Long input is truncated to the implementation's
    /// documented maximum span.
    fn embed_document(&self, text: &str) -> Result<Embedding>;

    /// Embed a short string such as a single keyword.
    fn embed_token(&self, token: &str) -> Result<Embedding>;

    /// Embed many tokens, returning results in the same order.
    /// Default implementation calls embed_token sequentially.
    fn embed_tokens(&self, tokens: &[String]) -> Result<Vec<Embedding>> {
        tokens.iter().map(|t| self.embed_token(t)).collect()
    }
}
