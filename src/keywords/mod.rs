// Keyword extraction — noun candidates ranked by embedding similarity.

pub mod download;
pub mod embeddings;
pub mod extractor;
pub mod hashing;
pub mod profile;
pub mod tokenizer;
pub mod traits;
