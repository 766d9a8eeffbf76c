// Model-free embedder: character n-gram feature hashing.
//
// Used when the ONNX model hasn't been downloaded and in tests. Each
// character unigram and bigram is hashed (FNV-1a) into one of `dim` buckets
// with a sign bit, giving a sparse count vector. A token scores high against
// a document when the document uses its characters and character pairs a
// lot, which is a crude but deterministic proxy for relatedness.

use anyhow::Result;

use super::embeddings::Embedding;
use super::traits::TextEmbedder;

/// Default number of hash buckets.
pub const DEFAULT_HASH_DIM: usize = 256;

/// Documents longer than this many characters are truncated before hashing.
pub const DOCUMENT_MAX_CHARS: usize = 4096;

/// Tokens longer than this many characters are truncated before hashing.
pub const TOKEN_MAX_CHARS: usize = 64;

pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str, max_chars: usize) -> Embedding {
        let mut vector = vec![0.0_f64; self.dim];
        let chars: Vec<char> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(max_chars)
            .collect();

        let mut buf = [0u8; 8];
        for (i, &c) in chars.iter().enumerate() {
            self.accumulate(&mut vector, c.encode_utf8(&mut buf).as_bytes());
            if let Some(&next) = chars.get(i + 1) {
                let mut pair = String::with_capacity(8);
                pair.push(c);
                pair.push(next);
                self.accumulate(&mut vector, pair.as_bytes());
            }
        }

        Embedding::new(vector)
    }

    fn accumulate(&self, vector: &mut [f64], feature: &[u8]) {
        let h = fnv1a(feature);
        let bucket = (h % self.dim as u64) as usize;
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl TextEmbedder for HashEmbedder {
    fn embed_document(&self, text: &str) -> Result<Embedding> {
        Ok(self.embed(text, DOCUMENT_MAX_CHARS))
    }

    fn embed_token(&self, token: &str) -> Result<Embedding> {
        Ok(self.embed(token, TOKEN_MAX_CHARS))
    }
}
