//! Trigram embedding provider using grapheme trigram hashing.

use crate::embeddings::provider::EmbeddingProvider;
use petpal_core::AppResult;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Trigram-based embedding provider for local, offline operation.
///
/// Tokens are split on whitespace and punctuation, then hashed as grapheme
/// trigrams plus the whole token. Working on graphemes keeps Thai vowel and
/// tone marks attached to their consonant, so unspaced Thai text still shares
/// trigrams with queries that mention the same words.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn bucket(&self, key: &str, seed: u64) -> usize {
        let hash = key
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));
        (hash as usize) % self.dimensions
    }

    fn generate_trigram_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let mut token_freq: HashMap<String, u32> = HashMap::new();
        for token in Self::tokens(text) {
            *token_freq.entry(token).or_insert(0) += 1;
        }

        for (token, freq) in &token_freq {
            let graphemes: Vec<&str> = token.graphemes(true).collect();
            let weight = (*freq as f32).sqrt();

            if graphemes.len() >= 3 {
                for window in graphemes.windows(3) {
                    let trigram = window.concat();
                    embedding[self.bucket(&trigram, 17)] += weight;
                }
            } else {
                embedding[self.bucket(token, 17)] += weight;
            }

            embedding[self.bucket(token, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v2"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_trigram_embedding(text))
            .collect())
    }
}
