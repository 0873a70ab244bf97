//! Sentence embedding backends built on fastembed, with a hashing fallback.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use anyhow::Result;
use tracing::info;

#[cfg(feature = "embeddings")]
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

/// Text → vector encoder used by the summarizer.
pub trait SentenceEncoder: Send + Sync {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

const HASH_DIMENSIONS: usize = 512;

/// Hashed bag-of-words vectors. Deterministic and model free.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingEncoder;

impl SentenceEncoder for HashingEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| hash_vector(text)).collect())
    }
}

fn hash_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; HASH_DIMENSIONS];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
    {
        let mut hasher = DefaultHasher::new();
        token.to_lowercase().hash(&mut hasher);
        let bucket = (hasher.finish() % HASH_DIMENSIONS as u64) as usize;
        vector[bucket] += 1.0;
    }
    vector
}

/// MiniLM sentence embeddings through fastembed.
#[cfg(feature = "embeddings")]
pub struct FastEmbedEncoder {
    model: std::sync::Mutex<TextEmbedding>,
}

#[cfg(feature = "embeddings")]
impl FastEmbedEncoder {
    pub fn try_new() -> Result<Self> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "embeddings")]
impl SentenceEncoder for FastEmbedEncoder {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding model lock poisoned"))?;
        Ok(model.embed(texts.to_vec(), None)?)
    }
}

/// Load the pretrained encoder when available.
pub async fn load_encoder() -> Result<Arc<dyn SentenceEncoder>> {
    #[cfg(feature = "embeddings")]
    {
        let encoder = tokio::task::spawn_blocking(FastEmbedEncoder::try_new).await??;
        info!("loaded fastembed sentence encoder");
        Ok(Arc::new(encoder) as Arc<dyn SentenceEncoder>)
    }
    #[cfg(not(feature = "embeddings"))]
    {
        info!("embeddings feature disabled; using hashing encoder");
        Ok(Arc::new(HashingEncoder) as Arc<dyn SentenceEncoder>)
    }
}

/// Cosine similarity, zero when either vector has no magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        assert!((cosine(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn hashing_is_case_insensitive() {
        let vectors = HashingEncoder.encode(&["Chest Pain", "chest pain"]).unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }
}
