//! Embedding generation
//!
//! [`Embed`] is the capability the builder and searcher depend on;
//! [`Embedder`] implements it with fastembed. The model is loaded once by the
//! caller and passed in, so tests can substitute a deterministic embedder.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{Config, DocseekError, Result};

/// Anything that turns texts into fixed-dimension vectors.
pub trait Embed {
    /// Generate embeddings for a batch of texts, one vector per text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| DocseekError::Embedding("No embedding generated".to_string()))
    }
}

/// Wrapper around fastembed for generating embeddings.
pub struct Embedder {
    model: TextEmbedding,
}

impl Embedder {
    /// Create a new embedder with the model specified in config.
    pub fn new(config: &Config) -> Result<Self> {
        let model_type = match config.model.as_str() {
            "all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
            "all-MiniLM-L12-v2" => EmbeddingModel::AllMiniLML12V2,
            "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
            "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
            "jina-embeddings-v2-base-code" => EmbeddingModel::JinaEmbeddingsV2BaseCode,
            other => {
                return Err(DocseekError::Embedding(format!(
                    "Unknown model: {}. Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2, bge-small-en-v1.5, bge-base-en-v1.5, jina-embeddings-v2-base-code",
                    other
                )));
            }
        };

        let model =
            TextEmbedding::try_new(InitOptions::new(model_type).with_show_download_progress(true))
                .map_err(|e| DocseekError::Embedding(e.to_string()))?;

        Ok(Self { model })
    }
}

impl Embed for Embedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| DocseekError::Embedding(e.to_string()))
    }
}

/// Average a set of equal-length vectors into one.
///
/// Returns `None` for an empty set or when the lengths disagree.
pub fn mean_pool(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f32; dim];
    for vector in vectors {
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += value;
        }
    }

    let count = vectors.len() as f32;
    Some(sum.into_iter().map(|v| v / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    impl Embed for LengthEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    #[test]
    fn test_default_embed_uses_batch() {
        assert_eq!(LengthEmbedder.embed("abc").unwrap(), vec![3.0, 1.0]);
    }

    #[test]
    fn test_mean_pool() {
        let pooled = mean_pool(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(pooled, vec![2.0, 4.0]);
    }

    #[test]
    fn test_mean_pool_rejects_bad_input() {
        assert!(mean_pool(&[]).is_none());
        assert!(mean_pool(&[vec![]]).is_none());
        assert!(mean_pool(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn test_unknown_model_rejected() {
        let config = Config {
            model: "no-such-model".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            Embedder::new(&config),
            Err(DocseekError::Embedding(_))
        ));
    }
}
