//! Sentence embeddings using Model2Vec

use crate::error::{MatcherError, Result};
use anyhow::Context;
use log::info;
use model2vec_rs::model::StaticModel;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Text → fixed-length vector, one per input, order preserved.
///
/// Implementations must be deterministic and must report an unusable model as
/// [`MatcherError::DependencyUnavailable`] instead of returning zero vectors.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn name(&self) -> &str;
}

pub struct Model2VecProvider {
    model: StaticModel,
    model_name: String,
    batch_size: usize,
}

impl Model2VecProvider {
    /// Load from a local directory or a HuggingFace repo id
    pub fn load(model: &str, batch_size: usize) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model: {}", model);

        let static_model = StaticModel::from_pretrained(
            model,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load embedding model '{}'", model))?;

        info!("Embedding model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model: static_model,
            model_name: model.to_string(),
            batch_size: batch_size.max(1),
        })
    }
}

impl EmbeddingProvider for Model2VecProvider {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.model.encode(batch));
        }
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Run `embed` off the async executor under a deadline.
///
/// Timeouts, panics inside the model and a wrong number of vectors all surface as
/// [`MatcherError::DependencyUnavailable`].
pub async fn embed_with_timeout(
    provider: Arc<dyn EmbeddingProvider>,
    texts: Vec<String>,
    timeout: Duration,
) -> Result<Vec<Vec<f32>>> {
    let expected = texts.len();
    let name = provider.name().to_string();
    let task = tokio::task::spawn_blocking(move || provider.embed(&texts));

    let embeddings = match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            return Err(MatcherError::DependencyUnavailable(format!(
                "Embedding model '{}' timed out after {:?}",
                name, timeout
            )))
        }
        Ok(Err(join_error)) => {
            return Err(MatcherError::DependencyUnavailable(format!(
                "Embedding model '{}' crashed: {}",
                name, join_error
            )))
        }
        Ok(Ok(result)) => result?,
    };

    if embeddings.len() != expected {
        return Err(MatcherError::DependencyUnavailable(format!(
            "Embedding model '{}' returned {} vectors for {} inputs",
            name,
            embeddings.len(),
            expected
        )));
    }

    Ok(embeddings)
}

/// Cosine similarity in [-1, 1]; zero-norm vectors give 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatcherError::Inference(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Usable embedding: non-empty, finite everywhere, of the expected dimension
pub fn check_embedding(embedding: &[f32], expected_dim: usize) -> Result<()> {
    if embedding.is_empty() || embedding.len() != expected_dim {
        return Err(MatcherError::Inference(format!(
            "Embedding has dimension {}, expected {}",
            embedding.len(),
            expected_dim
        )));
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(MatcherError::Inference(
            "Embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
