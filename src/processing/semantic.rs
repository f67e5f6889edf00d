//! Semantic scoring: rescaled cosine similarity and the trained re-ranker

use crate::error::{MatcherError, Result};
use crate::processing::embeddings::cosine_similarity;
use crate::processing::network::FeedForward;
use candle_core::Device;
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Map cosine in [-1, 1] onto the 0..100 match scale
pub fn rescale_cosine(cosine: f32) -> f32 {
    (cosine.clamp(-1.0, 1.0) + 1.0) * 50.0
}

/// Map a match probability in [0, 1] onto the 0..100 match scale
pub fn rescale_probability(probability: f32) -> f32 {
    probability.clamp(0.0, 1.0) * 100.0
}

/// Cosine similarity of two embeddings on the 0..100 scale
pub fn similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok(rescale_cosine(cosine_similarity(a, b)?))
}

/// Embeddings of one CV and one job, in that order
pub type EmbeddingPair = (Vec<f32>, Vec<f32>);

/// Learned match probability for (CV, job) embedding pairs
pub trait Reranker: Send + Sync {
    /// One probability in [0, 1] per pair; a non-finite value marks a failed pair
    fn score_pairs(&self, pairs: &[EmbeddingPair]) -> Result<Vec<f32>>;

    fn name(&self) -> &str;
}

/// Feed-forward re-ranker over `[cv, job, |cv - job|, cv * job]` with a sigmoid output
pub struct CandleReranker {
    network: FeedForward,
    name: String,
}

impl CandleReranker {
    /// Load `model.safetensors` from a model directory
    pub fn load(dir: &Path, device: &Device) -> Result<Self> {
        let network = FeedForward::load(&dir.join("model.safetensors"), device)?;
        let reranker = Self::from_network(network, dir.display().to_string())
            .map_err(|e| MatcherError::DependencyUnavailable(e.to_string()))?;
        info!(
            "Loaded re-ranker from {} ({} input features)",
            dir.display(),
            reranker.network.input_dim()
        );
        Ok(reranker)
    }

    pub fn from_network(network: FeedForward, name: impl Into<String>) -> Result<Self> {
        if network.output_dim() != 1 || network.input_dim() % 4 != 0 {
            return Err(MatcherError::Inference(format!(
                "re-ranker must map 4*d features to 1 output, got {} -> {}",
                network.input_dim(),
                network.output_dim()
            )));
        }
        Ok(Self {
            network,
            name: name.into(),
        })
    }

    /// Embedding dimension the network was trained on
    pub fn embedding_dim(&self) -> usize {
        self.network.input_dim() / 4
    }

    pub fn pair_features(cv: &[f32], job: &[f32]) -> Vec<f32> {
        let mut features = Vec::with_capacity(cv.len() * 4);
        features.extend_from_slice(cv);
        features.extend_from_slice(job);
        features.extend(cv.iter().zip(job).map(|(a, b)| (a - b).abs()));
        features.extend(cv.iter().zip(job).map(|(a, b)| a * b));
        features
    }
}

impl Reranker for CandleReranker {
    fn score_pairs(&self, pairs: &[EmbeddingPair]) -> Result<Vec<f32>> {
        let dim = self.embedding_dim();
        let mismatch = pairs
            .iter()
            .find(|(cv, job)| cv.len() != dim || job.len() != dim);
        if let Some((cv, job)) = mismatch {
            return Err(MatcherError::Inference(format!(
                "re-ranker expects {}-dimensional embeddings, got {} and {}",
                dim,
                cv.len(),
                job.len()
            )));
        }

        let rows: Vec<Vec<f32>> = pairs
            .iter()
            .map(|(cv, job)| Self::pair_features(cv, job))
            .collect();
        let outputs = self.network.forward_rows(&rows)?;

        Ok(outputs
            .into_iter()
            .map(|row| row.first().map(|&logit| sigmoid(logit)).unwrap_or(f32::NAN))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Run the re-ranker off the async executor under a deadline
pub async fn rerank_with_timeout(
    reranker: Arc<dyn Reranker>,
    pairs: Vec<EmbeddingPair>,
    timeout: Duration,
) -> Result<Vec<f32>> {
    let expected = pairs.len();
    let name = reranker.name().to_string();
    let task = tokio::task::spawn_blocking(move || reranker.score_pairs(&pairs));

    let scores = match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            return Err(MatcherError::DependencyUnavailable(format!(
                "Re-ranker '{}' timed out after {:?}",
                name, timeout
            )))
        }
        Ok(Err(join_error)) => {
            return Err(MatcherError::DependencyUnavailable(format!(
                "Re-ranker '{}' crashed: {}",
                name, join_error
            )))
        }
        Ok(Ok(result)) => result?,
    };

    if scores.len() != expected {
        return Err(MatcherError::Inference(format!(
            "Re-ranker '{}' returned {} scores for {} pairs",
            name,
            scores.len(),
            expected
        )));
    }
    Ok(scores)
}
