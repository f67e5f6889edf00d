//! Category models producing a probability distribution over job labels

use crate::error::{MatcherError, Result};
use crate::processing::combiner::{Alternative, DecisionMethod};
use crate::processing::embeddings::{check_embedding, cosine_similarity, EmbeddingProvider};
use crate::processing::keyword_rules::RuleTable;
use crate::processing::network::FeedForward;
use candle_core::Device;
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Top label of a category model with its runners-up
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub label: String,
    pub confidence: f32,
    pub method: DecisionMethod,
    pub alternatives: Vec<Alternative>,
}

/// Embedding → distribution over `labels()`
pub trait CategoryModel: Send + Sync {
    fn labels(&self) -> &[String];

    /// Probabilities aligned with `labels()`, summing to 1
    fn predict(&self, embedding: &[f32]) -> Result<Vec<f32>>;

    fn method(&self) -> DecisionMethod;

    fn name(&self) -> &str;
}

/// Argmax of a distribution plus the `top_k` most likely labels
pub fn verdict_from_distribution(
    labels: &[String],
    probabilities: &[f32],
    method: DecisionMethod,
    top_k: usize,
) -> Result<ModelVerdict> {
    if labels.is_empty() || labels.len() != probabilities.len() {
        return Err(MatcherError::Inference(format!(
            "category model produced {} probabilities for {} labels",
            probabilities.len(),
            labels.len()
        )));
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(MatcherError::Inference(
            "category model produced non-finite probabilities".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]).then(a.cmp(&b)));

    let best = order[0];
    let alternatives = order
        .iter()
        .take(top_k.max(1))
        .map(|&i| Alternative {
            label: labels[i].clone(),
            confidence: probabilities[i],
        })
        .collect();

    Ok(ModelVerdict {
        label: labels[best].clone(),
        confidence: probabilities[best],
        method,
        alternatives,
    })
}

/// Run a category model off the async executor under a deadline
pub async fn predict_with_timeout(
    model: Arc<dyn CategoryModel>,
    embedding: Vec<f32>,
    top_k: usize,
    timeout: Duration,
) -> Result<ModelVerdict> {
    let name = model.name().to_string();
    let task = tokio::task::spawn_blocking(move || {
        let probabilities = model.predict(&embedding)?;
        verdict_from_distribution(model.labels(), &probabilities, model.method(), top_k)
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Err(MatcherError::DependencyUnavailable(format!(
            "Category model '{}' timed out after {:?}",
            name, timeout
        ))),
        Ok(Err(join_error)) => Err(MatcherError::DependencyUnavailable(format!(
            "Category model '{}' crashed: {}",
            name, join_error
        ))),
        Ok(Ok(result)) => result,
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Trained classifier head over document embeddings
pub struct CandleCategoryModel {
    network: FeedForward,
    labels: Vec<String>,
    name: String,
}

impl CandleCategoryModel {
    /// Load `model.safetensors` and `labels.json` (a JSON array of label strings)
    pub fn load(dir: &Path, device: &Device) -> Result<Self> {
        let labels_path = dir.join("labels.json");
        let content = std::fs::read_to_string(&labels_path).map_err(|e| {
            MatcherError::DependencyUnavailable(format!(
                "Failed to read {}: {}",
                labels_path.display(),
                e
            ))
        })?;
        let labels: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            MatcherError::DependencyUnavailable(format!(
                "Invalid label list in {}: {}",
                labels_path.display(),
                e
            ))
        })?;

        let network = FeedForward::load(&dir.join("model.safetensors"), device)?;
        let model = Self::new(network, labels, dir.display().to_string())
            .map_err(|e| MatcherError::DependencyUnavailable(e.to_string()))?;

        info!(
            "Loaded category model from {} ({} labels)",
            dir.display(),
            model.labels.len()
        );
        Ok(model)
    }

    pub fn new(network: FeedForward, labels: Vec<String>, name: impl Into<String>) -> Result<Self> {
        if labels.is_empty() || network.output_dim() != labels.len() {
            return Err(MatcherError::Inference(format!(
                "category network has {} outputs for {} labels",
                network.output_dim(),
                labels.len()
            )));
        }
        Ok(Self {
            network,
            labels,
            name: name.into(),
        })
    }
}

impl CategoryModel for CandleCategoryModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, embedding: &[f32]) -> Result<Vec<f32>> {
        let outputs = self.network.forward_rows(&[embedding.to_vec()])?;
        let logits = outputs.into_iter().next().ok_or_else(|| {
            MatcherError::Inference("category network returned no rows".to_string())
        })?;
        Ok(softmax(&logits))
    }

    fn method(&self) -> DecisionMethod {
        DecisionMethod::MlModel
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Nearest-prototype classifier built from the keyword rules.
///
/// Each label is described by its name and primary terms; the description is embedded
/// once and documents are scored by a temperature softmax over cosine similarities.
pub struct PrototypeCategoryModel {
    labels: Vec<String>,
    prototypes: Vec<Vec<f32>>,
    temperature: f32,
}

impl PrototypeCategoryModel {
    pub fn build(
        rules: &RuleTable,
        provider: &dyn EmbeddingProvider,
        temperature: f32,
    ) -> Result<Self> {
        let labels: Vec<String> = rules.labels().map(str::to_string).collect();
        let descriptions: Vec<String> = rules
            .rules
            .iter()
            .map(|rule| {
                let terms = if rule.primary.is_empty() {
                    &rule.secondary
                } else {
                    &rule.primary
                };
                format!("{}: {}", rule.label, terms.join(", "))
            })
            .collect();

        let prototypes = provider.embed(&descriptions)?;
        if prototypes.len() != labels.len() {
            return Err(MatcherError::DependencyUnavailable(format!(
                "embedding provider returned {} prototypes for {} labels",
                prototypes.len(),
                labels.len()
            )));
        }
        let dim = prototypes.first().map(Vec::len).unwrap_or(0);
        for prototype in &prototypes {
            check_embedding(prototype, dim)
                .map_err(|e| MatcherError::DependencyUnavailable(format!("bad prototype: {}", e)))?;
        }

        info!(
            "Built semantic prototypes for {} categories with '{}'",
            labels.len(),
            provider.name()
        );

        Ok(Self {
            labels,
            prototypes,
            temperature,
        })
    }
}

impl CategoryModel for PrototypeCategoryModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, embedding: &[f32]) -> Result<Vec<f32>> {
        let scaled = self
            .prototypes
            .iter()
            .map(|p| cosine_similarity(embedding, p).map(|c| c / self.temperature))
            .collect::<Result<Vec<f32>>>()?;
        Ok(softmax(&scaled))
    }

    fn method(&self) -> DecisionMethod {
        DecisionMethod::Semantic
    }

    fn name(&self) -> &str {
        "semantic-prototypes"
    }
}
