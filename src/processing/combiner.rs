//! Hybrid combiner: score blending for matching, verdict arbitration for classification

use crate::config::{ClassificationConfig, MatchingConfig};
use crate::llm::analyst::AnalystOpinion;
use crate::processing::classifier::ModelVerdict;
use crate::processing::keyword_rules::RuleTable;
use crate::processing::keyword_scorer::KeywordVerdict;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which scoring path produced a match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Rescaled cosine blended with the skill boost
    Hybrid,
    /// Trained re-ranker probability
    Reranker,
    /// Rescaled cosine alone
    Semantic,
    /// Skill boost alone; the semantic path was unavailable
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    Semantic,
    Keyword,
    Hybrid,
    MlModel,
    FallbackDefault,
    LlmAnalysis,
}

/// The precedence branch that produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    ModelUnavailable,
    SentinelLabel,
    LowModelConfidence,
    KeywordMargin,
    Agreement,
    ModelPreferred,
    AnalystOpinion,
    NoUsableSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub label: String,
    pub confidence: f32,
}

/// Single best label for one document; `confidence` is always in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub predicted_label: String,
    pub confidence: f32,
    pub decision_method: DecisionMethod,
    pub decision_reason: DecisionReason,
    pub top_k_alternatives: Vec<Alternative>,
    pub matched_terms: Vec<String>,
    pub analyst_reasoning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub semantic: f32,
    pub keyword: f32,
}

impl From<&MatchingConfig> for MatchWeights {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            semantic: config.semantic_weight,
            keyword: config.keyword_weight,
        }
    }
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            keyword: 0.3,
        }
    }
}

/// Blend a 0..100 semantic score with a 0..100 keyword boost.
///
/// Weights are normalized by their sum so the result stays on the 0..100 scale.
pub fn combine(semantic_score: f32, keyword_boost: f32, weights: MatchWeights) -> f32 {
    let raw = semantic_score * weights.semantic + keyword_boost * weights.keyword;
    let total = weights.semantic + weights.keyword;
    let blended = if (total - 1.0).abs() <= f32::EPSILON {
        raw
    } else {
        raw / total
    };
    blended.clamp(0.0, 100.0)
}

/// Thresholds and labels for classification arbitration
#[derive(Debug, Clone)]
pub struct ArbitrationPolicy {
    pub low_confidence_threshold: f32,
    pub keyword_margin: f32,
    pub sentinel_label: String,
    pub default_label: String,
    pub default_confidence: f32,
    pub analyst_min_confidence: f32,
}

impl From<&ClassificationConfig> for ArbitrationPolicy {
    fn from(config: &ClassificationConfig) -> Self {
        Self {
            low_confidence_threshold: config.low_confidence_threshold,
            keyword_margin: config.keyword_margin,
            sentinel_label: config.sentinel_label.clone(),
            default_label: config.default_label.clone(),
            default_confidence: config.default_confidence,
            analyst_min_confidence: config.analyst_min_confidence,
        }
    }
}

impl ArbitrationPolicy {
    /// Pick one verdict following the fixed precedence:
    ///
    /// 1. a missing, sentinel, unknown or low-confidence model verdict is discarded
    /// 2. a keyword verdict beating the model by more than the margin wins
    /// 3. otherwise the model wins (`hybrid` when both agree on the label)
    /// 4. with nothing usable, a qualifying analyst opinion, else the default label
    pub fn arbitrate(
        &self,
        model: Option<&ModelVerdict>,
        keyword: &KeywordVerdict,
        analyst: Option<&AnalystOpinion>,
        rules: &RuleTable,
    ) -> ClassificationResult {
        let keyword_usable =
            keyword.matched && keyword.confidence >= self.low_confidence_threshold;

        let model = match model {
            None => Err(DecisionReason::ModelUnavailable),
            Some(m) if m.label == self.sentinel_label || !rules.contains_label(&m.label) => {
                Err(DecisionReason::SentinelLabel)
            }
            Some(m) if m.confidence < self.low_confidence_threshold => {
                Err(DecisionReason::LowModelConfidence)
            }
            Some(m) => Ok(m),
        };

        let result = match model {
            Err(reason) if keyword_usable => self.keyword_result(keyword, reason),
            Err(reason) => {
                debug!("Model verdict discarded ({:?}) and no usable keyword verdict", reason);
                self.last_resort(keyword, analyst, rules)
            }
            Ok(m) if keyword.matched && keyword.label == m.label => ClassificationResult {
                predicted_label: m.label.clone(),
                confidence: m.confidence.max(keyword.confidence),
                decision_method: DecisionMethod::Hybrid,
                decision_reason: DecisionReason::Agreement,
                top_k_alternatives: m.alternatives.clone(),
                matched_terms: keyword.matched_terms.clone(),
                analyst_reasoning: None,
            },
            Ok(m) if keyword_usable && keyword.confidence > m.confidence + self.keyword_margin => {
                self.keyword_result(keyword, DecisionReason::KeywordMargin)
            }
            Ok(m) => ClassificationResult {
                predicted_label: m.label.clone(),
                confidence: m.confidence,
                decision_method: m.method,
                decision_reason: DecisionReason::ModelPreferred,
                top_k_alternatives: m.alternatives.clone(),
                matched_terms: Vec::new(),
                analyst_reasoning: None,
            },
        };

        debug!(
            "Classified as '{}' ({:.2}) via {:?}/{:?}",
            result.predicted_label,
            result.confidence,
            result.decision_method,
            result.decision_reason
        );
        result
    }

    fn keyword_result(
        &self,
        keyword: &KeywordVerdict,
        reason: DecisionReason,
    ) -> ClassificationResult {
        ClassificationResult {
            predicted_label: keyword.label.clone(),
            confidence: keyword.confidence,
            decision_method: DecisionMethod::Keyword,
            decision_reason: reason,
            top_k_alternatives: keyword.alternatives.clone(),
            matched_terms: keyword.matched_terms.clone(),
            analyst_reasoning: None,
        }
    }

    fn last_resort(
        &self,
        keyword: &KeywordVerdict,
        analyst: Option<&AnalystOpinion>,
        rules: &RuleTable,
    ) -> ClassificationResult {
        if let Some(opinion) = analyst {
            if rules.contains_label(&opinion.label)
                && opinion.confidence >= self.analyst_min_confidence
            {
                let mut alternatives = vec![Alternative {
                    label: opinion.label.clone(),
                    confidence: opinion.confidence,
                }];
                alternatives.extend(
                    keyword
                        .alternatives
                        .iter()
                        .filter(|a| a.label != opinion.label)
                        .cloned(),
                );
                return ClassificationResult {
                    predicted_label: opinion.label.clone(),
                    confidence: opinion.confidence,
                    decision_method: DecisionMethod::LlmAnalysis,
                    decision_reason: DecisionReason::AnalystOpinion,
                    top_k_alternatives: alternatives,
                    matched_terms: Vec::new(),
                    analyst_reasoning: Some(opinion.reasoning.clone()),
                };
            }
            debug!(
                "Analyst opinion '{}' ({:.2}) rejected",
                opinion.label, opinion.confidence
            );
        }

        ClassificationResult {
            predicted_label: self.default_label.clone(),
            confidence: self.default_confidence,
            decision_method: DecisionMethod::FallbackDefault,
            decision_reason: DecisionReason::NoUsableSignal,
            top_k_alternatives: keyword.alternatives.clone(),
            matched_terms: Vec::new(),
            analyst_reasoning: None,
        }
    }
}
