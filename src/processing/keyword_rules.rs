//! Keyword rule table: loading and validation

use crate::error::{MatcherError, Result};
use crate::processing::text_processor::TextProcessor;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_RULES: &str = include_str!("../../rules/job_categories.toml");

/// One category's weighted keyword sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub label: String,
    pub weight: f32,
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Per-hit points shared by every rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub primary_weight: f32,
    pub secondary_weight: f32,
    pub negative_penalty: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceTier {
    pub min_score: f32,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    version: String,
    scoring: ScoringWeights,
    confidence_tiers: Vec<ConfidenceTier>,
    rules: Vec<KeywordRule>,
}

/// Validated, normalized, immutable rule table.
///
/// Rule order is significant: it is the final tie-break between equally scored labels.
#[derive(Debug, Clone, Serialize)]
pub struct RuleTable {
    pub version: String,
    pub scoring: ScoringWeights,
    pub confidence_tiers: Vec<ConfidenceTier>,
    pub rules: Vec<KeywordRule>,
}

impl RuleTable {
    /// The table compiled into the binary
    pub fn bundled(processor: &TextProcessor) -> Result<Self> {
        Self::from_toml_str(BUNDLED_RULES, processor)
    }

    pub fn load(path: &Path, processor: &TextProcessor) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MatcherError::Configuration(format!(
                "Failed to read rule table {}: {}",
                path.display(),
                e
            ))
        })?;
        let table = Self::from_toml_str(&content, processor)?;
        info!(
            "Loaded keyword rules v{} ({} categories) from {}",
            table.version,
            table.rules.len(),
            path.display()
        );
        Ok(table)
    }

    /// Bundled table unless an override path is given
    pub fn load_or_bundled(path: Option<&Path>, processor: &TextProcessor) -> Result<Self> {
        match path {
            Some(path) => Self::load(path, processor),
            None => Self::bundled(processor),
        }
    }

    pub fn from_toml_str(content: &str, processor: &TextProcessor) -> Result<Self> {
        let file: RuleFile = toml::from_str(content)
            .map_err(|e| MatcherError::Configuration(format!("Malformed rule table: {}", e)))?;

        if file.version.trim().is_empty() {
            return Err(MatcherError::Configuration(
                "Rule table version must not be empty".to_string(),
            ));
        }

        let scoring = file.scoring;
        Self::validate_scoring(&scoring)?;
        let tiers = Self::validate_tiers(file.confidence_tiers)?;

        if file.rules.is_empty() {
            return Err(MatcherError::Configuration(
                "Rule table contains no rules".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(file.rules.len());
        for rule in file.rules {
            let label = rule.label.trim().to_string();
            if label.is_empty() {
                return Err(MatcherError::Configuration(
                    "Rule with empty label".to_string(),
                ));
            }
            if !seen.insert(label.clone()) {
                return Err(MatcherError::Configuration(format!(
                    "Duplicate rule label '{}'",
                    label
                )));
            }
            if !rule.weight.is_finite() || rule.weight <= 0.0 {
                return Err(MatcherError::Configuration(format!(
                    "Rule '{}' has invalid weight {}",
                    label, rule.weight
                )));
            }
            if rule.primary.is_empty() && rule.secondary.is_empty() {
                return Err(MatcherError::Configuration(format!(
                    "Rule '{}' has neither primary nor secondary terms",
                    label
                )));
            }

            rules.push(KeywordRule {
                primary: Self::normalize_terms(&label, &rule.primary, processor)?,
                secondary: Self::normalize_terms(&label, &rule.secondary, processor)?,
                negative: Self::normalize_terms(&label, &rule.negative, processor)?,
                label,
                weight: rule.weight,
            });
        }

        Ok(Self {
            version: file.version,
            scoring,
            confidence_tiers: tiers,
            rules,
        })
    }

    /// The reserved "unknown" label of the category model must not be a rule label
    pub fn ensure_label_absent(&self, reserved: &str) -> Result<()> {
        if self.contains_label(reserved) {
            return Err(MatcherError::Configuration(format!(
                "Rule label '{}' collides with a reserved label",
                reserved
            )));
        }
        Ok(())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.label.as_str())
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.rules.iter().any(|r| r.label == label)
    }

    /// Confidence of the highest tier whose threshold the score reaches
    pub fn confidence_for(&self, score: f32) -> f32 {
        self.confidence_tiers
            .iter()
            .find(|tier| score >= tier.min_score)
            .map(|tier| tier.confidence)
            .unwrap_or(0.0)
    }

    fn validate_scoring(scoring: &ScoringWeights) -> Result<()> {
        for (name, value) in [
            ("primary_weight", scoring.primary_weight),
            ("secondary_weight", scoring.secondary_weight),
            ("negative_penalty", scoring.negative_penalty),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(MatcherError::Configuration(format!(
                    "scoring.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if scoring.negative_penalty < scoring.secondary_weight {
            warn!(
                "negative_penalty ({}) is smaller than secondary_weight ({}); \
                 negative terms will not outweigh weak matches",
                scoring.negative_penalty, scoring.secondary_weight
            );
        }
        Ok(())
    }

    fn validate_tiers(tiers: Vec<ConfidenceTier>) -> Result<Vec<ConfidenceTier>> {
        if tiers.is_empty() {
            return Err(MatcherError::Configuration(
                "At least one confidence tier is required".to_string(),
            ));
        }
        for tier in &tiers {
            if !tier.min_score.is_finite() || !(tier.confidence > 0.0 && tier.confidence <= 1.0) {
                return Err(MatcherError::Configuration(format!(
                    "Invalid confidence tier {{ min_score = {}, confidence = {} }}",
                    tier.min_score, tier.confidence
                )));
            }
        }
        if tiers.windows(2).any(|w| w[0].min_score <= w[1].min_score) {
            return Err(MatcherError::Configuration(
                "Confidence tiers must be strictly descending by min_score".to_string(),
            ));
        }
        Ok(tiers)
    }

    fn normalize_terms(
        label: &str,
        terms: &[String],
        processor: &TextProcessor,
    ) -> Result<Vec<String>> {
        let mut out: Vec<String> = Vec::with_capacity(terms.len());
        for term in terms {
            let normalized = processor.normalize(term);
            if normalized.is_empty() {
                return Err(MatcherError::Configuration(format!(
                    "Rule '{}' has term '{}' that is empty after normalization",
                    label, term
                )));
            }
            if !out.contains(&normalized) {
                out.push(normalized);
            }
        }
        Ok(out)
    }
}
