//! Rule-driven keyword scoring over the category label set

use crate::error::Result;
use crate::processing::combiner::Alternative;
use crate::processing::keyword_rules::RuleTable;
use crate::processing::term_index::TermIndex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Net weighted score of one label for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
    pub primary_hits: usize,
    pub secondary_hits: usize,
    pub negative_hits: usize,
    pub matched_terms: Vec<String>,
}

/// Best keyword label with its tier confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordVerdict {
    pub label: String,
    pub confidence: f32,
    /// False when no rule scored and the default label was substituted
    pub matched: bool,
    pub score: f32,
    pub alternatives: Vec<Alternative>,
    pub matched_terms: Vec<String>,
}

struct CompiledRule {
    primary: Vec<usize>,
    secondary: Vec<usize>,
    negative: Vec<usize>,
}

pub struct KeywordScorer {
    table: Arc<RuleTable>,
    index: TermIndex,
    compiled: Vec<CompiledRule>,
}

impl KeywordScorer {
    pub fn new(table: Arc<RuleTable>) -> Result<Self> {
        let all_terms = table
            .rules
            .iter()
            .flat_map(|r| r.primary.iter().chain(&r.secondary).chain(&r.negative));
        let index = TermIndex::new(all_terms)?;

        let ids = |terms: &[String]| -> Vec<usize> {
            terms.iter().filter_map(|t| index.id_of(t)).collect()
        };
        let compiled = table
            .rules
            .iter()
            .map(|r| CompiledRule {
                primary: ids(&r.primary),
                secondary: ids(&r.secondary),
                negative: ids(&r.negative),
            })
            .collect();

        Ok(Self {
            table,
            index,
            compiled,
        })
    }

    /// Labels with a positive net score, best first.
    ///
    /// `normalized` must come from
    /// [`TextProcessor::normalize`](crate::processing::text_processor::TextProcessor::normalize).
    pub fn score(&self, normalized: &str) -> Vec<LabelScore> {
        let counts = self.index.counts(normalized);
        let weights = &self.table.scoring;

        let mut scored: Vec<(usize, LabelScore)> = Vec::new();
        for (pos, (rule, compiled)) in self.table.rules.iter().zip(&self.compiled).enumerate() {
            let hits = |ids: &[usize]| ids.iter().map(|&id| counts[id]).sum::<usize>();
            let primary_hits = hits(&compiled.primary);
            let secondary_hits = hits(&compiled.secondary);
            let negative_hits = hits(&compiled.negative);

            let base = primary_hits as f32 * weights.primary_weight
                + secondary_hits as f32 * weights.secondary_weight
                - negative_hits as f32 * weights.negative_penalty;
            if base <= 0.0 {
                continue;
            }

            let matched_terms = compiled
                .primary
                .iter()
                .chain(&compiled.secondary)
                .filter(|&&id| counts[id] > 0)
                .map(|&id| self.index.term(id).to_string())
                .collect();

            scored.push((
                pos,
                LabelScore {
                    label: rule.label.clone(),
                    score: base * rule.weight,
                    primary_hits,
                    secondary_hits,
                    negative_hits,
                    matched_terms,
                },
            ));
        }

        scored.sort_by(|(pa, a), (pb, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.primary_hits.cmp(&a.primary_hits))
                .then_with(|| pa.cmp(pb))
        });

        scored.into_iter().map(|(_, s)| s).collect()
    }

    /// Best label, or the default label at the default confidence when nothing scored
    pub fn verdict(
        &self,
        normalized: &str,
        default_label: &str,
        default_confidence: f32,
        top_k: usize,
    ) -> KeywordVerdict {
        let scores = self.score(normalized);

        let Some(best) = scores.first() else {
            return KeywordVerdict {
                label: default_label.to_string(),
                confidence: default_confidence,
                matched: false,
                score: 0.0,
                alternatives: Vec::new(),
                matched_terms: Vec::new(),
            };
        };

        let alternatives = scores
            .iter()
            .take(top_k)
            .map(|s| Alternative {
                label: s.label.clone(),
                confidence: self.table.confidence_for(s.score),
            })
            .collect();

        KeywordVerdict {
            label: best.label.clone(),
            confidence: self.table.confidence_for(best.score),
            matched: true,
            score: best.score,
            alternatives,
            matched_terms: best.matched_terms.clone(),
        }
    }
}
