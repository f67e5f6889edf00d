//! Job-critical skill overlap used as the keyword boost in matching

use crate::error::Result;
use crate::processing::term_index::TermIndex;
use crate::processing::text_processor::TextProcessor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillOverlap {
    /// Percentage of the job's critical skills present in the CV, 0..=100
    pub boost: f32,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Compares CVs and jobs over a fixed lexicon of skill terms
pub struct SkillMatcher {
    index: TermIndex,
}

impl SkillMatcher {
    pub fn new(lexicon: &[String], processor: &TextProcessor) -> Result<Self> {
        let normalized: Vec<String> = lexicon.iter().map(|t| processor.normalize(t)).collect();
        Ok(Self {
            index: TermIndex::new(normalized)?,
        })
    }

    pub fn lexicon_size(&self) -> usize {
        self.index.len()
    }

    /// Skills named by the job, split by whether the CV has them.
    ///
    /// A job naming none of the lexicon terms yields a zero boost.
    pub fn overlap(&self, cv_normalized: &str, job_normalized: &str) -> SkillOverlap {
        let cv_counts = self.index.counts(cv_normalized);
        let job_counts = self.index.counts(job_normalized);

        let mut matched_skills = Vec::new();
        let mut missing_skills = Vec::new();
        for (id, &in_job) in job_counts.iter().enumerate() {
            if in_job == 0 {
                continue;
            }
            let term = self.index.term(id).to_string();
            if cv_counts[id] > 0 {
                matched_skills.push(term);
            } else {
                missing_skills.push(term);
            }
        }

        let total = matched_skills.len() + missing_skills.len();
        let boost = if total == 0 {
            0.0
        } else {
            matched_skills.len() as f32 / total as f32 * 100.0
        };

        SkillOverlap {
            boost,
            matched_skills,
            missing_skills,
        }
    }
}
