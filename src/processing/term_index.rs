//! Word-boundary aware multi-term counting over normalized text

use crate::error::{MatcherError, Result};
use aho_corasick::{AhoCorasick, MatchKind};
use std::collections::HashMap;

/// Counts whole-word occurrences of a fixed set of normalized terms.
///
/// Input text must already be normalized (lowercase words separated by single spaces),
/// so a term boundary is either a space or an edge of the text. "java" therefore never
/// matches inside "javascript", while "java developer" matches across the space.
pub struct TermIndex {
    matcher: Option<AhoCorasick>,
    terms: Vec<String>,
    ids: HashMap<String, usize>,
}

impl TermIndex {
    /// Build from normalized terms; duplicates share one id
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique = Vec::new();
        let mut ids = HashMap::new();
        for term in terms {
            let term = term.as_ref();
            if term.is_empty() || ids.contains_key(term) {
                continue;
            }
            ids.insert(term.to_string(), unique.len());
            unique.push(term.to_string());
        }

        let matcher = if unique.is_empty() {
            None
        } else {
            // Standard semantics so overlapping terms ("react", "react native") all count
            let ac = AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(&unique)
                .map_err(|e| {
                    MatcherError::Configuration(format!("Failed to build term matcher: {}", e))
                })?;
            Some(ac)
        };

        Ok(Self {
            matcher,
            terms: unique,
            ids,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn id_of(&self, term: &str) -> Option<usize> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: usize) -> &str {
        &self.terms[id]
    }

    /// Occurrence count per term id
    pub fn counts(&self, normalized: &str) -> Vec<usize> {
        let mut counts = vec![0; self.terms.len()];
        let Some(matcher) = &self.matcher else {
            return counts;
        };

        let bytes = normalized.as_bytes();
        for m in matcher.find_overlapping_iter(normalized) {
            let starts_on_word = m.start() == 0 || bytes[m.start() - 1] == b' ';
            let ends_on_word = m.end() == bytes.len() || bytes[m.end()] == b' ';
            if starts_on_word && ends_on_word {
                counts[m.pattern().as_usize()] += 1;
            }
        }

        counts
    }
}
