//! Request-scoped document structures

use crate::processing::text_processor::TextProcessor;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentRole {
    Cv,
    Job,
}

/// A CV or job description for the duration of one request.
///
/// The embedding is filled at most once and lives as long as the document.
#[derive(Debug)]
pub struct Document {
    pub role: DocumentRole,
    pub id: String,
    pub raw: String,
    pub normalized: String,
    embedding: OnceLock<Vec<f32>>,
}

impl Document {
    pub fn new(
        role: DocumentRole,
        id: impl Into<String>,
        raw: &str,
        processor: &TextProcessor,
    ) -> Self {
        Self {
            role,
            id: id.into(),
            raw: raw.to_string(),
            normalized: processor.normalize(raw),
            embedding: OnceLock::new(),
        }
    }

    /// Nothing left after normalization
    pub fn is_blank(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.get().map(Vec::as_slice)
    }

    /// Store the embedding; a second call keeps the first value and returns false
    pub fn set_embedding(&self, embedding: Vec<f32>) -> bool {
        self.embedding.set(embedding).is_ok()
    }
}

/// A caller-identified text in a matching request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub text: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}
