//! Hybrid matching and classification core

pub mod document;
pub mod text_processor;
pub mod embeddings;
pub mod network;
pub mod term_index;
pub mod keyword_rules;
pub mod keyword_scorer;
pub mod skill_matcher;
pub mod semantic;
pub mod combiner;
pub mod ranker;
pub mod classifier;
pub mod analyzer;
