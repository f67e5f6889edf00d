//! CV matcher library: hybrid CV/job matching and job-category classification

pub mod cli;
pub mod config;
pub mod error;
pub mod processing;
pub mod llm;
pub mod output;

pub use config::Config;
pub use error::{MatcherError, Result};
pub use processing::analyzer::{
    AnalysisEngine, ClassifyOptions, EngineStatus, MatchOptions, MatchReport, MatchResult,
};
pub use processing::combiner::{ClassificationResult, DecisionMethod, DecisionReason, MatchMethod};
pub use processing::document::Candidate;
pub use processing::keyword_rules::RuleTable;
