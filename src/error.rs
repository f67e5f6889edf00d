//! Error handling for the CV matcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    /// Empty documents, empty candidate lists, nonsensical options.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding model, re-ranker or classifier missing, failed to load, or timed out.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A single inference call produced unusable output.
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Analyst error: {0}")]
    Analyst(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MatcherError {
    /// True for errors caused by the caller's request rather than by the system.
    pub fn is_input_error(&self) -> bool {
        matches!(self, MatcherError::InvalidInput(_))
    }

    /// True for errors the pipeline recovers from by degrading to keyword scoring.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            MatcherError::DependencyUnavailable(_) | MatcherError::Inference(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MatcherError>;

/// model2vec-rs reports load failures through anyhow
impl From<anyhow::Error> for MatcherError {
    fn from(err: anyhow::Error) -> Self {
        MatcherError::DependencyUnavailable(format!("{:#}", err))
    }
}

impl From<candle_core::Error> for MatcherError {
    fn from(err: candle_core::Error) -> Self {
        MatcherError::Inference(err.to_string())
    }
}
