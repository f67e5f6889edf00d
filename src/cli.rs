//! CLI interface for the CV matcher

use crate::error::{MatcherError, Result};
use crate::processing::document::Candidate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cv-matcher")]
#[command(about = "Hybrid CV-to-job matching and job-category classification")]
#[command(
    long_about = "Rank job descriptions for a CV (or CVs for a job) with sentence embeddings, \
an optional neural re-ranker and skill keywords, and classify CVs into job categories"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a CV into a job category
    Classify {
        /// Path to the CV text file
        #[arg(long)]
        cv: PathBuf,

        /// Print JSON instead of console output
        #[arg(long)]
        json: bool,

        /// Never consult the external analyst
        #[arg(long)]
        no_analyst: bool,
    },

    /// Rank job descriptions for one CV
    Match {
        /// Path to the CV text file
        #[arg(long)]
        cv: PathBuf,

        /// Job description text files (repeatable)
        #[arg(long = "job")]
        jobs: Vec<PathBuf>,

        /// JSON file holding an array of {"id", "text"} job candidates
        #[arg(long)]
        jobs_json: Option<PathBuf>,

        /// Number of matches to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip the skill keyword blend (re-ranker or plain semantic scores)
        #[arg(long)]
        semantic_only: bool,

        /// Print JSON instead of console output
        #[arg(long)]
        json: bool,
    },

    /// Rank CVs for one job description
    RankCvs {
        /// Path to the job description text file
        #[arg(long)]
        job: PathBuf,

        /// CV text files (repeatable)
        #[arg(long = "cv", required = true)]
        cvs: Vec<PathBuf>,

        /// Number of matches to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip the skill keyword blend (re-ranker or plain semantic scores)
        #[arg(long)]
        semantic_only: bool,

        /// Print JSON instead of console output
        #[arg(long)]
        json: bool,
    },

    /// Show which models and rules are loaded
    Status {
        /// Print JSON instead of console output
        #[arg(long)]
        json: bool,
    },

    /// Keyword rule table commands
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Validate a rule table file (the configured one when omitted)
    Validate {
        path: Option<PathBuf>,
    },

    /// Show the active rule table
    Show {
        /// Print JSON instead of console output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Read a UTF-8 text document
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        MatcherError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })
}

/// Candidate id for a file: its stem, or the full path when there is none
pub fn candidate_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Load candidates from text files, keyed by file stem
pub fn read_candidates(paths: &[PathBuf]) -> Result<Vec<Candidate>> {
    paths
        .iter()
        .map(|path| Ok(Candidate::new(candidate_id(path), read_text(path)?)))
        .collect()
}

/// Load candidates from a JSON array of `{"id": ..., "text": ...}`
pub fn read_candidates_json(path: &Path) -> Result<Vec<Candidate>> {
    let content = read_text(path)?;
    serde_json::from_str(&content).map_err(|e| {
        MatcherError::InvalidInput(format!("Malformed candidate file {}: {}", path.display(), e))
    })
}
