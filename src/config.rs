//! Configuration management for the CV matcher

use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub processing: ProcessingConfig,
    pub matching: MatchingConfig,
    pub classification: ClassificationConfig,
    pub analyst: AnalystConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// HuggingFace repo id or local directory of a Model2Vec model
    pub embedding_model: String,
    /// Directory with a trained re-ranker (`model.safetensors`)
    pub reranker_path: Option<PathBuf>,
    /// Directory with a trained category classifier (`model.safetensors` + `labels.json`)
    pub category_model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub batch_size: usize,
    pub inference_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub top_k: usize,
    pub use_hybrid: bool,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    /// Job-critical skill terms used for the keyword boost
    pub skill_lexicon: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    pub low_confidence_threshold: f32,
    pub keyword_margin: f32,
    pub sentinel_label: String,
    pub default_label: String,
    pub default_confidence: f32,
    pub analyst_min_confidence: f32,
    pub top_k_alternatives: usize,
    pub semantic_prototypes: bool,
    pub prototype_temperature: f32,
    /// Overrides the bundled keyword-rule table
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_ms: u64,
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig {
                embedding_model: "minishlab/potion-base-8M".to_string(),
                reranker_path: None,
                category_model_path: None,
            },
            processing: ProcessingConfig {
                batch_size: 32,
                inference_timeout_ms: 10_000,
            },
            matching: MatchingConfig {
                top_k: 10,
                use_hybrid: true,
                semantic_weight: 0.7,
                keyword_weight: 0.3,
                skill_lexicon: default_skill_lexicon(),
            },
            classification: ClassificationConfig {
                low_confidence_threshold: 0.5,
                keyword_margin: 0.1,
                sentinel_label: "Other".to_string(),
                default_label: "Unclassified".to_string(),
                default_confidence: 0.3,
                analyst_min_confidence: 0.6,
                top_k_alternatives: 5,
                semantic_prototypes: true,
                prototype_temperature: 0.05,
                rules_path: None,
            },
            analyst: AnalystConfig {
                enabled: false,
                endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                timeout_ms: 15_000,
                max_input_chars: 3000,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| MatcherError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            MatcherError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-matcher")
            .join("config.toml")
    }

    /// Reject values that would make scores meaningless
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        for (name, w) in [
            ("matching.semantic_weight", m.semantic_weight),
            ("matching.keyword_weight", m.keyword_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(MatcherError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, w
                )));
            }
        }
        if m.semantic_weight + m.keyword_weight <= 0.0 {
            return Err(MatcherError::Configuration(
                "matching weights must not both be zero".to_string(),
            ));
        }
        if m.top_k == 0 {
            return Err(MatcherError::Configuration(
                "matching.top_k must be at least 1".to_string(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(MatcherError::Configuration(
                "processing.batch_size must be at least 1".to_string(),
            ));
        }

        let c = &self.classification;
        for (name, v) in [
            ("classification.low_confidence_threshold", c.low_confidence_threshold),
            ("classification.keyword_margin", c.keyword_margin),
            ("classification.default_confidence", c.default_confidence),
            ("classification.analyst_min_confidence", c.analyst_min_confidence),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(MatcherError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, v
                )));
            }
        }
        if c.default_confidence > 0.5 {
            return Err(MatcherError::Configuration(
                "classification.default_confidence must not exceed 0.5".to_string(),
            ));
        }
        if c.prototype_temperature <= 0.0 || !c.prototype_temperature.is_finite() {
            return Err(MatcherError::Configuration(
                "classification.prototype_temperature must be positive".to_string(),
            ));
        }
        if c.sentinel_label.trim().is_empty() || c.default_label.trim().is_empty() {
            return Err(MatcherError::Configuration(
                "sentinel and default labels must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_skill_lexicon() -> Vec<String> {
    [
        // Backend & languages
        "node.js", "nodejs", "express", "python", "java", "javascript", "typescript",
        "php", "ruby", "go", "golang", "rust", "scala", "kotlin",
        // Databases
        "mongodb", "mysql", "postgresql", "redis", "sql", "nosql", "database",
        "oracle", "cassandra", "dynamodb",
        // Frontend
        "react", "vue", "angular", "next.js", "nextjs", "html", "css", "jquery",
        "bootstrap",
        // DevOps & tools
        "docker", "kubernetes", "jenkins", "git", "github", "gitlab", "ci/cd", "aws",
        "azure", "gcp", "nginx", "apache", "linux", "unix", "bash", "shell",
        // API & architecture
        "rest", "restful", "api", "graphql", "microservices", "websocket", "grpc",
        // Security
        "jwt", "oauth", "authentication", "authorization", "security", "encryption",
        "ssl", "tls",
        // AI & data science
        "machine learning", "deep learning", "tensorflow", "pytorch", "scikit-learn",
        "pandas", "numpy", "computer vision", "opencv", "nlp", "ai",
        "artificial intelligence",
        // Mobile
        "react native", "flutter", "android", "ios", "swift", "mobile app",
        // Testing & quality
        "testing", "unit test", "selenium", "jest", "pytest", "qa",
        "quality assurance", "agile", "scrum",
        // Data & analytics
        "data analysis", "power bi", "tableau", "excel", "analytics", "big data",
        "hadoop", "spark",
        // Design & marketing
        "photoshop", "illustrator", "figma", "ui/ux", "seo", "marketing", "google ads",
        // Networks & systems
        "network", "cisco", "firewall", "vpn", "routing", "cybersecurity",
        "penetration testing", "siem",
        // Business & management
        "project management", "hr", "accounting", "quickbooks", "communication",
        "leadership",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
