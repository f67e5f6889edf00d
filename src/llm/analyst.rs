//! Pluggable external language-model analysis of a CV

use crate::config::AnalystConfig;
use crate::error::{MatcherError, Result};
use crate::llm::prompts::PromptTemplates;
use crate::processing::text_processor::TextProcessor;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Structured opinion returned by an analyst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystOpinion {
    pub label: String,
    /// In [0, 1]
    pub confidence: f32,
    pub reasoning: String,
}

/// An optional second opinion the classifier may consult; never required for a result.
#[async_trait]
pub trait CareerAnalyst: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    async fn analyze(&self, text: &str, labels: &[String]) -> Result<AnalystOpinion>;
}

/// Analyst backed by an OpenAI-compatible chat-completions endpoint (Groq by default)
pub struct ChatCompletionAnalyst {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_input_chars: usize,
    templates: PromptTemplates,
}

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 250;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOpinion {
    category: String,
    confidence: f32,
    #[serde(default)]
    reasoning: String,
}

impl ChatCompletionAnalyst {
    /// Reads the API key from the environment variable named in the config
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            info!(
                "{} not set; analyst '{}' disabled",
                config.api_key_env, config.model
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| MatcherError::Analyst(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_input_chars: config.max_input_chars,
            templates: PromptTemplates::default(),
        })
    }
}

#[async_trait]
impl CareerAnalyst for ChatCompletionAnalyst {
    fn name(&self) -> &str {
        &self.model
    }

    fn available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, text: &str, labels: &[String]) -> Result<AnalystOpinion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MatcherError::Analyst("no API key configured".to_string()))?;

        let excerpt = TextProcessor::truncate_chars(text, self.max_input_chars);
        let prompt = self.templates.render_classification(excerpt, labels);

        let request = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.templates.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MatcherError::Analyst(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MatcherError::Analyst(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| MatcherError::Analyst(format!("unreadable response: {}", e)))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MatcherError::Analyst("empty completion".to_string()))?;

        debug!("Analyst '{}' replied: {}", self.model, content);
        parse_opinion(&content)
    }
}

/// Parse the model's JSON answer, tolerating markdown code fences
pub fn parse_opinion(content: &str) -> Result<AnalystOpinion> {
    let raw: RawOpinion = serde_json::from_str(strip_json_fences(content))
        .map_err(|e| MatcherError::Analyst(format!("malformed opinion: {}", e)))?;

    // Some models answer on a 0..100 scale; values between the two scales are ambiguous
    let confidence = if raw.confidence >= 2.0 {
        raw.confidence / 100.0
    } else if raw.confidence > 1.0 {
        return Err(MatcherError::Analyst(format!(
            "malformed opinion: ambiguous confidence {}",
            raw.confidence
        )));
    } else {
        raw.confidence
    };
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(MatcherError::Analyst(format!(
            "confidence {} out of range",
            raw.confidence
        )));
    }

    Ok(AnalystOpinion {
        label: raw.category.trim().to_string(),
        confidence,
        reasoning: raw.reasoning,
    })
}

/// Map a free-text label onto the allowed set: exact, then case-insensitive, then the
/// closest spelling with Jaro-Winkler similarity of at least 0.92
pub fn resolve_label(label: &str, labels: &[String]) -> Option<String> {
    let label = label.trim();
    if let Some(exact) = labels.iter().find(|l| l.as_str() == label) {
        return Some(exact.clone());
    }
    let lower = label.to_lowercase();
    if let Some(folded) = labels.iter().find(|l| l.to_lowercase() == lower) {
        return Some(folded.clone());
    }

    labels
        .iter()
        .map(|l| (l, strsim::jaro_winkler(&l.to_lowercase(), &lower)))
        .filter(|(_, similarity)| *similarity >= 0.92)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(l, _)| l.clone())
}

fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(rest) => rest
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| rest.trim()),
        None => text,
    }
}
