//! Console and JSON rendering of match reports, classifications and engine status

use crate::config::{OutputConfig, OutputFormat};
use crate::error::Result;
use crate::processing::analyzer::{EngineStatus, MatchReport};
use crate::processing::combiner::{ClassificationResult, DecisionMethod, MatchMethod};
use crate::processing::keyword_rules::RuleTable;
use colored::{Color, Colorize};

pub trait OutputFormatter {
    fn format_matches(&self, report: &MatchReport) -> Result<String>;
    fn format_classification(&self, result: &ClassificationResult) -> Result<String>;
    fn format_status(&self, status: &EngineStatus) -> Result<String>;
    fn format_rules(&self, rules: &RuleTable) -> Result<String>;
}

/// Colored terminal output
pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

/// Pick the formatter for a configured output format
pub fn formatter_for(format: OutputFormat, config: &OutputConfig) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(config.color_output)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{} {}\n", "█".blue().bold(), title.blue().bold())
        } else {
            format!("\n█ {}\n", title)
        }
    }

    fn generated_line(&self) -> String {
        let stamp = format!("Generated: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        format!("{}\n", self.colorize(&stamp, Color::BrightBlack))
    }

    fn score_color(score: f32) -> Color {
        match score {
            s if s >= 80.0 => Color::Green,
            s if s >= 65.0 => Color::BrightGreen,
            s if s >= 50.0 => Color::Yellow,
            _ => Color::Red,
        }
    }

    fn method_name(method: MatchMethod) -> &'static str {
        match method {
            MatchMethod::Hybrid => "hybrid (semantic + skills)",
            MatchMethod::Reranker => "neural re-ranker",
            MatchMethod::Semantic => "semantic similarity",
            MatchMethod::Keyword => "keyword skills only",
        }
    }

    fn decision_name(method: DecisionMethod) -> &'static str {
        match method {
            DecisionMethod::Semantic => "semantic",
            DecisionMethod::Keyword => "keyword",
            DecisionMethod::Hybrid => "hybrid",
            DecisionMethod::MlModel => "ml_model",
            DecisionMethod::FallbackDefault => "fallback_default",
            DecisionMethod::LlmAnalysis => "llm_analysis",
        }
    }

    fn component(&self, name: &str, value: Option<&str>) -> String {
        match value {
            Some(v) => format!("  {} {}: {}\n", self.colorize("●", Color::Green), name, v),
            None => format!("  {} {}: not loaded\n", self.colorize("○", Color::Red), name),
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_matches(&self, report: &MatchReport) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("MATCH RESULTS"));
        output.push_str(&self.generated_line());
        output.push_str(&format!("Method: {}\n", Self::method_name(report.method)));
        if report.degraded {
            output.push_str(&format!(
                "{}\n",
                self.colorize(
                    "Semantic models unavailable; scores use skill keywords only",
                    Color::Yellow
                )
            ));
        }
        output.push('\n');

        if report.matches.is_empty() {
            output.push_str("No matches.\n");
        }
        for m in &report.matches {
            let score = format!("{:5.1}", m.similarity_score);
            output.push_str(&format!(
                "{:>3}. {}  {}\n",
                m.rank,
                self.colorize(&score, Self::score_color(m.similarity_score)),
                m.source_id
            ));
            if !m.matched_skills.is_empty() {
                output.push_str(&format!(
                    "       matched: {}\n",
                    self.colorize(&m.matched_skills.join(", "), Color::Green)
                ));
            }
            if !m.missing_skills.is_empty() {
                output.push_str(&format!(
                    "       missing: {}\n",
                    self.colorize(&m.missing_skills.join(", "), Color::Red)
                ));
            }
        }

        if !report.skipped.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                self.colorize("Skipped (inference failed):", Color::Yellow),
                report.skipped.join(", ")
            ));
        }
        Ok(output)
    }

    fn format_classification(&self, result: &ClassificationResult) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("JOB CATEGORY"));
        output.push_str(&self.generated_line());
        output.push_str(&format!(
            "Category:   {}\n",
            self.colorize(&result.predicted_label, Color::Cyan)
        ));
        output.push_str(&format!("Confidence: {:.0}%\n", result.confidence * 100.0));
        output.push_str(&format!(
            "Decided by: {} ({:?})\n",
            Self::decision_name(result.decision_method),
            result.decision_reason
        ));

        if !result.matched_terms.is_empty() {
            output.push_str(&format!("Evidence:   {}\n", result.matched_terms.join(", ")));
        }
        if let Some(reasoning) = &result.analyst_reasoning {
            output.push_str(&format!("Analyst:    {}\n", reasoning));
        }

        if !result.top_k_alternatives.is_empty() {
            output.push_str("\nAlternatives:\n");
            for alt in &result.top_k_alternatives {
                output.push_str(&format!("  • {:<28} {:.0}%\n", alt.label, alt.confidence * 100.0));
            }
        }
        Ok(output)
    }

    fn format_status(&self, status: &EngineStatus) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("ENGINE STATUS"));
        output.push_str(&self.component("Embedding model", status.embedding_model.as_deref()));
        output.push_str(&self.component("Re-ranker", status.reranker.as_deref()));
        let category = status
            .category_model
            .as_ref()
            .map(|name| match status.category_method {
                Some(method) => format!("{} ({})", name, Self::decision_name(method)),
                None => name.clone(),
            });
        output.push_str(&self.component("Category model", category.as_deref()));
        output.push_str(&self.component("Analyst", status.analyst.as_deref()));
        output.push_str(&format!(
            "  Rules v{}: {} categories, {} lexicon skills\n",
            status.rules_version, status.rule_count, status.skill_lexicon_size
        ));
        Ok(output)
    }

    fn format_rules(&self, rules: &RuleTable) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header(&format!("KEYWORD RULES v{}", rules.version)));
        output.push_str(&format!(
            "Scoring: primary {} / secondary {} / negative -{}\n\n",
            rules.scoring.primary_weight,
            rules.scoring.secondary_weight,
            rules.scoring.negative_penalty
        ));
        for rule in &rules.rules {
            output.push_str(&format!(
                "  {:<28} x{:<4} {} primary, {} secondary, {} negative\n",
                self.colorize(&rule.label, Color::Cyan),
                rule.weight,
                rule.primary.len(),
                rule.secondary.len(),
                rule.negative.len()
            ));
        }
        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_matches(&self, report: &MatchReport) -> Result<String> {
        self.render(report)
    }

    fn format_classification(&self, result: &ClassificationResult) -> Result<String> {
        self.render(result)
    }

    fn format_status(&self, status: &EngineStatus) -> Result<String> {
        self.render(status)
    }

    fn format_rules(&self, rules: &RuleTable) -> Result<String> {
        self.render(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::analyzer::MatchResult;
    use crate::processing::combiner::{Alternative, DecisionReason};

    fn report() -> MatchReport {
        MatchReport {
            matches: vec![MatchResult {
                candidate_index: 0,
                source_id: "python-dev".to_string(),
                similarity_score: 87.25,
                rank: 1,
                method: MatchMethod::Hybrid,
                matched_skills: vec!["python".to_string()],
                missing_skills: vec!["kubernetes".to_string()],
            }],
            method: MatchMethod::Hybrid,
            degraded: false,
            skipped: vec!["broken".to_string()],
        }
    }

    #[test]
    fn test_console_matches_plain() {
        let text = ConsoleFormatter::new(false).format_matches(&report()).unwrap();
        assert!(text.contains("1.  87.2  python-dev") || text.contains("1.  87.3  python-dev"));
        assert!(text.contains("missing: kubernetes"));
        assert!(text.contains("Skipped (inference failed): broken"));
    }

    #[test]
    fn test_console_classification() {
        let result = ClassificationResult {
            predicted_label: "Chef".to_string(),
            confidence: 0.95,
            decision_method: DecisionMethod::Keyword,
            decision_reason: DecisionReason::ModelUnavailable,
            top_k_alternatives: vec![Alternative {
                label: "Hospitality".to_string(),
                confidence: 0.58,
            }],
            matched_terms: vec!["chef".to_string()],
            analyst_reasoning: None,
        };
        let text = ConsoleFormatter::new(false).format_classification(&result).unwrap();
        assert!(text.contains("Category:   Chef"));
        assert!(text.contains("Confidence: 95%"));
        assert!(text.contains("keyword (ModelUnavailable)"));
    }

    #[test]
    fn test_json_matches() {
        let json = JsonFormatter::new(false).format_matches(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["method"], "hybrid");
        assert_eq!(value["matches"][0]["rank"], 1);
        assert_eq!(value["matches"][0]["source_id"], "python-dev");
    }
}
