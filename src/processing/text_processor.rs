//! Text normalization for keyword comparison and embedding input

use crate::error::{MatcherError, Result};
use regex::Regex;

/// Normalizes raw document text.
///
/// Two flavours are provided: [`TextProcessor::normalize`] produces the strict form used by
/// every lexical comparison (lowercase alphanumerics separated by single spaces), while
/// [`TextProcessor::normalize_for_embedding`] keeps punctuation and casing, which the
/// embedding model handles on its own.
#[derive(Debug, Clone)]
pub struct TextProcessor {
    whitespace_regex: Regex,
    punct_run_regex: Regex,
}

impl TextProcessor {
    pub fn new() -> Result<Self> {
        let whitespace_regex = Regex::new(r"\s+")
            .map_err(|e| MatcherError::Configuration(format!("Invalid whitespace regex: {}", e)))?;
        let punct_run_regex = Regex::new(r"([.!?,;:])[.!?,;:]{2,}")
            .map_err(|e| MatcherError::Configuration(format!("Invalid punctuation regex: {}", e)))?;

        Ok(Self {
            whitespace_regex,
            punct_run_regex,
        })
    }

    /// Lowercase, replace every character outside alphanumerics/whitespace with a space,
    /// collapse whitespace. Never fails; empty input gives an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let mapped: String = text
            .chars()
            .flat_map(char::to_lowercase)
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
            .collect();

        self.collapse_whitespace(&mapped)
    }

    /// Looser cleanup for model input: unicode punctuation folded to ASCII,
    /// runs of punctuation shortened, whitespace collapsed.
    pub fn normalize_for_embedding(&self, text: &str) -> String {
        let folded: String = text
            .chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2022}' | '\u{25CF}' => ' ',
                '\u{2026}' => '.',
                _ => c,
            })
            .collect();

        let shortened = self.punct_run_regex.replace_all(&folded, "$1");
        self.collapse_whitespace(&shortened)
    }

    /// Keep at most `max_chars` characters, cutting on a char boundary
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    fn collapse_whitespace(&self, text: &str) -> String {
        self.whitespace_regex.replace_all(text, " ").trim().to_string()
    }
}
