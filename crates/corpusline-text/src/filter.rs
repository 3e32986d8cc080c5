//! Quality filter: length bounds, markup density, alphabetic ratio, blocklist

use serde::Deserialize;

use crate::Filter;

/// Characters counted as markup/code residue
const MARKUP_CHARS: &[char] = &['<', '>', '{', '}', '[', ']', '|', '=', '\\', '#', '*', '`'];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Drop texts shorter than this many characters (empty texts always drop)
    pub min_chars: usize,
    pub max_chars: Option<usize>,
    /// Drop when markup characters exceed this share of non-whitespace chars
    pub max_markup_ratio: Option<f64>,
    /// Drop when alphabetic characters fall below this share of non-whitespace chars
    pub min_alpha_ratio: Option<f64>,
    /// Case-insensitive phrases that disqualify a text
    pub blocked_phrases: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            min_chars: 1,
            max_chars: None,
            max_markup_ratio: Some(0.3),
            min_alpha_ratio: None,
            blocked_phrases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    settings: FilterSettings,
    blocked: Vec<String>,
}

impl QualityFilter {
    pub fn new(settings: FilterSettings) -> Self {
        let blocked = settings
            .blocked_phrases
            .iter()
            .map(|p| p.to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { settings, blocked }
    }

    /// Why `text` would be dropped, or `None` if it passes.
    pub fn verdict(&self, text: &str) -> Option<&'static str> {
        let s = &self.settings;
        if text.trim().is_empty() {
            return Some("empty");
        }
        let chars = text.chars().count();
        if chars < s.min_chars {
            return Some("too short");
        }
        if s.max_chars.is_some_and(|max| chars > max) {
            return Some("too long");
        }

        let mut visible = 0usize;
        let mut markup = 0usize;
        let mut alpha = 0usize;
        for c in text.chars().filter(|c| !c.is_whitespace()) {
            visible += 1;
            if MARKUP_CHARS.contains(&c) {
                markup += 1;
            }
            if c.is_alphabetic() {
                alpha += 1;
            }
        }
        let ratio = |n: usize| n as f64 / visible as f64;
        if s.max_markup_ratio.is_some_and(|max| ratio(markup) > max) {
            return Some("markup density");
        }
        if s.min_alpha_ratio.is_some_and(|min| ratio(alpha) < min) {
            return Some("low alphabetic ratio");
        }

        if !self.blocked.is_empty() {
            let lower = text.to_lowercase();
            if self.blocked.iter().any(|p| lower.contains(p.as_str())) {
                return Some("blocked phrase");
            }
        }
        None
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new(FilterSettings::default())
    }
}

impl Filter for QualityFilter {
    fn filter(&self, text: &str) -> bool {
        match self.verdict(text) {
            Some(reason) => {
                log::trace!("filtered ({reason}): {} chars", text.len());
                true
            }
            None => false,
        }
    }
}
