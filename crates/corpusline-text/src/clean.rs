//! Rule-based cleaner: control stripping, redaction, whitespace normalization
//!
//! Every rule is idempotent, so `clean(clean(x)) == clean(x)`. Redaction
//! placeholders are chosen so that neither the extractor nor the redaction
//! patterns match them again.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::Cleaner;

pub const URL_PLACEHOLDER: &str = "[URL]";
pub const EMAIL_PLACEHOLDER: &str = "[EMAIL]";

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>\[\]]+").expect("invalid url regex")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
        .expect("invalid email regex")
});

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{3000}]+").expect("invalid space regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanSettings {
    /// Drop control and zero-width characters (newline and tab are kept)
    pub strip_control: bool,
    pub redact_urls: bool,
    pub redact_emails: bool,
    /// Collapse inline whitespace runs and trim line ends
    pub normalize_whitespace: bool,
    /// Maximum consecutive blank lines kept
    pub max_blank_lines: usize,
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self {
            strip_control: true,
            redact_urls: false,
            redact_emails: false,
            normalize_whitespace: true,
            max_blank_lines: 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleCleaner {
    settings: CleanSettings,
}

impl RuleCleaner {
    pub fn new(settings: CleanSettings) -> Self {
        Self { settings }
    }
}

impl Cleaner for RuleCleaner {
    fn clean(&self, text: &str) -> String {
        let s = &self.settings;
        let mut out = text.replace("\r\n", "\n").replace('\r', "\n");
        if s.strip_control {
            out.retain(|c| !is_noise_char(c));
        }
        if s.redact_urls {
            out = URL.replace_all(&out, URL_PLACEHOLDER).into_owned();
        }
        if s.redact_emails {
            out = EMAIL.replace_all(&out, EMAIL_PLACEHOLDER).into_owned();
        }
        if s.normalize_whitespace {
            out = normalize_whitespace(&out, s.max_blank_lines);
        }
        out
    }
}

pub(crate) fn is_noise_char(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

fn normalize_whitespace(text: &str, max_blank_lines: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in text.lines() {
        let line = INLINE_SPACE.replace_all(line, " ");
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > max_blank_lines {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
