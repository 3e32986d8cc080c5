//! Markup extraction: drop script/style blocks and tags, decode entities
//!
//! Extraction runs rounds of decode → strip until the text stops changing,
//! so `extract(extract(x)) == extract(x)`. Every round that changes the text
//! makes it shorter; a text still changing after `MAX_ROUNDS` is treated as
//! having no extractable content.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::Extractor;
use crate::clean::is_noise_char;

/// Rounds before a still-unfolding text is given up on
const MAX_ROUNDS: usize = 8;

/// Longest entity recognised, `&#x10FFFF;`
const MAX_ENTITY_LEN: usize = 10;

static HIDDEN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")
        .expect("invalid hidden block regex")
});

/// Tags that end a visual line
static BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:br\s*/?|/p|/div|/li|/tr|/h[1-6])\s*>").expect("invalid break tag regex")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").expect("invalid tag regex"));

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Remove HTML/XML tags and script/style blocks
    pub strip_markup: bool,
    /// Decode named and numeric character entities
    pub decode_entities: bool,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            strip_markup: true,
            decode_entities: true,
        }
    }
}

/// Best-effort markup stripper. Never fails; unknown constructs pass through.
#[derive(Debug, Clone, Default)]
pub struct MarkupExtractor {
    settings: ExtractSettings,
}

impl MarkupExtractor {
    pub fn new(settings: ExtractSettings) -> Self {
        Self { settings }
    }

    fn round(&self, text: &str) -> String {
        let mut out = if self.settings.decode_entities {
            decode_entities(text)
        } else {
            text.to_string()
        };
        // same set the cleaner drops, so cleaning never joins up new markup
        out.retain(|c| c == '\r' || !is_noise_char(c));
        if self.settings.strip_markup {
            out = HIDDEN_BLOCK.replace_all(&out, "").into_owned();
            out = BREAK_TAG.replace_all(&out, "\n").into_owned();
            out = TAG.replace_all(&out, "").into_owned();
        }
        out
    }
}

impl Extractor for MarkupExtractor {
    fn extract(&self, text: &str) -> String {
        if !self.settings.strip_markup && !self.settings.decode_entities {
            return text.to_string();
        }
        let mut out = text.to_string();
        for _ in 0..MAX_ROUNDS {
            let next = self.round(&out);
            if next == out {
                return out;
            }
            out = next;
        }
        log::debug!(
            "markup still unfolding after {MAX_ROUNDS} rounds, dropping {} chars",
            out.len()
        );
        String::new()
    }
}

/// Decode entities in one pass, including any an earlier decode assembles
/// (`&amp;lt;` → `<`). The result holds no decodable entity.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        out.push(c);
        while out.ends_with(';') {
            let Some(start) = entity_start(&out) else {
                break;
            };
            let Some(decoded) = decode_entity(&out[start..]) else {
                break;
            };
            out.truncate(start);
            out.push(decoded);
        }
    }
    out
}

/// Byte offset of the last `&` close enough to the end to open an entity.
fn entity_start(out: &str) -> Option<usize> {
    let mut from = out.len().saturating_sub(MAX_ENTITY_LEN);
    while !out.is_char_boundary(from) {
        from += 1;
    }
    out[from..].rfind('&').map(|i| from + i)
}

fn decode_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('&')?.strip_suffix(';')?;
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                code_point(hex, 16)
            } else {
                code_point(body.strip_prefix('#')?, 10)
            }
        }
    }
}

fn code_point(digits: &str, radix: u32) -> Option<char> {
    if digits.is_empty() || digits.len() > 6 || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}
