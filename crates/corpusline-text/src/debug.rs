//! Sampling debugger: bounded text statistics reported before a run
//!
//! Purely observational. The debugger only reads the texts it is given and
//! never feeds anything back into the pipeline.

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use corpusline_core::fmt_num;
use rustc_hash::FxHashMap;

/// Number of most frequent characters listed in the report
const TOP_CHARS: usize = 10;

#[derive(Debug)]
pub struct Debugger {
    sample_size: usize,
    docs: usize,
    empty: usize,
    chars: usize,
    min_chars: Option<usize>,
    max_chars: usize,
    lines: usize,
    words: usize,
    markup: usize,
    char_freq: FxHashMap<char, usize>,
}

impl Debugger {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            docs: 0,
            empty: 0,
            chars: 0,
            min_chars: None,
            max_chars: 0,
            lines: 0,
            words: 0,
            markup: 0,
            char_freq: FxHashMap::default(),
        }
    }

    /// Whether the sample bound has been reached
    pub fn is_full(&self) -> bool {
        self.docs >= self.sample_size
    }

    /// Accumulate one text. Returns `false` once the sample is full.
    pub fn sample(&mut self, text: &str) -> bool {
        if self.is_full() {
            return false;
        }
        self.docs += 1;
        let n = text.chars().count();
        if text.trim().is_empty() {
            self.empty += 1;
        }
        self.chars += n;
        self.min_chars = Some(self.min_chars.map_or(n, |m| m.min(n)));
        self.max_chars = self.max_chars.max(n);
        self.lines += text.lines().count();
        self.words += text.split_whitespace().count();
        for c in text.chars() {
            if matches!(c, '<' | '>' | '{' | '}' | '[' | ']' | '|' | '=') {
                self.markup += 1;
            }
            if !c.is_whitespace() {
                *self.char_freq.entry(c).or_default() += 1;
            }
        }
        true
    }

    pub fn report(&self) -> DebugReport {
        let mean = |total: usize| {
            if self.docs == 0 {
                0.0
            } else {
                total as f64 / self.docs as f64
            }
        };
        let mut top: Vec<(char, usize)> = self.char_freq.iter().map(|(c, n)| (*c, *n)).collect();
        top.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top.truncate(TOP_CHARS);

        DebugReport {
            docs: self.docs,
            empty: self.empty,
            mean_chars: mean(self.chars),
            min_chars: self.min_chars.unwrap_or(0),
            max_chars: self.max_chars,
            mean_lines: mean(self.lines),
            mean_words: mean(self.words),
            markup_ratio: if self.chars == 0 {
                0.0
            } else {
                self.markup as f64 / self.chars as f64
            },
            top_chars: top,
        }
    }
}

/// Aggregate statistics over the sampled texts.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugReport {
    pub docs: usize,
    pub empty: usize,
    pub mean_chars: f64,
    pub min_chars: usize,
    pub max_chars: usize,
    pub mean_lines: f64,
    pub mean_words: f64,
    pub markup_ratio: f64,
    pub top_chars: Vec<(char, usize)>,
}

impl DebugReport {
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Sample").fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);
        table.add_row(vec![Cell::new("Documents"), Cell::new(fmt_num(self.docs))]);
        table.add_row(vec![Cell::new("Empty"), Cell::new(fmt_num(self.empty))]);
        table.add_row(vec![
            Cell::new("Chars (mean / min / max)"),
            Cell::new(format!(
                "{:.1} / {} / {}",
                self.mean_chars,
                fmt_num(self.min_chars),
                fmt_num(self.max_chars)
            )),
        ]);
        table.add_row(vec![
            Cell::new("Lines (mean)"),
            Cell::new(format!("{:.1}", self.mean_lines)),
        ]);
        table.add_row(vec![
            Cell::new("Words (mean)"),
            Cell::new(format!("{:.1}", self.mean_words)),
        ]);
        table.add_row(vec![
            Cell::new("Markup ratio"),
            Cell::new(format!("{:.3}", self.markup_ratio)),
        ]);
        let top = self
            .top_chars
            .iter()
            .map(|(c, n)| format!("{c:?}:{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![Cell::new("Top chars"), Cell::new(top)]);
        format!("\n{table}")
    }

    pub fn log(&self) {
        log::info!(
            "Debug sample: {} docs ({} empty), {:.1} chars/doc, markup ratio {:.3}",
            fmt_num(self.docs),
            self.empty,
            self.mean_chars,
            self.markup_ratio
        );
    }
}
