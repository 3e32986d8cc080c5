//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: indicatif bars for planning, per-shard cleaning and merging.
//! Non-TTY mode: hidden bars; the log is the only progress indicator.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Counted bar: `<prefix> [bar] pos/len eta msg`
fn count_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<16.dim} {bar:30.green/dim} {human_pos:>9}/{human_len:9} {eta:>4} {wide_msg:.dim}")
        .expect("invalid template")
        .progress_chars("--")
}

/// Per-shard spinner, used while the record count of a shard is unknown
fn shard_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {prefix:<16.dim} {human_pos:>9} records {wide_msg:.dim}")
        .expect("invalid template")
}

/// Central progress context managing multi-progress bars.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        Self::with_tty(std::io::stderr().is_terminal())
    }

    /// Create a context that never draws (tests, library callers).
    pub fn hidden() -> Self {
        Self::with_tty(false)
    }

    fn with_tty(is_tty: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Bar over a known number of items (source files, shards).
    pub fn counter_bar(&self, name: &str, total: u64) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(count_style());
        pb.set_prefix(truncate(name).to_string());
        pb
    }

    /// Spinner counting records of one shard.
    pub fn shard_bar(&self, name: &str) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(shard_style());
        pb.set_prefix(truncate(name).to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for `ProgressContext`.
pub type SharedProgress = Arc<ProgressContext>;

fn truncate(name: &str) -> &str {
    match name.char_indices().nth(16) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

/// Format number with thousand separators.
pub fn fmt_num(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_small() {
        assert_eq!(fmt_num(0), "0");
        assert_eq!(fmt_num(123), "123");
    }

    #[test]
    fn fmt_num_thousands() {
        assert_eq!(fmt_num(1_000), "1,000");
        assert_eq!(fmt_num(123_456), "123,456");
        assert_eq!(fmt_num(1_234_567), "1,234,567");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("shard_0001"), "shard_0001");
        assert_eq!(truncate("ééééééééééééééééééé").chars().count(), 16);
    }

    #[test]
    fn hidden_context_bars_are_hidden() {
        let ctx = ProgressContext::hidden();
        assert!(!ctx.is_tty());
        assert!(ctx.counter_bar("plan", 10).is_hidden());
        assert!(ctx.shard_bar("0.jsonl").is_hidden());
    }
}
