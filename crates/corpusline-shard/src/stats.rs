//! Statistics for the cleaning stage.
//!
//! - Shard-level: [`ShardStats`], one per cleaned shard
//! - Summary-level: [`StageSummary`], aggregated after all workers join
//!
//! Intentional drops (filter verdicts) and failures (unreadable shards,
//! malformed lines) are counted separately.

use std::time::Duration;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use corpusline_core::fmt_num;
use serde::{Deserialize, Serialize};

use crate::transform::DropReason;

/// Per-shard statistics for the record pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ShardStats {
    pub shard_idx: usize,
    /// Non-blank lines read from the shard
    pub records_read: usize,
    /// Lines that are not a JSON object
    pub parse_errors: usize,
    /// Records without a string in the configured text field
    pub missing_text: usize,
    pub filtered_raw: usize,
    pub filtered_cleaned: usize,
    pub empty_after_clean: usize,
    /// Records written to the cleaned shard
    pub kept: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ShardStats {
    pub fn new(shard_idx: usize) -> Self {
        Self {
            shard_idx,
            ..Default::default()
        }
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::FilteredRaw => self.filtered_raw += 1,
            DropReason::FilteredCleaned => self.filtered_cleaned += 1,
            DropReason::EmptyAfterClean => self.empty_after_clean += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.filtered_raw + self.filtered_cleaned + self.empty_after_clean
    }

    pub fn failures(&self) -> usize {
        self.parse_errors + self.missing_text
    }

    pub fn log(&self) {
        log::debug!(
            "shard {}: kept {} / {} records ({} dropped, {} bad) [{:.1}s]",
            self.shard_idx,
            fmt_num(self.kept),
            fmt_num(self.records_read),
            fmt_num(self.dropped()),
            fmt_num(self.failures()),
            self.elapsed.as_secs_f64()
        );
    }
}

/// Aggregated statistics for one stage run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSummary {
    pub total_shards: usize,
    pub completed_shards: usize,
    pub failed_shards: usize,
    pub records_read: usize,
    pub parse_errors: usize,
    pub missing_text: usize,
    pub filtered_raw: usize,
    pub filtered_cleaned: usize,
    pub empty_after_clean: usize,
    pub kept: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StageSummary {
    /// Aggregate from individual shard stats.
    pub fn from_shards(shards: &[ShardStats], total: usize, failed: usize) -> Self {
        let mut summary = Self {
            total_shards: total,
            completed_shards: shards.len(),
            failed_shards: failed,
            ..Default::default()
        };
        for s in shards {
            summary.records_read += s.records_read;
            summary.parse_errors += s.parse_errors;
            summary.missing_text += s.missing_text;
            summary.filtered_raw += s.filtered_raw;
            summary.filtered_cleaned += s.filtered_cleaned;
            summary.empty_after_clean += s.empty_after_clean;
            summary.kept += s.kept;
        }
        summary
    }

    pub fn dropped(&self) -> usize {
        self.filtered_raw + self.filtered_cleaned + self.empty_after_clean
    }

    pub fn format_table(&self) -> String {
        let pct = |n: usize| {
            if self.records_read == 0 {
                0.0
            } else {
                n as f64 / self.records_read as f64 * 100.0
            }
        };
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Cleaning")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(Color::Cyan),
                Cell::new("%").fg(Color::Cyan),
            ]);

        table.add_row(vec![
            Cell::new("Shards"),
            Cell::new(format!(
                "{}/{} ({} failed)",
                self.completed_shards, self.total_shards, self.failed_shards
            )),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Records read"),
            Cell::new(fmt_num(self.records_read)),
            Cell::new(""),
        ]);
        for (label, n) in [
            ("Parse errors", self.parse_errors),
            ("Missing text", self.missing_text),
            ("Filtered (raw)", self.filtered_raw),
            ("Filtered (cleaned)", self.filtered_cleaned),
            ("Empty after clean", self.empty_after_clean),
        ] {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(fmt_num(n)),
                Cell::new(format!("{:.1}", pct(n))),
            ]);
        }
        table.add_row(vec![
            Cell::new("Kept").fg(Color::Green),
            Cell::new(fmt_num(self.kept)).fg(Color::Green),
            Cell::new(format!("{:.1}", pct(self.kept))).fg(Color::Green),
        ]);

        format!("\n{table}")
    }

    pub fn log(&self) {
        log::info!(
            "Cleaning: {}/{} shards ({} failed), kept {} of {} records ({} dropped, {} bad) in {:.1}s",
            self.completed_shards,
            self.total_shards,
            self.failed_shards,
            fmt_num(self.kept),
            fmt_num(self.records_read),
            fmt_num(self.dropped()),
            fmt_num(self.parse_errors + self.missing_text),
            self.elapsed.as_secs_f64()
        );
    }
}
