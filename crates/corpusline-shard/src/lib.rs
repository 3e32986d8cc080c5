//! Corpusline shard pipeline
//!
//! Splits a corpus of plain-text files or JSONL records into balanced,
//! provenance-tagged shards, runs every record through the
//! extract → filter → clean → filter pipeline (single-threaded or on a
//! worker pool), and merges the survivors into one corpus file.
//!
//! ```text
//! <output>/.tmp/N.jsonl       planned shards
//! <output>/.cleaned/N.jsonl   cleaned shards, full records
//! <output>/out/corpus.jsonl   merged corpus, {text, source_tag}
//! <output>/out/manifest.json  run manifest
//! ```

pub mod config;
pub mod count;
pub mod manifest;
pub mod merge;
pub mod planner;
pub mod runner;
pub mod stage;
pub mod stats;
pub mod transform;
pub mod worker;

pub use config::{RunConfig, SOURCE_TAG_KEY, TEXT_KEY, resolve_workers};
pub use count::count_units;
pub use manifest::{MANIFEST_FILE, RunManifest};
pub use merge::{CORPUS_FILE, MergeStats, merge};
pub use planner::{PlanConfig, PlanSummary, Record, ShardInfo, plan_shards, target_size};
pub use runner::{Counted, RunSummary, count, plan, run};
pub use stage::{Mode, run_stage};
pub use stats::{ShardStats, StageSummary};
pub use transform::{DropReason, Outcome, StageModules, transform};
pub use worker::process_shard;
