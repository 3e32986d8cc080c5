//! Corpusline Core - Common infrastructure for corpus preparation pipelines
//!
//! This crate provides the pieces shared by the shard planner and the
//! cleaning stages: input format detection, work enumeration, line
//! counting, atomic JSONL sinks, logging and progress reporting.

pub mod enumerate;
pub mod error;
pub mod format;
pub mod line_count;
pub mod logging;
pub mod progress;
pub mod queue;
pub mod sink;

// Re-exports for convenience
pub use enumerate::{list_shards, list_works, shard_file_name, shard_index};
pub use error::{RecordError, UnsupportedFormat, parse_object};
pub use format::InputFormat;
pub use line_count::{LineCounter, MmapLineCounter};
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use queue::ShardQueue;
pub use sink::{JsonlSink, cleanup_tmp_files};
