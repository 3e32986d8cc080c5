//! Unit counting across source files, format-aware

use std::path::PathBuf;

use corpusline_core::{InputFormat, LineCounter};

/// Total units of work in `files`.
///
/// Text input counts one unit per file. JSONL input sums the line counts
/// reported by `counter`; a file the counter cannot read contributes zero
/// and is left for the planner to report.
pub fn count_units(files: &[PathBuf], format: InputFormat, counter: &dyn LineCounter) -> usize {
    match format {
        InputFormat::Text => files.len(),
        InputFormat::Jsonl => files
            .iter()
            .map(|path| match counter.count_lines(path) {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("Failed to count lines of {}: {e}", path.display());
                    0
                }
            })
            .sum(),
    }
}
