//! Line counting for JSONL sources

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

/// Counts the lines of a source file.
///
/// Injected into unit counting so tests can substitute a fake.
pub trait LineCounter: Sync {
    fn count_lines(&self, path: &Path) -> std::io::Result<usize>;
}

/// Native line counter scanning a memory map for `\n`.
///
/// A trailing line without a newline counts as one line, the same way a
/// buffered line reader yields it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MmapLineCounter;

impl LineCounter for MmapLineCounter {
    fn count_lines(&self, path: &Path) -> std::io::Result<usize> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(0);
        }
        // SAFETY: source files are read-only inputs for the duration of the run
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(count_newlines(&mmap))
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
