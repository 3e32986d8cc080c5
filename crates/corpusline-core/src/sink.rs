//! Output sink: buffered JSONL writer with atomic tmp→rename

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Buffered JSONL writer.
///
/// Lines go to `<name>.tmp`; [`finalize`](JsonlSink::finalize) renames it to
/// the final path, so a reader never observes a half-written file.
pub struct JsonlSink {
    writer: BufWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Create a new sink writing `file_name` inside `output_dir`
    pub fn new(output_dir: &Path, file_name: &str) -> std::io::Result<Self> {
        let final_path = output_dir.join(file_name);
        let tmp_path = output_dir.join(format!("{file_name}.tmp"));

        // Clean up stale tmp file
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    /// Serialize one value as a line
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, value).map_err(std::io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.row_count += 1;
        Ok(())
    }

    /// Flush and atomically rename tmp → final
    pub fn finalize(self) -> std::io::Result<usize> {
        let row_count = self.row_count;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(row_count)
    }

    /// Drop the partial output without publishing it
    pub fn abandon(self) {
        let tmp_path = self.tmp_path.clone();
        drop(self.writer);
        if let Err(e) = fs::remove_file(&tmp_path) {
            log::debug!("Failed to remove {}: {e}", tmp_path.display());
        }
    }
}

/// Remove stale .tmp files in the output directory
pub fn cleanup_tmp_files(output_dir: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn finalize_publishes_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonlSink::new(dir.path(), "0.jsonl").unwrap();
        sink.write(&json!({"text": "a"})).unwrap();
        sink.write(&json!({"text": "b"})).unwrap();

        assert!(!dir.path().join("0.jsonl").exists());
        assert!(dir.path().join("0.jsonl.tmp").exists());

        assert_eq!(sink.finalize().unwrap(), 2);
        let content = std::fs::read_to_string(dir.path().join("0.jsonl")).unwrap();
        assert_eq!(content, "{\"text\":\"a\"}\n{\"text\":\"b\"}\n");
        assert!(!dir.path().join("0.jsonl.tmp").exists());
    }

    #[test]
    fn abandon_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonlSink::new(dir.path(), "1.jsonl").unwrap();
        sink.write(&json!({"text": "a"})).unwrap();
        sink.abandon();

        assert!(!dir.path().join("1.jsonl").exists());
        assert!(!dir.path().join("1.jsonl.tmp").exists());
    }

    #[test]
    fn new_replaces_stale_tmp() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("0.jsonl.tmp"), b"stale").unwrap();
        let sink = JsonlSink::new(dir.path(), "0.jsonl").unwrap();
        assert_eq!(sink.finalize().unwrap(), 0);
        assert_eq!(std::fs::read(dir.path().join("0.jsonl")).unwrap(), b"");
    }

    #[test]
    fn cleanup_tmp_files_removes_only_tmp() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.tmp"), b"stale").unwrap();
        std::fs::write(dir.path().join("0.jsonl"), b"keep").unwrap();
        std::fs::write(dir.path().join("1.jsonl.tmp"), b"stale2").unwrap();

        cleanup_tmp_files(dir.path()).unwrap();

        assert!(!dir.path().join("a.tmp").exists());
        assert!(dir.path().join("0.jsonl").exists());
        assert!(!dir.path().join("1.jsonl.tmp").exists());
    }
}
