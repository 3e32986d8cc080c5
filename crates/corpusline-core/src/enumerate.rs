//! Work enumeration: source files for a format, and shard files by index

use std::path::{Path, PathBuf};

use crate::format::InputFormat;

/// File name of shard `idx` (`0.jsonl`, `1.jsonl`, ...)
pub fn shard_file_name(idx: usize) -> String {
    format!("{idx}.jsonl")
}

/// Parse the shard index back out of a shard path
pub fn shard_index(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(".jsonl")?.parse().ok()
}

/// List source files under `input` whose extension belongs to `format`.
///
/// A single file path is accepted as-is when it matches. Directories are
/// walked recursively; the result is sorted by path so runs are stable.
pub fn list_works(input: &Path, format: InputFormat) -> std::io::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(if format.matches(input) {
            vec![input.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !input.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input path not found: {}", input.display()),
        ));
    }

    let pattern = Path::new(&glob::Pattern::escape(&input.to_string_lossy())).join("**/*");
    let pattern_str = pattern.to_string_lossy();

    let mut works: Vec<PathBuf> = glob::glob(&pattern_str)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?
        .filter_map(|entry| match entry {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|p| p.is_file() && format.matches(p))
        .collect();
    works.sort();
    log::debug!("{} {format} files under {}", works.len(), input.display());
    Ok(works)
}

/// List `N.jsonl` shard files in `dir`, ordered by numeric index.
///
/// Files that do not follow the shard naming are ignored.
pub fn list_shards(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut shards: Vec<(usize, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter_map(|p| shard_index(&p).map(|idx| (idx, p)))
        .collect();
    shards.sort_by_key(|(idx, _)| *idx);
    Ok(shards.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn shard_names_roundtrip() {
        assert_eq!(shard_file_name(12), "12.jsonl");
        assert_eq!(shard_index(Path::new("/x/12.jsonl")), Some(12));
        assert_eq!(shard_index(Path::new("/x/12.jsonl.tmp")), None);
        assert_eq!(shard_index(Path::new("/x/corpus.jsonl")), None);
    }

    #[test]
    fn list_works_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("nested/c.txt"), "c").unwrap();
        std::fs::write(dir.path().join("skip.jsonl"), "{}").unwrap();

        let works = list_works(dir.path(), InputFormat::Text).unwrap();
        let names: Vec<_> = works
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("nested/c.txt")
            ]
        );
    }

    #[test]
    fn list_works_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.jsonl");
        std::fs::write(&path, "{}\n").unwrap();
        assert_eq!(list_works(&path, InputFormat::Jsonl).unwrap(), vec![path]);
    }

    #[test]
    fn list_works_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_works(&dir.path().join("nope"), InputFormat::Text).is_err());
    }

    #[test]
    fn list_shards_numeric_order() {
        let dir = TempDir::new().unwrap();
        for idx in [10, 2, 0, 1] {
            std::fs::write(dir.path().join(shard_file_name(idx)), "").unwrap();
        }
        std::fs::write(dir.path().join("3.jsonl.tmp"), "").unwrap();

        let shards = list_shards(dir.path()).unwrap();
        let idx: Vec<_> = shards.iter().filter_map(|p| shard_index(p)).collect();
        assert_eq!(idx, vec![0, 1, 2, 10]);
    }
}
