//! Single-shard procedure: run the record pipeline over one shard file

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use corpusline_core::{JsonlSink, RecordError, parse_object};
use indicatif::ProgressBar;
use serde_json::Value;

use crate::config::TEXT_KEY;
use crate::stats::ShardStats;
use crate::transform::{Outcome, StageModules};

/// Progress update interval (every N records to avoid overhead)
const UPDATE_INTERVAL: usize = 1_000;

/// Transform every record of `input` into `output_dir/<same file name>`.
///
/// Malformed lines and records without text are skipped and counted. An
/// I/O failure on the shard itself returns `Err` and leaves no output file:
/// the cleaned shard is either fully written or absent.
pub fn process_shard(
    input: &Path,
    shard_idx: usize,
    output_dir: &Path,
    modules: &StageModules,
    text_key: &str,
    pb: &ProgressBar,
) -> std::io::Result<ShardStats> {
    let start = Instant::now();
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| std::io::Error::other(format!("bad shard path: {}", input.display())))?;
    if output_dir.join(file_name) == input {
        return Err(std::io::Error::other(format!(
            "shard input and output are the same file: {}",
            input.display()
        )));
    }

    let reader = BufReader::new(File::open(input)?);
    let mut sink = JsonlSink::new(output_dir, file_name)?;
    let mut stats = ShardStats::new(shard_idx);

    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                sink.abandon();
                return Err(e);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        stats.records_read += 1;
        if stats.records_read.is_multiple_of(UPDATE_INTERVAL) {
            pb.set_position(stats.records_read as u64);
        }

        let mut record = match parse_object(&line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("{}:{}: skipping record: {e}", input.display(), line_no + 1);
                stats.parse_errors += 1;
                continue;
            }
        };
        let outcome = match record.get(text_key).and_then(Value::as_str) {
            Some(text) => modules.transform(text),
            None => {
                let e = RecordError::MissingText {
                    key: text_key.to_string(),
                };
                log::warn!("{}:{}: skipping record: {e}", input.display(), line_no + 1);
                stats.missing_text += 1;
                continue;
            }
        };

        match outcome {
            Outcome::Kept(text) => {
                record.insert(TEXT_KEY.to_string(), Value::String(text));
                if let Err(e) = sink.write(&record) {
                    sink.abandon();
                    return Err(e);
                }
                stats.kept += 1;
            }
            Outcome::Dropped(reason) => stats.record_drop(reason),
        }
    }

    sink.finalize()?;
    pb.set_position(stats.records_read as u64);
    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpusline_text::{KeepAll, Passthrough, QualityFilter, RuleCleaner};
    use tempfile::TempDir;

    fn modules() -> StageModules {
        StageModules::new(
            Box::new(Passthrough),
            Box::new(QualityFilter::default()),
            Box::new(RuleCleaner::default()),
        )
    }

    fn lines(path: &Path) -> Vec<serde_json::Map<String, Value>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| parse_object(l).unwrap())
            .collect()
    }

    fn setup(body: &str) -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join(".tmp");
        let output_dir = dir.path().join(".cleaned");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();
        let input = input_dir.join("0.jsonl");
        std::fs::write(&input, body).unwrap();
        (dir, input, output_dir)
    }

    #[test]
    fn keeps_and_rewrites_text() {
        let (_dir, input, out) = setup(
            "{\"content\":\"  hello   world \",\"id\":1,\"source_tag\":\"t\"}\n\
             {\"content\":\"   \",\"id\":2,\"source_tag\":\"t\"}\n",
        );
        let stats =
            process_shard(&input, 0, &out, &modules(), "content", &ProgressBar::hidden()).unwrap();
        assert_eq!(stats.records_read, 2);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.filtered_raw, 1);

        let records = lines(&out.join("0.jsonl"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["text"], "hello world");
        assert_eq!(records[0]["content"], "  hello   world ");
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[0]["source_tag"], "t");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (_dir, input, out) = setup(
            "{\"text\":\"a\"}\n{broken\n[1,2]\n{\"other\":1}\n{\"text\":5}\n{\"text\":\"b\"}\n",
        );
        let stats =
            process_shard(&input, 0, &out, &modules(), "text", &ProgressBar::hidden()).unwrap();
        assert_eq!(stats.parse_errors, 2);
        assert_eq!(stats.missing_text, 2);
        assert_eq!(stats.kept, 2);
        let texts: Vec<_> = lines(&out.join("0.jsonl"))
            .into_iter()
            .map(|r| r["text"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn empty_after_clean_counted_separately() {
        let (_dir, input, out) = setup("{\"text\":\"\\u200b\\u200b\"}\n");
        let m = StageModules::new(
            Box::new(Passthrough),
            Box::new(KeepAll),
            Box::new(RuleCleaner::default()),
        );
        let stats = process_shard(&input, 0, &out, &m, "text", &ProgressBar::hidden()).unwrap();
        assert_eq!(stats.empty_after_clean, 1);
        assert_eq!(stats.kept, 0);
        assert_eq!(stats.failures(), 0);
        assert_eq!(std::fs::read_to_string(out.join("0.jsonl")).unwrap(), "");
    }

    #[test]
    fn missing_shard_is_an_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("7.jsonl");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let err = process_shard(&input, 7, &out, &modules(), "text", &ProgressBar::hidden());
        assert!(err.is_err());
        assert!(!out.join("7.jsonl").exists());
        assert!(!out.join("7.jsonl.tmp").exists());
    }

    #[test]
    fn invalid_utf8_shard_leaves_no_output() {
        let (_dir, input, out) = setup("");
        std::fs::write(&input, b"{\"text\":\"a\"}\n\xff\xfe\n").unwrap();
        let err = process_shard(&input, 0, &out, &modules(), "text", &ProgressBar::hidden());
        assert!(err.is_err());
        assert!(!out.join("0.jsonl").exists());
        assert!(!out.join("0.jsonl.tmp").exists());
    }

    #[test]
    fn refuses_in_place_rewrite() {
        let (_dir, input, _out) = setup("{\"text\":\"a\"}\n");
        let same_dir = input.parent().unwrap();
        let err = process_shard(&input, 0, same_dir, &modules(), "text", &ProgressBar::hidden());
        assert!(err.is_err());
        assert_eq!(
            std::fs::read_to_string(&input).unwrap(),
            "{\"text\":\"a\"}\n"
        );
    }
}
