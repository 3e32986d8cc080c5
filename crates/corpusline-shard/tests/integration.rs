//! End-to-end runs over on-disk fixtures

use std::path::{Path, PathBuf};

use corpusline_core::{ProgressContext, list_shards, parse_object};
use corpusline_shard::{CORPUS_FILE, MANIFEST_FILE, Record, RunConfig, RunManifest, run};
use serde_json::json;
use tempfile::TempDir;

fn config(root: &Path, ext: &str, extra: &str) -> RunConfig {
    let toml = format!(
        r#"
[input]
path = '{}'
ext = "{ext}"

[output]
path = '{}'
source_tag = "fixture"

{extra}
"#,
        root.join("raw").display(),
        root.join("clean").display(),
    );
    let path = root.join("run.toml");
    std::fs::write(&path, toml).unwrap();
    RunConfig::from_file(&path).unwrap()
}

fn write_input(root: &Path, name: &str, body: &str) -> PathBuf {
    let dir = root.join("raw");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn read_jsonl(path: &Path) -> Vec<Record> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| parse_object(l).unwrap())
        .collect()
}

fn read_dir_jsonl(dir: &Path) -> Vec<Record> {
    list_shards(dir)
        .unwrap()
        .iter()
        .flat_map(|p| read_jsonl(p))
        .collect()
}

#[test]
fn text_corpus_end_to_end() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        write_input(dir.path(), &format!("{i}.txt"), "hello world");
    }
    let config = config(
        dir.path(),
        "txt",
        "[parallel]\nenabled = true\nworkers = 2\n",
    );
    let summary = run(&config, &ProgressContext::hidden()).unwrap().unwrap();
    assert_eq!(summary.total_units, 5);
    assert_eq!(summary.plan.target_size, 3);

    let shards = list_shards(&config.tmp_dir()).unwrap();
    assert_eq!(shards.len(), 2);
    assert!(shards[0].ends_with("0.jsonl"));
    assert!(shards[1].ends_with("1.jsonl"));
    let first = read_jsonl(&shards[0]);
    let second = read_jsonl(&shards[1]);
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);
    assert!(first
        .iter()
        .chain(&second)
        .all(|r| r["source_tag"] == "fixture"));

    let corpus = read_jsonl(&config.out_dir().join(CORPUS_FILE));
    assert_eq!(corpus.len(), 5);
    for record in corpus {
        assert_eq!(
            serde_json::Value::Object(record),
            json!({"text": "hello world", "source_tag": "fixture"})
        );
    }
}

#[test]
fn dropped_records_are_counted_not_failed() {
    let dir = TempDir::new().unwrap();
    write_input(
        dir.path(),
        "docs.jsonl",
        "{\"text\":\"keep me\",\"id\":1}\n\
         {\"text\":\"\\u200b\\u200b\",\"id\":2}\n\
         {\"id\":3}\n\
         {\"text\":\"keep me too\",\"id\":4}\n",
    );
    let config = config(dir.path(), "jsonl", "[stages]\nfilter = false\n");
    let summary = run(&config, &ProgressContext::hidden()).unwrap().unwrap();

    assert_eq!(summary.stage.records_read, 4);
    assert_eq!(summary.stage.empty_after_clean, 1);
    assert_eq!(summary.stage.missing_text, 1);
    assert_eq!(summary.stage.parse_errors, 0);
    assert_eq!(summary.stage.kept, 2);
    assert_eq!(summary.stage.failed_shards, 0);

    let cleaned: Vec<_> = read_dir_jsonl(&config.cleaned_dir())
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(cleaned, vec![1, 4]);
    assert_eq!(read_jsonl(&config.out_dir().join(CORPUS_FILE)).len(), 2);
}

#[test]
fn provenance_survives_and_projection_is_exact() {
    let dir = TempDir::new().unwrap();
    write_input(
        dir.path(),
        "a.jsonl",
        "{\"text\":\"<p>first   doc</p>\",\"source_tag\":\"stale\",\"lang\":\"en\"}\n\
         {\"text\":\"second doc\",\"meta\":{\"page\":2}}\n",
    );
    let config = config(dir.path(), "jsonl", "");
    run(&config, &ProgressContext::hidden()).unwrap().unwrap();

    let cleaned = read_dir_jsonl(&config.cleaned_dir());
    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned[0]["text"], "first doc");
    assert_eq!(cleaned[0]["lang"], "en");
    assert_eq!(cleaned[1]["meta"], json!({"page": 2}));
    assert!(cleaned.iter().all(|r| r["source_tag"] == "fixture"));

    for record in read_jsonl(&config.out_dir().join(CORPUS_FILE)) {
        let mut keys: Vec<_> = record.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["source_tag", "text"]);
        assert_eq!(record["source_tag"], "fixture");
    }
}

#[test]
fn parallel_and_single_thread_agree() {
    let dir = TempDir::new().unwrap();
    let body: String = (0..40)
        .map(|i| format!("{{\"text\":\"document  number {i}\",\"n\":{i}}}\n"))
        .collect();
    write_input(dir.path(), "a.jsonl", &body);
    write_input(dir.path(), "b.jsonl", "{\"text\":\"tail\"}\n");

    let single = config(dir.path(), "jsonl", "");
    run(&single, &ProgressContext::hidden()).unwrap().unwrap();
    let single_corpus = std::fs::read_to_string(single.out_dir().join(CORPUS_FILE)).unwrap();
    assert_eq!(list_shards(&single.tmp_dir()).unwrap().len(), 1);

    let parallel = config(
        dir.path(),
        "jsonl",
        "[parallel]\nenabled = true\nworkers = 4\n",
    );
    let summary = run(&parallel, &ProgressContext::hidden()).unwrap().unwrap();
    assert_eq!(summary.plan.shards.len(), 4);
    let parallel_corpus =
        std::fs::read_to_string(parallel.out_dir().join(CORPUS_FILE)).unwrap();

    assert_eq!(single_corpus, parallel_corpus);
    assert_eq!(single_corpus.lines().count(), 41);
}

#[test]
fn rerun_replaces_earlier_shards() {
    let dir = TempDir::new().unwrap();
    let body: String = (0..12).map(|i| format!("{{\"text\":\"doc {i}\"}}\n")).collect();
    write_input(dir.path(), "a.jsonl", &body);

    let wide = config(
        dir.path(),
        "jsonl",
        "[parallel]\nenabled = true\nworkers = 6\n",
    );
    run(&wide, &ProgressContext::hidden()).unwrap().unwrap();
    assert_eq!(list_shards(&wide.cleaned_dir()).unwrap().len(), 4);

    let narrow = config(dir.path(), "jsonl", "");
    run(&narrow, &ProgressContext::hidden()).unwrap().unwrap();
    assert_eq!(list_shards(&narrow.tmp_dir()).unwrap().len(), 1);
    assert_eq!(list_shards(&narrow.cleaned_dir()).unwrap().len(), 1);
    assert_eq!(
        read_jsonl(&narrow.out_dir().join(CORPUS_FILE)).len(),
        12
    );
}

#[test]
fn manifest_describes_the_corpus() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "a.txt", "alpha");
    write_input(dir.path(), "b.txt", "beta");
    let config = config(dir.path(), "txt", "[debug]\nenabled = true\nsample_size = 1\n");
    let summary = run(&config, &ProgressContext::hidden()).unwrap().unwrap();
    assert_eq!(summary.debug.as_ref().map(|d| d.docs), Some(1));

    let manifest = RunManifest::read_from(&config.out_dir()).unwrap();
    assert!(config.out_dir().join(MANIFEST_FILE).exists());
    assert_eq!(manifest.source_tag, "fixture");
    assert_eq!(manifest.format, "text");
    assert_eq!(manifest.total_units, 2);
    assert_eq!(manifest.merge.records, 2);
    let bytes = std::fs::read(config.out_dir().join(CORPUS_FILE)).unwrap();
    assert_eq!(manifest.corpus_hash, blake3::hash(&bytes).to_hex().to_string());
}

#[test]
fn disabled_stages_skip_everything() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "a.txt", "alpha");
    let config = config(
        dir.path(),
        "txt",
        "[stages]\nfilter = false\nclean = false\n",
    );
    assert!(run(&config, &ProgressContext::hidden()).unwrap().is_none());
    assert!(!dir.path().join("clean").exists());
}

#[test]
fn unsupported_format_is_fatal_before_writing() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path(), "a.csv", "a,b");
    let config = config(dir.path(), "csv", "");
    let err = run(&config, &ProgressContext::hidden()).unwrap_err();
    assert!(err.to_string().contains("csv"));
    assert!(!dir.path().join("clean").exists());
}
