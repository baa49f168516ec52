use std::fs;

use faqrank_cli::{corpus_path, format_json, format_lexical, format_ranked, load_corpus};
use faqrank_core::config::Config;
use faqrank_core::types::{CorpusEntry, RankedResult};
use faqrank_core::Corpus;

fn entry() -> CorpusEntry {
    CorpusEntry::new("Do you know Rust?", "Yes, for five years.").with_skills(["Rust", "tokio"])
}

#[test]
fn ranked_output_lists_questions_and_optional_scores() {
    let e = entry();
    let results = vec![RankedResult { doc_id: 0, entry: &e, lexical_score: 1.0, semantic_score: 0.5, hybrid_score: 0.7 }];

    let plain = format_ranked("rust", &results, false);
    assert!(plain.starts_with("1 match for \"rust\""));
    assert!(plain.contains("1. Do you know Rust?"));
    assert!(plain.contains("skills: Rust, tokio"));
    assert!(!plain.contains("hybrid="));

    let scored = format_ranked("rust", &results, true);
    assert!(scored.contains("[hybrid=0.7000 bm25=1.0000 semantic=0.5000]"));

    assert_eq!(format_ranked("rust", &[], false), "No matches for \"rust\"\n");
}

#[test]
fn json_output_carries_query_and_entries() {
    let e = entry();
    let json = format_json("rust", &[&e]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["query"], "rust");
    assert_eq!(value["count"], 1);
    assert_eq!(value["results"][0]["question"], "Do you know Rust?");
}

#[test]
fn lexical_output_skips_unknown_ids() {
    let corpus = Corpus::new(vec![entry()]).unwrap();
    let out = format_lexical("rust", &[(0, 2.5), (7, 1.0)], &corpus);
    assert!(out.starts_with("1 match for \"rust\"\n"), "header counts printed rows: {out}");
    assert!(out.contains("1. score=2.5000 Do you know Rust?"));
    assert!(!out.contains("2. "));

    let leading_gap = format_lexical("rust", &[(9, 3.0), (0, 2.5)], &corpus);
    assert!(leading_gap.starts_with("1 match"));
    assert!(leading_gap.contains("1. score=2.5000"));

    let none = format_lexical("rust", &[(9, 3.0)], &corpus);
    assert_eq!(none, "No matches for \"rust\"\n");
}

#[test]
fn corpus_path_comes_from_config_unless_overridden() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[corpus]\npath = \"faqs\"\n").unwrap();
    fs::create_dir(dir.path().join("faqs")).unwrap();
    fs::write(dir.path().join("faqs/a.json"), r#"[{"question": "Q1?", "answer": "A1."}]"#).unwrap();

    let config = Config::load_from(dir.path()).unwrap();
    let settings = config.settings().unwrap();
    let path = corpus_path(&config, &settings, None);
    assert_eq!(path, dir.path().join("faqs"));
    assert_eq!(load_corpus(&path).unwrap().len(), 1);

    let other = dir.path().join("elsewhere.json");
    assert_eq!(corpus_path(&config, &settings, Some(&other)), other);
    let err = load_corpus(&other).unwrap_err();
    assert!(format!("{err:#}").contains("elsewhere.json"));
}
