//! Shared plumbing for the `faqrank` binaries: logging setup, corpus
//! location and result formatting.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use faqrank_core::config::{AppSettings, Config};
use faqrank_core::types::{CorpusEntry, RankedResult};
use faqrank_core::Corpus;

/// Install the global subscriber on stderr. `RUST_LOG` wins over
/// `default_filter`; `verbose` forces `debug`.
pub fn init_tracing(default_filter: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `--corpus` if given, otherwise `corpus.path` resolved against the config directory.
pub fn corpus_path(config: &Config, settings: &AppSettings, cli_override: Option<&Path>) -> PathBuf {
    match cli_override {
        Some(p) => p.to_path_buf(),
        None => config.resolve(&settings.corpus.path),
    }
}

pub fn load_corpus(path: &Path) -> Result<Corpus> {
    Corpus::load(path).with_context(|| format!("Failed to load corpus from {}", path.display()))
}

#[derive(Serialize)]
struct JsonOutput<'a, T: Serialize> {
    query: &'a str,
    count: usize,
    results: &'a [T],
}

pub fn format_json<T: Serialize>(query: &str, results: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonOutput { query, count: results.len(), results })?)
}

/// Numbered listing of question and answer; with `scores`, the three scores
/// of each hit on its first line.
pub fn format_ranked(query: &str, results: &[RankedResult<'_>], scores: bool) -> String {
    let mut out = header(query, results.len());
    for (i, r) in results.iter().enumerate() {
        if scores {
            let _ = writeln!(
                out,
                "{}. [hybrid={:.4} bm25={:.4} semantic={:.4}] {}",
                i + 1,
                r.hybrid_score,
                r.lexical_score,
                r.semantic_score,
                r.entry.question
            );
        } else {
            let _ = writeln!(out, "{}. {}", i + 1, r.entry.question);
        }
        push_answer(&mut out, r.entry);
    }
    out
}

/// Listing of raw BM25 hits. Ids missing from `corpus` are skipped and
/// not counted.
pub fn format_lexical(query: &str, hits: &[(usize, f32)], corpus: &Corpus) -> String {
    let rows: Vec<(f32, &CorpusEntry)> =
        hits.iter().filter_map(|&(doc_id, score)| Some((score, corpus.get(doc_id)?))).collect();
    let mut out = header(query, rows.len());
    for (i, (score, entry)) in rows.into_iter().enumerate() {
        let _ = writeln!(out, "{}. score={:.4} {}", i + 1, score, entry.question);
        push_answer(&mut out, entry);
    }
    out
}

fn header(query: &str, count: usize) -> String {
    match count {
        0 => format!("No matches for \"{query}\"\n"),
        1 => format!("1 match for \"{query}\"\n\n"),
        n => format!("{n} matches for \"{query}\"\n\n"),
    }
}

fn push_answer(out: &mut String, entry: &CorpusEntry) {
    let _ = writeln!(out, "   {}", entry.answer);
    if !entry.skills.is_empty() {
        let _ = writeln!(out, "   skills: {}", entry.skills.join(", "));
    }
}
