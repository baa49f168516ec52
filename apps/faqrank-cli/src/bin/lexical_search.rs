//! `faqrank-lexical`: BM25-only search, no embedding model is loaded.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use faqrank_cli::{corpus_path, format_json, format_lexical, init_tracing, load_corpus};
use faqrank_core::config::Config;
use faqrank_text::LexicalIndex;

#[derive(Parser)]
#[command(name = "faqrank-lexical", version, about = "BM25 search over a Q&A corpus")]
struct Cli {
    /// The query text
    query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value = "10")]
    limit: usize,

    /// Corpus file or directory (default: corpus.path from config)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(serde::Serialize)]
struct Hit<'a> {
    doc_id: usize,
    score: f32,
    question: &'a str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let settings = config.settings()?;
    init_tracing(&settings.logging.filter, cli.verbose);

    let corpus = load_corpus(&corpus_path(&config, &settings, cli.corpus.as_deref()))?;
    let ranking = settings.ranking;
    let mut index = LexicalIndex::new();
    index.build(corpus.entries(), ranking.field_weights)?;
    let hits = index.search_with(&cli.query, cli.limit, &ranking.field_weights, &ranking.bm25_params)?;

    if cli.json {
        let rows: Vec<Hit<'_>> = hits
            .iter()
            .filter_map(|&(doc_id, score)| corpus.get(doc_id).map(|e| Hit { doc_id, score, question: &e.question }))
            .collect();
        println!("{}", format_json(&cli.query, &rows)?);
    } else {
        print!("{}", format_lexical(&cli.query, &hits, &corpus));
    }
    Ok(())
}
