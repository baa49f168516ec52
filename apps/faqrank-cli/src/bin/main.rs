//! `faqrank`: hybrid BM25 + embedding ranking over a Q&A corpus.
//!
//! ```bash
//! faqrank query "what databases do you know" --top-k 3
//! faqrank query "python" --scores --bm25-weight 0.7 --embedding-weight 0.3
//! faqrank status --json
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use faqrank_cli::{corpus_path, format_json, format_ranked, init_tracing, load_corpus};
use faqrank_core::config::Config;
use faqrank_hybrid::HybridRanker;

#[derive(Parser)]
#[command(name = "faqrank", version, about)]
struct Cli {
    /// Corpus file or directory (default: corpus.path from config)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Directory holding config.toml (default: current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank corpus entries against a query
    Query {
        /// The query text
        text: String,

        /// Number of entries to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Weight of the normalized BM25 score
        #[arg(long)]
        bm25_weight: Option<f32>,

        /// Weight of the cosine similarity
        #[arg(long)]
        embedding_weight: Option<f32>,

        /// Print the per-entry scores
        #[arg(long)]
        scores: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load the corpus and report index and cache state
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config_dir {
        Some(dir) => Config::load_from(dir)?,
        None => Config::load()?,
    };
    let settings = config.settings()?;
    init_tracing(&settings.logging.filter, cli.verbose);

    let path = corpus_path(&config, &settings, cli.corpus.as_deref());
    let corpus = load_corpus(&path)?;

    let start = Instant::now();
    let mut ranker = HybridRanker::from_settings(settings.embedding.clone(), settings.ranker.clone())
        .with_progress(corpus.len() > 100);
    ranker.initialize(corpus)?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, corpus = %path.display(), "Ready");

    match cli.command {
        Command::Query { text, top_k, bm25_weight, embedding_weight, scores, json } => {
            let mut ranking = settings.ranking;
            if let Some(k) = top_k { ranking.top_k = k; }
            if let Some(w) = bm25_weight { ranking.bm25_weight = w; }
            if let Some(w) = embedding_weight { ranking.embedding_weight = w; }

            let results = ranker.rank_with_scores(&text, &ranking)?;
            if json {
                if scores {
                    println!("{}", format_json(&text, &results)?);
                } else {
                    let entries: Vec<_> = results.iter().map(|r| r.entry).collect();
                    println!("{}", format_json(&text, &entries)?);
                }
            } else {
                print!("{}", format_ranked(&text, &results, scores));
            }
        }
        Command::Status { json } => {
            let status = ranker.status();
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("corpus:      {}", path.display());
                println!("entries:     {}", status.entries);
                println!("index:       {} documents, {} terms", status.index.documents, status.index.terms);
                println!("embeddings:  {} cached (dim {})", status.cache.size, ranker.embeddings().dim());
                println!("model:       {}", if status.cache.model_loaded { "loaded" } else { "not loaded" });
            }
        }
    }
    Ok(())
}
