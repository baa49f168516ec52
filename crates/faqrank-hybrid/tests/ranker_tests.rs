use faqrank_core::config::RankerSettings;
use faqrank_core::traits::Embedder;
use faqrank_core::types::{Bm25Params, CorpusEntry, RankingConfig};
use faqrank_core::{Corpus, Error};
use faqrank_embed::{EmbeddingService, FakeEmbedder};
use faqrank_hybrid::HybridRanker;

const FAQ_JSON: &str = include_str!("fixtures/faq.json");

fn corpus() -> Corpus {
    Corpus::from_json_str(FAQ_JSON).expect("fixture corpus")
}

fn fake_service() -> EmbeddingService {
    EmbeddingService::with_embedder(Box::new(FakeEmbedder::new(384)))
}

fn ranker() -> HybridRanker {
    let mut ranker = HybridRanker::new(fake_service());
    ranker.initialize(corpus()).expect("initialize");
    ranker
}

fn ids(entries: &[&CorpusEntry]) -> Vec<u64> {
    entries.iter().map(|e| e.extra["id"].as_u64().expect("id")).collect()
}

fn top_k(k: usize) -> RankingConfig {
    RankingConfig::default().with_top_k(k)
}

/// Fails on any text containing "boom".
struct TripwireEmbedder(FakeEmbedder);

impl Embedder for TripwireEmbedder {
    fn dim(&self) -> usize { self.0.dim() }
    fn max_len(&self) -> usize { self.0.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("boom")) {
            anyhow::bail!("tripwire hit");
        }
        self.0.embed_batch(texts)
    }
}

#[test]
fn initialize_reports_status() {
    let ranker = ranker();
    let status = ranker.status();
    assert!(status.initialized);
    assert_eq!(status.entries, 6);
    assert!(status.index.built);
    assert_eq!(status.index.documents, 6);
    assert_eq!(status.cache.size, 6, "one cached embedding per entry");
    assert!(status.cache.model_loaded);
}

#[test]
fn rank_before_initialize_fails() {
    let ranker = HybridRanker::new(fake_service());
    let err = ranker.rank("javascript", &RankingConfig::default()).unwrap_err();
    assert!(matches!(err, Error::NotInitialized(_)), "got {err:?}");
    assert!(!ranker.status().initialized);
}

#[test]
fn keyword_queries_rank_expected_entry_first() {
    let ranker = ranker();
    for (query, expected) in [
        ("JavaScript programming", 1),
        ("Python data science", 2),
        ("database MongoDB MySQL", 4),
        ("machine learning AI", 5),
        ("coding with JavaScript", 1),
    ] {
        let results = ranker.rank(query, &top_k(3)).expect("rank");
        assert_eq!(ids(&results)[0], expected, "query {query:?}");
    }
}

#[test]
fn exact_question_ranks_its_entry_first() {
    let ranker = ranker();
    let corpus = corpus();
    for entry in corpus.iter() {
        let results = ranker.rank(&entry.question, &top_k(3)).expect("rank");
        assert_eq!(results[0], entry, "query {:?}", entry.question);
    }
}

#[test]
fn result_count_is_bounded() {
    let ranker = ranker();
    assert!(ranker.rank("programming", &top_k(3)).unwrap().len() <= 3);
    assert!(ranker.rank("experience", &top_k(100)).unwrap().len() <= 6);
    assert_eq!(ranker.rank("JavaScript", &top_k(1)).unwrap().len(), 1);
    assert!(ranker.rank("JavaScript", &top_k(0)).unwrap().is_empty());
}

#[test]
fn case_and_stop_words_do_not_change_the_winner() {
    let ranker = ranker();
    let upper = ranker.rank("JAVASCRIPT", &top_k(5)).unwrap();
    let lower = ranker.rank("javascript", &top_k(5)).unwrap();
    assert_eq!(upper, lower);

    let plain = ranker.rank("JavaScript programming", &top_k(5)).unwrap();
    let noisy = ranker.rank("the JavaScript programming is a", &top_k(5)).unwrap();
    assert_eq!(plain[0], noisy[0]);
}

#[test]
fn lexical_only_weights_reproduce_bm25_order() {
    let ranker = ranker();
    let index = ranker.lexical_index().expect("index");
    let config = top_k(5).with_weights(1.0, 0.0);
    for query in ["experience", "web development React", "machine learning AI"] {
        let lexical: Vec<usize> = index.search(query, 5).unwrap().iter().map(|&(id, _)| id).collect();
        let hybrid: Vec<usize> = ranker.rank_with_scores(query, &config).unwrap().iter().map(|r| r.doc_id).collect();
        assert_eq!(hybrid, lexical, "query {query:?}");
    }
}

#[test]
fn scores_are_blended_and_sorted() {
    let ranker = ranker();
    let config = top_k(5).with_weights(2.0, 3.0);
    let results = ranker.rank_with_scores("experience", &config).unwrap();
    assert_eq!(results.len(), 3);
    assert!((results.iter().map(|r| r.lexical_score).fold(0.0f32, f32::max) - 1.0).abs() < 1e-6);
    for r in &results {
        assert!((0.0..=1.0).contains(&r.lexical_score));
        assert!((-1.0..=1.0).contains(&r.semantic_score));
        let expected = 2.0 * r.lexical_score + 3.0 * r.semantic_score;
        assert!((r.hybrid_score - expected).abs() < 1e-5);
    }
    for pair in results.windows(2) {
        assert!(pair[0].hybrid_score >= pair[1].hybrid_score);
    }
}

#[test]
fn unmatched_query_returns_nothing_without_embedding() {
    let ranker = ranker();
    let before = ranker.embeddings().stats().size;
    assert!(ranker.rank("quantum astrophysics", &top_k(5)).unwrap().is_empty());
    assert!(ranker.rank("the a is of", &top_k(5)).unwrap().is_empty());
    assert_eq!(ranker.embeddings().stats().size, before);

    ranker.rank("JavaScript", &top_k(5)).unwrap();
    assert_eq!(ranker.embeddings().stats().size, before + 1);
}

#[test]
fn empty_corpus_ranks_nothing() {
    let mut ranker = HybridRanker::new(fake_service());
    ranker.initialize(Corpus::empty()).expect("initialize");
    assert!(ranker.status().initialized);
    assert!(ranker.rank("anything", &RankingConfig::default()).unwrap().is_empty());
}

#[test]
fn repeated_ranking_is_deterministic() {
    let ranker = ranker();
    let config = RankingConfig::default();
    let first = ranker.rank_with_scores("web development React", &config).unwrap();
    for _ in 0..5 {
        let again = ranker.rank_with_scores("web development React", &config).unwrap();
        assert_eq!(first.len(), again.len());
        for (a, b) in first.iter().zip(&again) {
            assert_eq!(a.doc_id, b.doc_id);
            assert_eq!(a.hybrid_score, b.hybrid_score);
        }
    }
}

#[test]
fn concurrent_queries_match_sequential_results() {
    let ranker = ranker();
    let config = RankingConfig::default();
    let queries = ["JavaScript", "Python data", "database", "machine learning", "React web", "problem solving"];
    let expected: Vec<Vec<&CorpusEntry>> = queries.iter().map(|q| ranker.rank(q, &config).unwrap()).collect();
    ranker.embeddings().clear_cache();

    std::thread::scope(|s| {
        let handles: Vec<_> = queries
            .iter()
            .map(|q| {
                let ranker = &ranker;
                let config = &config;
                s.spawn(move || ranker.rank(q, config).unwrap())
            })
            .collect();
        for (handle, want) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().expect("thread"), want);
        }
    });
}

#[test]
fn shortlist_size_limits_candidates() {
    let mut ranker = HybridRanker::with_settings(fake_service(), RankerSettings { shortlist_size: 1 });
    ranker.initialize(corpus()).unwrap();
    let results = ranker.rank("experience", &top_k(5)).unwrap();
    assert_eq!(ids(&results), vec![4]);
}

#[test]
fn invalid_config_is_rejected() {
    let ranker = ranker();
    let config = RankingConfig::default().with_bm25_params(Bm25Params { k1: 1.2, b: 1.5, k: 1.0 });
    assert!(matches!(ranker.rank("javascript", &config), Err(Error::InvalidConfig(_))));
    let config = RankingConfig::default().with_weights(f32::NAN, 0.5);
    assert!(matches!(ranker.rank("javascript", &config), Err(Error::InvalidConfig(_))));
}

#[test]
fn embedder_load_failure_surfaces_at_initialize() {
    let service = EmbeddingService::new(384, || anyhow::bail!("no model on disk"));
    let mut ranker = HybridRanker::new(service);
    let err = ranker.initialize(corpus()).unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)), "got {err:?}");
    assert!(!ranker.is_initialized());
}

#[test]
fn query_embedding_failure_is_not_hidden() {
    let service = EmbeddingService::with_embedder(Box::new(TripwireEmbedder(FakeEmbedder::new(384))));
    let mut ranker = HybridRanker::new(service);
    ranker.initialize(corpus()).unwrap();
    let err = ranker.rank("javascript boom", &top_k(3)).unwrap_err();
    assert!(matches!(err, Error::EmbeddingUnavailable(_)), "got {err:?}");
}

#[test]
fn reset_and_reinitialize() {
    let mut ranker = ranker();
    ranker.reset();
    assert!(!ranker.status().initialized);
    assert_eq!(ranker.status().cache.size, 6, "cache survives reset");
    assert!(matches!(ranker.rank("javascript", &top_k(3)), Err(Error::NotInitialized(_))));

    let replacement = Corpus::new(vec![CorpusEntry::new("Do you write Rust?", "Every day.").with_skills(["Rust"])]).unwrap();
    ranker.initialize(replacement).unwrap();
    assert_eq!(ranker.status().entries, 1);
    assert!(ranker.rank("javascript", &top_k(3)).unwrap().is_empty());
    assert_eq!(ranker.rank("rust", &top_k(3)).unwrap()[0].question, "Do you write Rust?");
}

#[test]
fn equal_hybrid_scores_keep_corpus_order() {
    // Same bag of words, so identical embeddings, but entry 1 wins lexically.
    let corpus = Corpus::new(vec![
        CorpusEntry::new("Tips about Rust", "rust"),
        CorpusEntry::new("rust", "Tips about Rust"),
        CorpusEntry::new("Do you use Python?", "Daily"),
    ])
    .unwrap();
    let mut ranker = HybridRanker::new(fake_service());
    ranker.initialize(corpus).unwrap();

    let lexical: Vec<usize> =
        ranker.lexical_index().unwrap().search("rust", 5).unwrap().iter().map(|&(id, _)| id).collect();
    assert_eq!(lexical, vec![1, 0]);

    let results = ranker.rank_with_scores("rust", &top_k(5).with_weights(0.0, 1.0)).unwrap();
    assert_eq!(results[0].hybrid_score, results[1].hybrid_score);
    let order: Vec<usize> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(order, vec![0, 1]);
}
