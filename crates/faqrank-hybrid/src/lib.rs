//! Hybrid lexical + semantic ranking over a small Q&A corpus.
//!
//! BM25 picks a shortlist, the embedding model re-scores it, and the two
//! signals are blended with the weights of the request's [`RankingConfig`].

use std::time::Instant;

use tracing::{debug, info};

use faqrank_core::config::{EmbeddingSettings, RankerSettings};
use faqrank_core::error::{Error, Result};
use faqrank_core::types::{CorpusEntry, DocId, FieldWeights, RankedResult, RankerStatus, RankingConfig};
use faqrank_core::Corpus;
use faqrank_embed::EmbeddingService;
use faqrank_text::LexicalIndex;
use faqrank_vector::{cosine_similarity, EntryVectors};

struct RankerState {
    corpus: Corpus,
    index: LexicalIndex,
    vectors: EntryVectors,
}

/// Owns the corpus, its lexical index, the per-entry embeddings and the
/// embedding service.
///
/// `initialize` and `reset` need `&mut self`; `rank` only needs `&self`, so
/// a built ranker can be shared across threads by reference.
pub struct HybridRanker {
    embeddings: EmbeddingService,
    settings: RankerSettings,
    show_progress: bool,
    state: Option<RankerState>,
}

impl HybridRanker {
    pub fn new(embeddings: EmbeddingService) -> Self {
        Self::with_settings(embeddings, RankerSettings::default())
    }

    pub fn with_settings(embeddings: EmbeddingService, settings: RankerSettings) -> Self {
        Self { embeddings, settings, show_progress: false, state: None }
    }

    /// Ranker whose embedder is loaded on first use as configured.
    pub fn from_settings(embedding: EmbeddingSettings, settings: RankerSettings) -> Self {
        Self::with_settings(EmbeddingService::from_settings(embedding), settings)
    }

    /// Draw a progress bar while entry embeddings are computed.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Index `corpus` and embed every entry. Replaces any previous corpus;
    /// on error the ranker is left uninitialized.
    pub fn initialize(&mut self, corpus: Corpus) -> Result<()> {
        let start = Instant::now();
        self.state = None;

        let mut index = LexicalIndex::new();
        index.build(corpus.entries(), FieldWeights::default())?;
        let vectors = EntryVectors::build(corpus.entries(), &self.embeddings, self.show_progress)?;

        info!(entries = corpus.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Hybrid ranker initialized");
        self.state = Some(RankerState { corpus, index, vectors });
        Ok(())
    }

    /// The `config.top_k` best entries for `query`, best first.
    pub fn rank(&self, query: &str, config: &RankingConfig) -> Result<Vec<&CorpusEntry>> {
        Ok(self.rank_with_scores(query, config)?.into_iter().map(|r| r.entry).collect())
    }

    /// Like [`rank`](Self::rank), keeping the per-entry scores.
    pub fn rank_with_scores(&self, query: &str, config: &RankingConfig) -> Result<Vec<RankedResult<'_>>> {
        config.validate()?;
        let state = self.state()?;
        let start = Instant::now();

        let candidates = state.index.search_with(
            query,
            self.settings.shortlist_size,
            &config.field_weights,
            &config.bm25_params,
        )?;
        let lexical_elapsed = start.elapsed();
        if candidates.is_empty() || config.top_k == 0 {
            debug!(query, candidates = candidates.len(), "No lexical candidates");
            return Ok(Vec::new());
        }

        let max = candidates.iter().map(|&(_, s)| s).fold(0.0f32, f32::max);
        let norm = if max > 0.0 { max } else { 1.0 };

        let query_vector = self.embeddings.embed(query)?;
        let embed_elapsed = start.elapsed() - lexical_elapsed;

        let mut results = Vec::with_capacity(candidates.len());
        for (doc_id, raw) in candidates {
            let (entry, vector) = state.lookup(doc_id)?;
            let lexical_score = raw / norm;
            let semantic_score = cosine_similarity(&query_vector, vector)?;
            results.push(RankedResult {
                doc_id,
                entry,
                lexical_score,
                semantic_score,
                hybrid_score: config.bm25_weight * lexical_score + config.embedding_weight * semantic_score,
            });
        }
        results.sort_by(|a, b| b.hybrid_score.total_cmp(&a.hybrid_score).then(a.doc_id.cmp(&b.doc_id)));
        results.truncate(config.top_k);

        debug!(
            query,
            lexical_ms = lexical_elapsed.as_millis() as u64,
            embed_ms = embed_elapsed.as_millis() as u64,
            total_ms = start.elapsed().as_millis() as u64,
            results = results.len(),
            "Ranked query"
        );
        for (pos, r) in results.iter().take(3).enumerate() {
            debug!(
                rank = pos + 1,
                doc_id = r.doc_id,
                question = %r.entry.question,
                hybrid = r.hybrid_score,
                lexical = r.lexical_score,
                semantic = r.semantic_score,
                "Top result"
            );
        }
        Ok(results)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn corpus(&self) -> Option<&Corpus> {
        self.state.as_ref().map(|s| &s.corpus)
    }

    /// The lexical index, for callers that want BM25 scores alone.
    pub fn lexical_index(&self) -> Option<&LexicalIndex> {
        self.state.as_ref().map(|s| &s.index)
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    pub fn status(&self) -> RankerStatus {
        let cache = self.embeddings.stats();
        match &self.state {
            Some(state) => RankerStatus {
                initialized: true,
                entries: state.corpus.len(),
                index: state.index.status(),
                cache,
            },
            None => RankerStatus { cache, ..Default::default() },
        }
    }

    /// Forget the corpus and index. The embedding cache and model survive.
    pub fn reset(&mut self) {
        self.state = None;
        info!("Hybrid ranker reset");
    }

    fn state(&self) -> Result<&RankerState> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::NotInitialized("hybrid ranker has no corpus; call initialize first".to_string()))
    }
}

impl RankerState {
    fn lookup(&self, doc_id: DocId) -> Result<(&CorpusEntry, &[f32])> {
        match (self.corpus.get(doc_id), self.vectors.get(doc_id)) {
            (Some(entry), Some(vector)) => Ok((entry, &vector[..])),
            _ => Err(Error::NotInitialized(format!("no entry or embedding for document {doc_id}"))),
        }
    }
}
