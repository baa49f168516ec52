use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info};

use faqrank_core::error::{Error, Result};
use faqrank_core::types::{Bm25Params, CorpusEntry, DocId, Field, FieldWeights, IndexStatus};

use crate::prep::prepare;

/// A single entry in a term's postings list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    /// Number of times the term appears in this field of the document.
    pub term_frequency: u32,
}

/// Per-field token sequences of one corpus entry, as produced by [`prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedDocument {
    fields: [Vec<String>; 3],
}

impl PreparedDocument {
    pub fn from_entry(entry: &CorpusEntry) -> Self {
        Self { fields: Field::ALL.map(|f| prepare(&entry.field_text(f))) }
    }

    pub fn tokens(&self, field: Field) -> &[String] {
        &self.fields[field.index()]
    }
}

/// Postings and length statistics of one field across the whole corpus.
#[derive(Debug, Default)]
struct FieldIndex {
    postings: HashMap<String, Vec<Posting>>,
    /// Indexed by document id.
    doc_lengths: Vec<u32>,
    total_length: u64,
}

impl FieldIndex {
    fn add(&mut self, doc_id: DocId, tokens: &[String]) {
        self.doc_lengths.push(tokens.len() as u32);
        self.total_length += tokens.len() as u64;

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in tokens {
            *tf_map.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, tf) in tf_map {
            self.postings
                .entry(term.to_string())
                .or_default()
                .push(Posting { doc_id, term_frequency: tf });
        }
    }

    fn average_length(&self) -> f32 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.total_length as f32 / self.doc_lengths.len() as f32
    }
}

#[derive(Debug)]
struct IndexData {
    fields: [FieldIndex; 3],
    avg_lengths: [f32; 3],
    doc_count: usize,
    vocabulary: usize,
    field_weights: FieldWeights,
}

/// In-memory, per-field BM25 index over a corpus.
///
/// Starts unbuilt; [`LexicalIndex::build`] replaces the whole state at once,
/// so a caller only ever sees no index or a complete one. Reads after build
/// need no synchronization.
#[derive(Debug, Default)]
pub struct LexicalIndex {
    inner: Option<IndexData>,
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every entry. `field_weights` become the defaults for [`search`](Self::search).
    /// Invalid weights are rejected and leave the current index untouched.
    pub fn build(&mut self, entries: &[CorpusEntry], field_weights: FieldWeights) -> Result<()> {
        field_weights.validate()?;
        let start = Instant::now();
        let mut fields: [FieldIndex; 3] = Default::default();
        for (doc_id, entry) in entries.iter().enumerate() {
            let prepared = PreparedDocument::from_entry(entry);
            for field in Field::ALL {
                fields[field.index()].add(doc_id, prepared.tokens(field));
            }
        }
        let vocabulary = fields
            .iter()
            .flat_map(|f| f.postings.keys())
            .collect::<HashSet<_>>()
            .len();
        let avg_lengths = [0, 1, 2].map(|i| fields[i].average_length());

        self.inner = Some(IndexData { fields, avg_lengths, doc_count: entries.len(), vocabulary, field_weights });
        info!(documents = entries.len(), terms = vocabulary, elapsed_ms = start.elapsed().as_millis() as u64, "Lexical index built");
        Ok(())
    }

    /// Search with the build-time field weights and default BM25 parameters.
    pub fn search(&self, query: &str, top_n: usize) -> Result<Vec<(DocId, f32)>> {
        let weights = self.data()?.field_weights;
        self.search_with(query, top_n, &weights, &Bm25Params::default())
    }

    /// Up to `top_n` `(doc id, score)` pairs, best first; equal scores keep
    /// corpus order. Only documents sharing at least one term with the query
    /// are returned. Weights and parameters are validated first, so every
    /// score is finite and non-negative.
    pub fn search_with(
        &self,
        query: &str,
        top_n: usize,
        weights: &FieldWeights,
        params: &Bm25Params,
    ) -> Result<Vec<(DocId, f32)>> {
        weights.validate()?;
        params.validate()?;
        let data = self.data()?;
        if top_n == 0 || data.doc_count == 0 {
            return Ok(Vec::new());
        }
        let query_terms = term_counts(&prepare(query));
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let n = data.doc_count as f32;
        let (k1, b, k) = (params.k1, params.b, params.k);
        let mut scores = vec![0.0f32; data.doc_count];
        let mut matched = vec![false; data.doc_count];

        for (term, qtf) in &query_terms {
            let qtf = *qtf as f32;
            let query_weight = qtf * (k + 1.0) / (qtf + k);
            for field in Field::ALL {
                let weight = weights.weight(field);
                if weight == 0.0 {
                    continue;
                }
                let field_index = &data.fields[field.index()];
                let Some(postings) = field_index.postings.get(term.as_str()) else { continue };
                let df = postings.len() as f32;
                // IDF: ln((N - df + 0.5) / (df + 0.5) + 1), always positive
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                let avgdl = data.avg_lengths[field.index()];

                for posting in postings {
                    let dl = field_index.doc_lengths[posting.doc_id] as f32;
                    let tf = posting.term_frequency as f32;
                    let length_ratio = if avgdl > 0.0 { dl / avgdl } else { 1.0 };
                    let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
                    scores[posting.doc_id] += weight * idf * tf_norm * query_weight;
                    matched[posting.doc_id] = true;
                }
            }
        }

        let mut hits: Vec<(DocId, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|&(id, _)| matched[id])
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.truncate(top_n);
        debug!(query, terms = query_terms.len(), hits = hits.len(), "Lexical search");
        Ok(hits)
    }

    pub fn is_built(&self) -> bool {
        self.inner.is_some()
    }

    pub fn status(&self) -> IndexStatus {
        match &self.inner {
            Some(data) => IndexStatus { built: true, documents: data.doc_count, terms: data.vocabulary },
            None => IndexStatus::default(),
        }
    }

    /// Drop the index; searches fail until the next build.
    pub fn reset(&mut self) {
        self.inner = None;
        debug!("Lexical index reset");
    }

    fn data(&self) -> Result<&IndexData> {
        self.inner
            .as_ref()
            .ok_or_else(|| Error::NotInitialized("lexical index has not been built".to_string()))
    }
}

/// Distinct terms with their frequency, in order of first appearance.
fn term_counts(tokens: &[String]) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for token in tokens {
        match counts.iter_mut().find(|(t, _)| t == token) {
            Some((_, c)) => *c += 1,
            None => counts.push((token.clone(), 1)),
        }
    }
    counts
}
