use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use faqrank_core::error::Result;
use faqrank_core::types::{CorpusEntry, DocId, Embedding};
use faqrank_embed::EmbeddingService;

const BATCH_SIZE: usize = 32;

/// One precomputed embedding per corpus entry, indexed by document id.
#[derive(Debug, Clone, Default)]
pub struct EntryVectors {
    vectors: Vec<Embedding>,
}

impl EntryVectors {
    /// Embed `entry.embedding_text()` for every entry, in batches. With
    /// `progress` a bar is drawn on stderr.
    pub fn build(entries: &[CorpusEntry], service: &EmbeddingService, progress: bool) -> Result<Self> {
        let start = Instant::now();
        let pb = if progress { ProgressBar::new(entries.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(entries.len());
        for batch in entries.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(CorpusEntry::embedding_text).collect();
            vectors.extend(service.embed_batch(&texts)?);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        info!(entries = vectors.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Entry embeddings computed");
        Ok(Self { vectors })
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Embedding> {
        self.vectors.get(doc_id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
