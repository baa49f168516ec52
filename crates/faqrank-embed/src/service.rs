//! Lazily-initialized, memoizing front end over an [`Embedder`].
//!
//! The embedder is created on first use through a loader closure, exactly
//! once per service even under concurrent first calls: late callers block on
//! the [`OnceCell`] until the winner finishes. A failed load is not cached,
//! so the next call tries again.
//!
//! Results are L2-normalized and cached by the exact input text. The cache
//! only grows (first insert for a key wins) until [`EmbeddingService::clear_cache`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use faqrank_core::config::EmbeddingSettings;
use faqrank_core::error::{Error, Result};
use faqrank_core::traits::Embedder;
use faqrank_core::types::{CacheStats, Embedding};

use crate::get_default_embedder;

type Loader = Box<dyn Fn() -> anyhow::Result<Box<dyn Embedder>> + Send + Sync>;

pub struct EmbeddingService {
    loader: Loader,
    model: OnceCell<Box<dyn Embedder>>,
    cache: RwLock<HashMap<String, Embedding>>,
    dim: usize,
}

impl EmbeddingService {
    /// `loader` runs at most once successfully; it must produce an embedder of dimension `dim`.
    pub fn new<F>(dim: usize, loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        Self { loader: Box::new(loader), model: OnceCell::new(), cache: RwLock::new(HashMap::new()), dim }
    }

    /// Defer to [`get_default_embedder`] on first use.
    pub fn from_settings(settings: EmbeddingSettings) -> Self {
        let dim = settings.dimension;
        Self::new(dim, move || get_default_embedder(&settings))
    }

    /// Wrap an embedder that is already loaded.
    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        let dim = embedder.dim();
        Self {
            loader: Box::new(|| Err(anyhow::anyhow!("embedder was supplied preloaded"))),
            model: OnceCell::with_value(embedder),
            cache: RwLock::new(HashMap::new()),
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Normalized embedding of `text`, from the cache when present.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(hit) = self.cached(text) {
            return Ok(hit);
        }
        let raw = self.model()?.embed_text(text).map_err(unavailable)?;
        let vector = self.finish(raw)?;
        Ok(self.insert(text, vector))
    }

    /// Embed many texts, sending only distinct cache misses to the model in one batch.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut misses: Vec<String> = Vec::new();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            for text in texts {
                if !cache.contains_key(text) && !misses.contains(text) {
                    misses.push(text.clone());
                }
            }
        }

        let mut fresh: HashMap<&str, Embedding> = HashMap::with_capacity(misses.len());
        if !misses.is_empty() {
            let start = Instant::now();
            let raw = self.model()?.embed_batch(&misses).map_err(unavailable)?;
            if raw.len() != misses.len() {
                return Err(Error::EmbeddingUnavailable(format!(
                    "embedder returned {} vectors for {} texts",
                    raw.len(),
                    misses.len()
                )));
            }
            for (text, vector) in misses.iter().zip(raw) {
                let vector = self.finish(vector)?;
                fresh.insert(text.as_str(), self.insert(text, vector));
            }
            debug!(texts = misses.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Embedded batch");
        }

        texts
            .iter()
            .map(|text| match fresh.get(text.as_str()) {
                Some(v) => Ok(v.clone()),
                None => self.cached(text).map_or_else(|| self.embed(text), Ok),
            })
            .collect()
    }

    /// Warm the cache for `texts`.
    pub fn precompute(&self, texts: &[String]) -> Result<()> {
        self.embed_batch(texts).map(|_| ())
    }

    pub fn is_cached(&self, text: &str) -> bool {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).contains_key(text)
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        debug!("Embedding cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.read().unwrap_or_else(PoisonError::into_inner).len(),
            model_loaded: self.model.get().is_some(),
        }
    }

    fn model(&self) -> Result<&dyn Embedder> {
        self.model
            .get_or_try_init(|| {
                let start = Instant::now();
                info!("Loading embedding model (first use)");
                let embedder = (self.loader)()?;
                info!(dim = embedder.dim(), elapsed_ms = start.elapsed().as_millis() as u64, "Embedding model ready");
                Ok(embedder)
            })
            .map(|m| m.as_ref())
            .map_err(unavailable)
    }

    fn cached(&self, text: &str) -> Option<Embedding> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).get(text).cloned()
    }

    /// Existing entries are never replaced; a concurrent duplicate computation
    /// gets the vector that was stored first.
    fn insert(&self, text: &str, vector: Embedding) -> Embedding {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.entry(text.to_string()).or_insert(vector).clone()
    }

    fn finish(&self, mut raw: Vec<f32>) -> Result<Embedding> {
        if raw.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: raw.len() });
        }
        l2_normalize(&mut raw);
        Ok(raw.into())
    }
}

/// Scale to unit length; the zero vector stays zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn unavailable(e: anyhow::Error) -> Error {
    Error::EmbeddingUnavailable(format!("{e:#}"))
}
