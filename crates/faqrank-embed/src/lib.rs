use anyhow::{Result, anyhow, ensure};
use std::path::{Path, PathBuf};
use tracing::info;

use faqrank_core::config::{expand_path, EmbeddingSettings};
use faqrank_core::traits::Embedder;

mod device;
mod fake;
mod model;
mod pool;
mod service;
mod tokenize;

pub use device::select_device;
pub use fake::FakeEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;
pub use service::{l2_normalize, EmbeddingService};
pub use tokenize::tokenize_on_device;

/// Directory name of the bundled sentence model.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// The fake embedder when `use_fake` or `APP_USE_FAKE_EMBEDDINGS` is set,
/// otherwise the sentence model from [`resolve_model_dir`].
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        info!(dim = settings.dimension, "Using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.dimension)));
    }
    let dir = resolve_model_dir(settings)?;
    let model = EmbeddingModel::load(&dir, settings.max_len)?;
    ensure!(
        model.dim() == settings.dimension,
        "model in {} has dimension {}, configured embedding.dimension is {}",
        dir.display(),
        model.dim(),
        settings.dimension
    );
    Ok(Box::new(model))
}

/// First existing directory of: `embedding.model_dir`, `APP_MODEL_DIR`,
/// `MODEL_DIR`, `models/all-MiniLM-L6-v2`, `../models/all-MiniLM-L6-v2`.
pub fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = &settings.model_dir {
        let p = expand_path(dir);
        if p.exists() { info!(dir = %p.display(), "Using embedding.model_dir"); return Ok(p); }
        return Err(anyhow!("embedding.model_dir {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { info!(dir = %p.display(), "Using {}", var); return Ok(p); }
        }
    }
    let local = Path::new("models").join(DEFAULT_MODEL_NAME);
    if local.exists() { info!(dir = %local.display(), "Using model dir"); return Ok(local); }
    let parent = Path::new("../models").join(DEFAULT_MODEL_NAME);
    if parent.exists() { info!(dir = %parent.display(), "Using model dir"); return Ok(parent); }
    Err(anyhow!("Could not locate the {} model directory", DEFAULT_MODEL_NAME))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}
