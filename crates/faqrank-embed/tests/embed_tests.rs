use faqrank_core::config::EmbeddingSettings;
use faqrank_core::traits::Embedder;
use faqrank_embed::{get_default_embedder, resolve_model_dir, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, ..Default::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows settings");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_relates_texts_sharing_words() {
    let e = FakeEmbedder::new(64);
    let base = e.embed_text("Do you know Python?").unwrap();
    let related = e.embed_text("python experience").unwrap();
    let same = e.embed_text("do YOU know python").unwrap();
    assert!(cosine(&base, &related) > 0.0);
    assert!((cosine(&base, &same) - 1.0).abs() < 1e-5, "case and edge punctuation are ignored");
}

#[test]
fn fake_embedder_maps_empty_text_to_zero() {
    let e = FakeEmbedder::new(16);
    let v = e.embed_text("  ?! ").unwrap();
    assert_eq!(v.len(), 16);
    assert!(v.iter().all(|&x| x == 0.0));
}

#[test]
fn missing_configured_model_dir_is_an_error() {
    let settings = EmbeddingSettings {
        model_dir: Some("/definitely/not/a/model/dir".to_string()),
        ..Default::default()
    };
    let err = resolve_model_dir(&settings).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");
}

#[test]
fn configured_model_dir_wins() {
    let dir = tempfile::tempdir().unwrap();
    let settings = EmbeddingSettings {
        model_dir: Some(dir.path().display().to_string()),
        ..Default::default()
    };
    assert_eq!(resolve_model_dir(&settings).unwrap(), dir.path());
}
