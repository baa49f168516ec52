//! Cosine similarity and the per-entry embedding store.

pub mod similarity;
pub mod store;

pub use similarity::cosine_similarity;
pub use store::EntryVectors;
