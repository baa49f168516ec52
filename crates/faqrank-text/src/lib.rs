//! faqrank-text
//!
//! Text preparation and the in-memory BM25 index used for the lexical half
//! of hybrid ranking.

pub mod index;
pub mod prep;

pub use index::{LexicalIndex, Posting, PreparedDocument};
pub use prep::prepare;
