//! Domain types used by the lexical, semantic and hybrid engines.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Position of an entry in its corpus. Stable for the lifetime of an index.
pub type DocId = usize;

/// An L2-normalized embedding. Shared immutably so a vector handed out by the
/// cache can never be modified behind another caller's back.
pub type Embedding = Arc<[f32]>;

/// One question/answer record of the corpus.
///
/// - `question`: primary text, weighted highest by the lexical scorer
/// - `answer`: secondary text
/// - `skills`: short tag strings (may be absent or `null` in the source)
/// - `extra`: any other fields of the source record, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub question: String,
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CorpusEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into(), skills: Vec::new(), extra: serde_json::Map::new() }
    }

    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Raw text of one indexed field. Skills are joined with single spaces.
    pub fn field_text(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Question => Cow::Borrowed(&self.question),
            Field::Answer => Cow::Borrowed(&self.answer),
            Field::Skills => Cow::Owned(self.skills.join(" ")),
        }
    }

    /// The single text fed to the embedding model for this entry:
    /// question, answer and skills separated by one space each.
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.question, self.answer, self.skills.join(" "))
    }
}

/// The indexed fields of a [`CorpusEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Question,
    Answer,
    Skills,
}

impl Field {
    /// Fixed iteration order; scoring sums fields in this order.
    pub const ALL: [Field; 3] = [Field::Question, Field::Answer, Field::Skills];

    pub fn index(self) -> usize {
        match self {
            Field::Question => 0,
            Field::Answer => 1,
            Field::Skills => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Question => "question",
            Field::Answer => "answer",
            Field::Skills => "skills",
        }
    }
}

/// Per-field multipliers applied to BM25 term scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub question: f32,
    pub answer: f32,
    pub skills: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { question: 4.0, answer: 2.0, skills: 3.0 }
    }
}

impl FieldWeights {
    pub fn weight(&self, field: Field) -> f32 {
        match field {
            Field::Question => self.question,
            Field::Answer => self.answer,
            Field::Skills => self.skills,
        }
    }

    /// Every weight finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.question, self.answer, self.skills];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig(format!(
                "field weights must be finite and non-negative (question={}, answer={}, skills={})",
                self.question, self.answer, self.skills
            )));
        }
        Ok(())
    }
}

/// BM25 parameters.
///
/// - `k1`: term-frequency saturation
/// - `b`: document length normalization strength (0 = off, 1 = full)
/// - `k`: query term-frequency saturation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    pub k: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75, k: 1.0 }
    }
}

impl Bm25Params {
    /// `k1` and `k` finite and non-negative, `b` in [0, 1].
    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || !self.k.is_finite() || self.k1 < 0.0 || self.k < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "k1 and k must be finite and non-negative (k1={}, k={})",
                self.k1, self.k
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidConfig(format!("b must lie in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// Options of a single ranking request. Every field may be omitted when
/// deserialized and then takes its default.
///
/// The weights are not required to sum to 1: the hybrid score is simply
/// `bm25_weight * lexical + embedding_weight * semantic`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_k: usize,
    pub bm25_weight: f32,
    pub embedding_weight: f32,
    pub field_weights: FieldWeights,
    pub bm25_params: Bm25Params,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            bm25_weight: 0.4,
            embedding_weight: 0.6,
            field_weights: FieldWeights::default(),
            bm25_params: Bm25Params::default(),
        }
    }
}

impl RankingConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_weights(mut self, bm25_weight: f32, embedding_weight: f32) -> Self {
        self.bm25_weight = bm25_weight;
        self.embedding_weight = embedding_weight;
        self
    }

    pub fn with_field_weights(mut self, field_weights: FieldWeights) -> Self {
        self.field_weights = field_weights;
        self
    }

    pub fn with_bm25_params(mut self, bm25_params: Bm25Params) -> Self {
        self.bm25_params = bm25_params;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bm25_weight.is_finite() || !self.embedding_weight.is_finite() {
            return Err(Error::InvalidConfig("bm25_weight and embedding_weight must be finite".to_string()));
        }
        self.field_weights.validate()?;
        self.bm25_params.validate()
    }
}

/// One scored entry of a hybrid ranking. Built per query, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult<'a> {
    pub doc_id: DocId,
    pub entry: &'a CorpusEntry,
    /// Lexical score divided by the best lexical score of the shortlist.
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub hybrid_score: f32,
}

/// Snapshot of the lexical index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub built: bool,
    pub documents: usize,
    pub terms: usize,
}

/// Snapshot of the embedding cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankerStatus {
    pub initialized: bool,
    pub entries: usize,
    pub index: IndexStatus,
    pub cache: CacheStats,
}
