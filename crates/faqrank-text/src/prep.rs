//! Text preparation shared by indexing and querying.
//!
//! Lowercase, strip punctuation, split on whitespace, drop stop words, then
//! apply a small suffix-stripping stemmer. Documents and queries must go
//! through exactly the same [`prepare`] or terms stop matching.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "you", "your", "this",
        "these", "those",
    ]
    .into_iter()
    .collect()
});

/// Suffix rules, tried in order. The first rule that matches and leaves at
/// least [`MIN_STEM_LEN`] characters wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ing", ""),
    ("ed", ""),
    ("tion", "t"),
    ("ness", ""),
    ("ment", ""),
    ("able", ""),
    ("ible", ""),
    ("ly", ""),
    ("s", ""),
];

const MIN_STEMMABLE_LEN: usize = 4;
const MIN_STEM_LEN: usize = 3;

/// Run the full pipeline over `text`.
pub fn prepare(text: &str) -> Vec<String> {
    tokenize(&strip_punctuation(&text.to_lowercase()))
        .filter(|t| !is_stop_word(t))
        .map(stem)
        .collect()
}

/// Replace everything except ASCII letters, digits, `_`, `-` and whitespace
/// with a space.
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() { c } else { ' ' })
        .collect()
}

/// Whitespace tokenization; empty tokens never appear.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split_whitespace().filter(|t| !t.is_empty())
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

pub fn stem(word: &str) -> String {
    if word.chars().count() < MIN_STEMMABLE_LEN {
        return word.to_string();
    }
    for (suffix, replacement) in SUFFIX_RULES {
        if let Some(root) = word.strip_suffix(suffix) {
            if root.chars().count() + replacement.chars().count() >= MIN_STEM_LEN {
                return format!("{root}{replacement}");
            }
        }
    }
    word.to_string()
}
