use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{CorpusEntry, DocId};

/// The validated, ordered set of entries a ranker is built over.
///
/// Entry positions are their document ids. Every entry has a non-blank
/// question and answer and no blank skill strings; anything else is rejected
/// here so that malformed data never reaches query time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<CorpusEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            validate_entry(i, entry)?;
        }
        Ok(Self { entries })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(parse_entries(json, "corpus")?)
    }

    /// Load a single JSON file, or every `*.json` file under a directory.
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() { Self::load_dir(path) } else { Self::load_file(path) }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let corpus = Self::new(parse_entries(&content, &path.display().to_string())?)?;
        info!(path = %path.display(), entries = corpus.len(), "Loaded corpus");
        Ok(corpus)
    }

    /// Concatenate every `*.json` file under `dir`, in sorted path order so
    /// document ids are reproducible across runs.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let files = list_json_files(dir);
        if files.is_empty() {
            info!(dir = %dir.display(), "No .json files found; corpus is empty");
            return Ok(Self::empty());
        }
        let mut entries = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!("Reading corpus file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = fs::read_to_string(file_path)?;
            entries.append(&mut parse_entries(&content, &file_path.display().to_string())?);
        }
        let corpus = Self::new(entries)?;
        info!(files = files.len(), entries = corpus.len(), "Loaded corpus directory");
        Ok(corpus)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn get(&self, id: DocId) -> Option<&CorpusEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorpusEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a CorpusEntry;
    type IntoIter = std::slice::Iter<'a, CorpusEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Malformed JSON and missing required fields are both `InvalidCorpus`,
/// prefixed with `source`.
fn parse_entries(json: &str, source: &str) -> Result<Vec<CorpusEntry>> {
    serde_json::from_str(json).map_err(|e| Error::InvalidCorpus(format!("{source}: {e}")))
}

fn validate_entry(i: usize, entry: &CorpusEntry) -> Result<()> {
    if entry.question.trim().is_empty() {
        return Err(Error::InvalidCorpus(format!("entry {}: question is empty", i)));
    }
    if entry.answer.trim().is_empty() {
        return Err(Error::InvalidCorpus(format!("entry {}: answer is empty", i)));
    }
    if let Some(pos) = entry.skills.iter().position(|s| s.trim().is_empty()) {
        return Err(Error::InvalidCorpus(format!("entry {}: skill #{} is empty", i, pos)));
    }
    Ok(())
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut json_files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") { json_files.push(path.to_path_buf()); }
    }
    json_files.sort();
    json_files
}
