//! Analyzed movie documents
//!
//! A document is the JSON produced by the script analysis pipeline: the
//! ordered entries of a screenplay, per-character statistics and a symmetric
//! co-occurrence matrix.
//!
//! ```text
//! {
//!   "info":          { "title": "...", "authors": [...], ... },   (optional)
//!   "entries":       [ { "type": "CHARACTER", "content": "LUKE" },
//!                      { "type": "SPEECH", "content": "...", "cs": 0.42 }, ... ],
//!   "characters":    { "LUKE": { "name": "LUKE", "line_count": 12, "avg_cs": 0.1 } },
//!   "cooccurrences": { "LUKE": { "LUKE": { "count": 3, "avg_cs": 0.2 }, ... } }
//! }
//! ```
//!
//! Documents are validated once, when loaded. Everything downstream of
//! [`Movie::load`] can assume that every `CHARACTER` entry names a known
//! character.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Kind of a script entry, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Meta,
    Location,
    Direction,
    Character,
    Speech,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Meta => write!(f, "META"),
            EntryKind::Location => write!(f, "LOCATION"),
            EntryKind::Direction => write!(f, "DIRECTION"),
            EntryKind::Character => write!(f, "CHARACTER"),
            EntryKind::Speech => write!(f, "SPEECH"),
        }
    }
}

/// One parsed line of the screenplay.
///
/// A `Character` cue names the speaker of the `Speech` entry that follows
/// it; a `Location` starts a new scene. `Meta` covers the title page material
/// found before the first scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Entry {
    Meta { content: String },
    Location { content: String },
    Direction { content: String, cs: f64 },
    Character { content: String },
    Speech { content: String, cs: f64 },
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Meta { .. } => EntryKind::Meta,
            Entry::Location { .. } => EntryKind::Location,
            Entry::Direction { .. } => EntryKind::Direction,
            Entry::Character { .. } => EntryKind::Character,
            Entry::Speech { .. } => EntryKind::Speech,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Entry::Meta { content }
            | Entry::Location { content }
            | Entry::Direction { content, .. }
            | Entry::Character { content }
            | Entry::Speech { content, .. } => content,
        }
    }

    /// Compound sentiment score, for the kinds that carry one
    pub fn score(&self) -> Option<f64> {
        match self {
            Entry::Direction { cs, .. } | Entry::Speech { cs, .. } => Some(*cs),
            _ => None,
        }
    }

    /// Speaker name if this is a character cue
    pub fn character(&self) -> Option<&str> {
        match self {
            Entry::Character { content } => Some(content),
            _ => None,
        }
    }

    pub fn is_location(&self) -> bool {
        matches!(self, Entry::Location { .. })
    }
}

/// Per-character statistics computed at ingestion time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub line_count: u32,
    /// Mean compound score over all of the character's lines
    pub avg_cs: f64,
}

/// Co-occurrence statistics for an ordered pair of characters.
/// `count == 0` means the pair never shared a scene.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cooccurrence {
    pub count: u32,
    pub avg_cs: f64,
}

/// Bibliographic metadata carried along by the analysis pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovieInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub script_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<MovieInfo>,
    pub entries: Vec<Entry>,
    pub characters: BTreeMap<String, Character>,
    #[serde(default)]
    pub cooccurrences: BTreeMap<String, BTreeMap<String, Cooccurrence>>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

impl Movie {
    /// Read and validate a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let movie = Self::from_json(&text)?;
        log::info!(
            "loaded {} ({} entries, {} characters)",
            path.display(),
            movie.entries.len(),
            movie.characters.len()
        );
        Ok(movie)
    }

    /// Parse and validate a document
    pub fn from_json(text: &str) -> Result<Self> {
        let movie: Movie = serde_json::from_str(text)?;
        movie.validate()?;
        Ok(movie)
    }

    /// Check the cross references the aggregators rely on
    pub fn validate(&self) -> Result<()> {
        for (key, c) in &self.characters {
            if *key != c.name {
                return Err(invalid(format!(
                    "character key '{}' does not match record name '{}'",
                    key, c.name
                )));
            }
        }

        for (i, e) in self.entries.iter().enumerate() {
            if let Some(name) = e.character() {
                if !self.characters.contains_key(name) {
                    return Err(invalid(format!(
                        "entry {} names unknown character '{}'",
                        i, name
                    )));
                }
            }
        }

        for (row, cols) in &self.cooccurrences {
            if !self.characters.contains_key(row) {
                return Err(invalid(format!("co-occurrence row for unknown character '{}'", row)));
            }
            if let Some(col) = cols.keys().find(|c| !self.characters.contains_key(*c)) {
                return Err(invalid(format!(
                    "co-occurrence '{}' -> '{}' names unknown character",
                    row, col
                )));
            }
        }

        Ok(())
    }

    /// Co-occurrence cell for a pair; absent cells read as no interaction
    pub fn cooccurrence(&self, a: &str, b: &str) -> Cooccurrence {
        self.cooccurrences
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or_default()
    }

    pub fn title(&self) -> Option<&str> {
        self.info.as_ref().and_then(|i| i.title.as_deref())
    }

    /// Character names by decreasing line count. Ties keep name order.
    pub fn sorted_character_names(&self) -> Vec<String> {
        let mut names: Vec<&Character> = self.characters.values().collect();
        names.sort_by(|a, b| b.line_count.cmp(&a.line_count));
        names.into_iter().map(|c| c.name.clone()).collect()
    }

    /// Number of entries of each kind
    pub fn entry_counts(&self) -> BTreeMap<EntryKind, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.kind()).or_insert(0) += 1;
        }
        counts
    }
}

fn invalid(msg: String) -> DocumentError {
    log::warn!("rejecting document: {}", msg);
    DocumentError::InvalidDocument(msg)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    // ==========================================================================
    // ENTRY DECODING TESTS
    // ==========================================================================
    //
    // Entries are a tagged union keyed by "type". Only SPEECH and DIRECTION
    // carry a compound score.
    // ==========================================================================

    #[test]
    fn test_entry_tagged_decoding() {
        let e: Entry = serde_json::from_str(r#"{"type":"SPEECH","content":"Hi","cs":0.5}"#).unwrap();
        assert_eq!(e, speech("Hi", 0.5));
        assert_eq!(e.kind(), EntryKind::Speech);
        assert_eq!(e.score(), Some(0.5));

        let e: Entry = serde_json::from_str(r#"{"type":"CHARACTER","content":"HAN"}"#).unwrap();
        assert_eq!(e.character(), Some("HAN"));
        assert_eq!(e.score(), None);
    }

    #[test]
    fn test_integer_score_accepted() {
        let e: Entry = serde_json::from_str(r#"{"type":"DIRECTION","content":"Silence.","cs":0}"#).unwrap();
        assert_eq!(e.score(), Some(0.0));
    }

    #[test]
    fn test_unknown_entry_type_rejected() {
        let doc = r#"{"entries":[{"type":"SONG","content":"la"}],"characters":{}}"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_speech_without_score_rejected() {
        let doc = r#"{"entries":[{"type":"SPEECH","content":"Hi"}],"characters":{}}"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::Json(_))));
    }

    // ==========================================================================
    // DOCUMENT VALIDATION TESTS
    // ==========================================================================

    #[test]
    fn test_sample_document_loads() {
        let movie = sample_movie();
        assert_eq!(movie.entries.len(), 16);
        assert_eq!(movie.characters.len(), 3);
        assert_eq!(movie.title(), Some("Sample"));
    }

    #[test]
    fn test_missing_entries_rejected() {
        let doc = r#"{"characters":{}}"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_unknown_speaker_is_invalid() {
        let doc = r#"{
            "entries":[{"type":"CHARACTER","content":"GHOST"},{"type":"SPEECH","content":"Boo","cs":-0.1}],
            "characters":{}
        }"#;
        match Movie::from_json(doc) {
            Err(DocumentError::InvalidDocument(msg)) => assert!(msg.contains("GHOST")),
            other => panic!("expected InvalidDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_character_key_is_invalid() {
        let doc = r#"{
            "entries":[],
            "characters":{"HAN":{"name":"SOLO","line_count":1,"avg_cs":0.0}}
        }"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::InvalidDocument(_))));
    }

    #[test]
    fn test_unknown_cooccurrence_name_is_invalid() {
        let doc = r#"{
            "entries":[],
            "characters":{"HAN":{"name":"HAN","line_count":1,"avg_cs":0.0}},
            "cooccurrences":{"HAN":{"CHEWIE":{"count":1,"avg_cs":0.0}}}
        }"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::InvalidDocument(_))));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let doc = r#"{
            "entries":[{"type":"CHARACTER","content":"Han"}],
            "characters":{"HAN":{"name":"HAN","line_count":1,"avg_cs":0.0}}
        }"#;
        assert!(matches!(Movie::from_json(doc), Err(DocumentError::InvalidDocument(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Movie::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, SAMPLE_JSON).unwrap();
        let movie = Movie::load(&path).unwrap();
        assert_eq!(movie, sample_movie());
    }

    // ==========================================================================
    // DERIVED ACCESSOR TESTS
    // ==========================================================================

    #[test]
    fn test_sorted_character_names() {
        let movie = sample_movie();
        // LUKE has the most lines; HAN and LEIA tie and keep name order
        assert_eq!(movie.sorted_character_names(), vec!["LUKE", "HAN", "LEIA"]);
    }

    #[test]
    fn test_missing_cooccurrence_reads_as_zero() {
        let mut movie = sample_movie();
        movie.cooccurrences.clear();
        assert_eq!(movie.cooccurrence("LUKE", "HAN").count, 0);
    }

    #[test]
    fn test_entry_counts() {
        let counts = sample_movie().entry_counts();
        assert_eq!(counts[&EntryKind::Speech], 5);
        assert_eq!(counts[&EntryKind::Character], 5);
        assert_eq!(counts[&EntryKind::Location], 3);
        assert_eq!(counts[&EntryKind::Direction], 2);
        assert_eq!(counts[&EntryKind::Meta], 1);
    }
}
