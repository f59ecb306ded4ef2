//! Report generation for analyzed movies
//!
//! This module provides output formatters in multiple formats:
//!
//! - **HTML**: Self-contained page with D3.js charts (character table,
//!   direction sentiment, social graph, featured conversation)
//! - **JSON**: Machine-readable format for programmatic consumption
//! - **CSV**: One row per listed character, for spreadsheets
//!
//! # Usage
//!
//! ```ignore
//! use scriptlens::report;
//!
//! // Automatically picks format based on extension
//! report::generate("report.html", &reports)?;  // HTML
//! report::generate("report.json", &reports)?;  // JSON
//! report::generate("report.csv", &reports)?;   // CSV
//! ```

pub mod csv;
pub mod html;
pub mod json;

use crate::movie::DocumentError;
use crate::session::{
    CharacterRow, DirectionReport, InteractionReport, MovieSummary, Session, Settings, SocialGraph,
};
use serde::Serialize;
use std::io;
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, reports: &[MovieReport]) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;
    log::debug!("writing {} report to {}", ext, path.display());

    match ext.as_str() {
        "html" | "htm" => html::write(&mut file, reports),
        "json" => json::write(&mut file, reports),
        _ => csv::write(&mut file, reports),
    }
}

/// Every view of one document, computed with one set of settings
#[derive(Debug, Clone, Serialize)]
pub struct MovieAnalysis {
    pub summary: MovieSummary,
    pub settings: Settings,
    pub characters: Vec<CharacterRow>,
    pub directions: DirectionReport,
    pub graph: SocialGraph,
    /// Conversation between the two most talkative listed characters
    pub featured_pair: Option<InteractionReport>,
}

/// Outcome of analyzing one document file
#[derive(Debug, Clone, Serialize)]
pub struct MovieReport {
    pub file_path: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<MovieAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MovieReport {
    /// Load and analyze a document. Load failures become an error report.
    pub fn analyze<P: AsRef<Path>>(path: P, settings: Settings) -> Self {
        let path = path.as_ref();
        match Session::load(path, settings) {
            Ok(session) => Self::from_session(path, &session),
            Err(e) => Self::failed(path, &e),
        }
    }

    pub fn from_session(path: &Path, session: &Session) -> Self {
        let featured_pair = session.default_pair().map(|(a, b)| session.interactions(a, b));
        let analysis = MovieAnalysis {
            summary: session.summary(),
            settings: session.settings(),
            characters: session.character_table(),
            directions: session.directions(),
            graph: session.social_graph(),
            featured_pair,
        };

        Self {
            file_path: path.display().to_string(),
            file_name: file_name(path),
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(path: &Path, error: &DocumentError) -> Self {
        log::warn!("{}: {}", path.display(), error);
        Self {
            file_path: path.display().to_string(),
            file_name: file_name(path),
            analysis: None,
            error: Some(error.to_string()),
        }
    }

    /// Title from the document metadata, falling back to the file name
    pub fn title(&self) -> &str {
        self.analysis
            .as_ref()
            .and_then(|a| a.summary.title.as_deref())
            .unwrap_or(&self.file_name)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Summary statistics for a batch of reports
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Listed characters across all loaded documents
    pub characters: usize,
}

impl Summary {
    pub fn from_reports(reports: &[MovieReport]) -> Self {
        let mut summary = Self::default();
        summary.total = reports.len();

        for r in reports {
            match &r.analysis {
                Some(a) => {
                    summary.loaded += 1;
                    summary.characters += a.characters.len();
                }
                None => summary.failed += 1,
            }
        }

        summary
    }
}
