//! Viewer session: one loaded document plus the display settings
//!
//! A [`Session`] is the context every view is computed from. It owns the
//! document, caches the character ordering, and turns the raw metrics into
//! the rows, series and graph the viewer draws. Loading a new document means
//! building a new session.

use crate::metrics::series::{color_for, mean, smooth, Rgb};
use crate::metrics::{
    character_timeline, direction_timeline, pairwise_timeline, CharacterTimeline,
    DirectionTimeline, PairwiseOutcome,
};
use crate::movie::{self, Character, EntryKind, Movie};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Tooltip labels longer than this are cut
const LABEL_LIMIT: usize = 100;
const NODE_SIZE_EXPONENT: f64 = 0.7;
const EDGE_SIZE_EXPONENT: f64 = 1.2;

fn default_min_lines() -> u32 { 10 }
fn default_min_lines_graph() -> u32 { 20 }

/// Display thresholds. Characters with `line_count` at or below a threshold
/// are left out of the corresponding view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Character table and selectors
    #[serde(default = "default_min_lines")]
    pub min_lines_threshold: u32,
    /// Social graph
    #[serde(default = "default_min_lines_graph")]
    pub min_lines_threshold_graph: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_lines_threshold: default_min_lines(),
            min_lines_threshold_graph: default_min_lines_graph(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> movie::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Round to three decimals for display
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Shorten text for chart tooltips
pub fn format_label(text: &str) -> String {
    match text.char_indices().nth(LABEL_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterRow {
    pub rank: usize,
    pub name: String,
    pub line_count: u32,
    pub avg_cs: f64,
    pub avg_cs_rounded: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterBreakdown {
    pub character: Character,
    pub color: Rgb,
    pub timeline: CharacterTimeline,
    pub smoothed: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionReport {
    pub a: String,
    pub b: String,
    pub result: PairwiseOutcome,
    pub smoothed_a: Vec<f64>,
    pub smoothed_b: Vec<f64>,
    /// Adjacent dialogue lines, counting two turns as one
    pub exchanges: usize,
    pub average_score: Option<f64>,
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectionReport {
    pub timeline: DirectionTimeline,
    pub smoothed: Vec<f64>,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub line_count: u32,
    pub size: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub count: u32,
    pub size: f64,
    pub color: Rgb,
}

/// Character co-occurrence graph, without positions
#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieSummary {
    pub title: Option<String>,
    pub entries: usize,
    pub entry_counts: BTreeMap<EntryKind, usize>,
    pub scenes: usize,
    pub characters: usize,
    pub listed_characters: usize,
}

pub struct Session {
    movie: Movie,
    settings: Settings,
    sorted_names: Vec<String>,
}

impl Session {
    pub fn new(movie: Movie, settings: Settings) -> Self {
        let sorted_names = movie.sorted_character_names();
        Self { movie, settings, sorted_names }
    }

    pub fn load<P: AsRef<Path>>(path: P, settings: Settings) -> movie::Result<Self> {
        Ok(Self::new(Movie::load(path)?, settings))
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// All character names by decreasing line count
    pub fn sorted_character_names(&self) -> &[String] {
        &self.sorted_names
    }

    fn listed(&self, threshold: u32) -> impl Iterator<Item = &Character> {
        self.sorted_names
            .iter()
            .filter_map(move |n| self.movie.characters.get(n))
            .filter(move |c| c.line_count > threshold)
    }

    /// Characters offered in the selectors, most talkative first
    pub fn selectable_characters(&self) -> Vec<&str> {
        self.listed(self.settings.min_lines_threshold)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// The two most talkative listed characters
    pub fn default_pair(&self) -> Option<(&str, &str)> {
        let mut listed = self.listed(self.settings.min_lines_threshold);
        let a = listed.next()?;
        let b = listed.next()?;
        Some((&a.name, &b.name))
    }

    pub fn character_table(&self) -> Vec<CharacterRow> {
        self.listed(self.settings.min_lines_threshold)
            .enumerate()
            .map(|(i, c)| CharacterRow {
                rank: i + 1,
                name: c.name.clone(),
                line_count: c.line_count,
                avg_cs: c.avg_cs,
                avg_cs_rounded: round3(c.avg_cs),
                color: color_for(c.avg_cs),
            })
            .collect()
    }

    /// Sentiment of one character's lines; `None` for an unknown name
    pub fn breakdown(&self, name: &str) -> Option<CharacterBreakdown> {
        let character = self.movie.characters.get(name)?.clone();
        let timeline = character_timeline(&self.movie.entries, name);
        let smoothed = smooth(&timeline.scores, None);
        Some(CharacterBreakdown {
            color: color_for(character.avg_cs),
            character,
            timeline,
            smoothed,
        })
    }

    pub fn interactions(&self, a: &str, b: &str) -> InteractionReport {
        let result = pairwise_timeline(&self.movie.entries, a, b);
        let (smoothed_a, smoothed_b, exchanges, average_score) = match result.timeline() {
            Some(t) => (
                smooth(&t.scores_a, None),
                smooth(&t.scores_b, None),
                t.exchanges(),
                Some(t.average_score),
            ),
            None => (Vec::new(), Vec::new(), 0, None),
        };

        InteractionReport {
            a: a.to_string(),
            b: b.to_string(),
            result,
            smoothed_a,
            smoothed_b,
            exchanges,
            average_score: average_score.map(round3),
            color: average_score.map(color_for),
        }
    }

    pub fn directions(&self) -> DirectionReport {
        let timeline = direction_timeline(&self.movie.entries);
        let smoothed = smooth(&timeline.scores, None);
        let average = mean(&timeline.scores);
        DirectionReport { timeline, smoothed, average }
    }

    /// Nodes for characters above the graph threshold, one edge per ordered
    /// pair of such characters that share at least one scene
    pub fn social_graph(&self) -> SocialGraph {
        let threshold = self.settings.min_lines_threshold_graph;
        let shown: Vec<&Character> = self
            .movie
            .characters
            .values()
            .filter(|c| c.line_count > threshold)
            .collect();

        let nodes = shown
            .iter()
            .map(|c| GraphNode {
                id: c.name.clone(),
                label: c.name.clone(),
                line_count: c.line_count,
                size: (c.line_count as f64).powf(NODE_SIZE_EXPONENT),
                color: color_for(c.avg_cs),
            })
            .collect();

        let mut edges = Vec::new();
        for ci in &shown {
            for cj in &shown {
                let co = self.movie.cooccurrence(&ci.name, &cj.name);
                if ci.name == cj.name || co.count == 0 {
                    continue;
                }
                edges.push(GraphEdge {
                    id: format!("{}-{}", ci.name, cj.name),
                    source: ci.name.clone(),
                    target: cj.name.clone(),
                    count: co.count,
                    size: (co.count as f64).powf(EDGE_SIZE_EXPONENT),
                    color: color_for(co.avg_cs),
                });
            }
        }

        SocialGraph { nodes, edges }
    }

    pub fn summary(&self) -> MovieSummary {
        let entry_counts = self.movie.entry_counts();
        MovieSummary {
            title: self.movie.title().map(str::to_string),
            entries: self.movie.entries.len(),
            scenes: entry_counts.get(&EntryKind::Location).copied().unwrap_or(0),
            entry_counts,
            characters: self.movie.characters.len(),
            listed_characters: self.listed(self.settings.min_lines_threshold).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::fixtures::*;

    fn open_session() -> Session {
        Session::new(
            sample_movie(),
            Settings { min_lines_threshold: 0, min_lines_threshold_graph: 0 },
        )
    }

    // ==========================================================================
    // SETTINGS TESTS
    // ==========================================================================

    #[test]
    fn test_settings_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.min_lines_threshold, 10);
        assert_eq!(s.min_lines_threshold_graph, 20);
    }

    #[test]
    fn test_settings_partial_override() {
        let s: Settings = serde_json::from_str(r#"{"min_lines_threshold_graph": 3}"#).unwrap();
        assert_eq!(s.min_lines_threshold, 10);
        assert_eq!(s.min_lines_threshold_graph, 3);
    }

    #[test]
    fn test_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"min_lines_threshold": 4}"#).unwrap();
        assert_eq!(Settings::load(&path).unwrap().min_lines_threshold, 4);
    }

    // ==========================================================================
    // DISPLAY HELPER TESTS
    // ==========================================================================

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.36667), 0.367);
        assert_eq!(round3(-0.1234), -0.123);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("short"), "short");
        let long = "x".repeat(150);
        let label = format_label(&long);
        assert_eq!(label.len(), 103);
        assert!(label.ends_with("..."));
        assert_eq!(format_label(&"y".repeat(100)), "y".repeat(100));
    }

    #[test]
    fn test_format_label_multibyte() {
        let label = format_label(&"é".repeat(120));
        assert_eq!(label.chars().count(), 103);
    }

    // ==========================================================================
    // CHARACTER TABLE TESTS
    // ==========================================================================
    //
    // Thresholds are exclusive: a character with exactly `threshold` lines
    // is hidden.
    // ==========================================================================

    #[test]
    fn test_table_ranks_by_line_count() {
        let session = open_session();
        let table = session.character_table();
        let names: Vec<&str> = table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["LUKE", "HAN", "LEIA"]);
        assert_eq!(table[0].rank, 1);
        assert_eq!(table[0].avg_cs_rounded, 0.367);
        assert_eq!(table[2].color, color_for(-0.3));
    }

    #[test]
    fn test_table_threshold_is_exclusive() {
        let mut session = open_session();
        session.set_settings(Settings { min_lines_threshold: 1, ..Settings::default() });
        let table = session.character_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].name, "LUKE");
        assert_eq!(table[0].rank, 1);
        assert_eq!(session.selectable_characters(), vec!["LUKE"]);
        assert_eq!(session.default_pair(), None);
    }

    #[test]
    fn test_default_pair() {
        assert_eq!(open_session().default_pair(), Some(("LUKE", "HAN")));
    }

    // ==========================================================================
    // VIEW TESTS
    // ==========================================================================

    #[test]
    fn test_breakdown() {
        let session = open_session();
        let b = session.breakdown("LUKE").unwrap();
        assert_eq!(b.character.line_count, 3);
        assert_eq!(b.timeline.scores.len(), b.smoothed.len());
        assert!(session.breakdown("NOBODY").is_none());
    }

    #[test]
    fn test_interactions_report() {
        let session = open_session();
        let r = session.interactions("LUKE", "LEIA");
        assert_eq!(r.exchanges, 1);
        assert_eq!(r.average_score, Some(0.1));
        assert_eq!(r.smoothed_a.len(), 3);
        assert!(r.color.is_some());
    }

    #[test]
    fn test_no_interactions_report() {
        let session = open_session();
        let r = session.interactions("LEIA", "HAN");
        assert!(matches!(r.result, PairwiseOutcome::NoInteraction));
        assert_eq!(r.exchanges, 0);
        assert_eq!(r.average_score, None);
        assert!(r.smoothed_a.is_empty());
    }

    #[test]
    fn test_directions_report() {
        let r = open_session().directions();
        assert_eq!(r.timeline.scores.len(), 2);
        assert!((r.average - -0.15).abs() < 1e-9);
    }

    // ==========================================================================
    // SOCIAL GRAPH TESTS
    // ==========================================================================

    #[test]
    fn test_social_graph() {
        let graph = open_session().social_graph();
        assert_eq!(graph.nodes.len(), 3);
        // LUKE-LEIA and LUKE-HAN in both directions; HAN and LEIA never meet
        assert_eq!(graph.edges.len(), 4);
        assert!(graph.edges.iter().all(|e| e.source != e.target));
        assert!(graph.edges.iter().any(|e| e.id == "HAN-LUKE"));

        let luke = graph.nodes.iter().find(|n| n.id == "LUKE").unwrap();
        assert!((luke.size - 3f64.powf(0.7)).abs() < 1e-12);
    }

    #[test]
    fn test_social_graph_threshold() {
        let mut session = open_session();
        session.set_settings(Settings { min_lines_threshold: 0, min_lines_threshold_graph: 1 });
        let graph = session.social_graph();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_summary() {
        let s = open_session().summary();
        assert_eq!(s.title.as_deref(), Some("Sample"));
        assert_eq!(s.entries, 16);
        assert_eq!(s.scenes, 3);
        assert_eq!(s.listed_characters, 3);

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["entry_counts"]["SPEECH"], 5);
    }
}
