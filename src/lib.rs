//! Scriptlens - Explore sentiment in analyzed movie scripts
//!
//! Scriptlens reads a movie script that an upstream pipeline has already
//! split into entries (scene locations, stage directions, character cues and
//! speech lines) and scored for sentiment. It turns that document into the
//! series, tables and graphs a reader needs to see how characters feel and
//! how they talk to each other over the course of the movie.
//!
//! # Views
//!
//! 1. **Character table**: characters ranked by line count, each with the
//!    average sentiment of their lines and a color on a red to green ramp.
//!
//! 2. **Character breakdown**: the sentiment of every line one character
//!    speaks, smoothed with a trailing moving average, plus per-scene means.
//!
//! 3. **Interactions**: the conversation between two characters, found by
//!    scanning each cue for the neighbouring speaker within the same scene.
//!
//! 4. **Directions**: sentiment of stage directions across the script.
//!
//! 5. **Social graph**: characters as nodes, shared scenes as weighted edges.
//!
//! # Quick Start
//!
//! ```no_run
//! use scriptlens::{Session, Settings};
//!
//! let session = Session::load("star_wars.json", Settings::default())?;
//!
//! for row in session.character_table() {
//!     println!("{:>3} {:<20} {:>4} {}", row.rank, row.name, row.line_count, row.color);
//! }
//!
//! if let Some((a, b)) = session.default_pair() {
//!     let report = session.interactions(a, b);
//!     println!("{} and {}: {} exchanges", a, b, report.exchanges);
//! }
//! # Ok::<(), scriptlens::DocumentError>(())
//! ```
//!
//! # Sentiment Scores
//!
//! Scores lie in `[-1, 1]`. Series use `NaN` for positions with no value
//! (a scene the character is absent from, a turn taken by the other side of
//! a conversation); those are written as `null` in JSON output and drawn as
//! gaps.
//!
//! # Modules
//!
//! - [`movie`]: Document model, loading and validation
//! - [`metrics`]: Timelines, adjacency scan, smoothing and colors
//! - [`session`]: Settings and the per-view data built from one document
//! - [`report`]: Output formatters (HTML, JSON, CSV)
//! - [`serve`]: Interactive web viewer

pub mod metrics;
pub mod movie;
pub mod report;
pub mod serve;
pub mod session;

pub use metrics::{
    character_timeline, color_for, direction_timeline, find_adjacent_character,
    pairwise_timeline, smooth, CharacterTimeline, Direction, DirectionTimeline, PairwiseOutcome,
    PairwiseTimeline, Rgb,
};
pub use movie::{Character, Cooccurrence, DocumentError, Entry, EntryKind, Movie, MovieInfo};
pub use session::{Session, Settings};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is reachable from the crate
    // root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let movie = Movie::from_json(movie::fixtures::SAMPLE_JSON).unwrap();
        let session = Session::new(movie, Settings::default());
        assert_eq!(session.settings().min_lines_threshold, 10);
    }

    #[test]
    fn test_metrics_accessible() {
        let entries = vec![
            Entry::Location { content: "INT. BASE".to_string() },
            Entry::Character { content: "A".to_string() },
            Entry::Speech { content: "Hi.".to_string(), cs: 0.5 },
        ];
        assert_eq!(find_adjacent_character(&entries, 1, Direction::Forward), None);
        assert_eq!(character_timeline(&entries, "A").len(), 1);
        assert!(matches!(pairwise_timeline(&entries, "A", "B"), PairwiseOutcome::NoInteraction));
        assert_eq!(color_for(f64::NAN), Rgb(180, 180, 180));
    }

    #[test]
    fn test_error_variants() {
        let err = Movie::from_json("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
        let _ = DocumentError::InvalidDocument(String::new());
    }
}
