//! Turn-taking between two characters
//!
//! A cue by A counts as a turn towards B when B is the adjacent speaker on
//! either side within the scene (see [`super::adjacency`]), and vice versa.
//! Each turn lands on a shared timeline with one series per character: the
//! speaker's score in its own series and a NaN gap in the other one, so both
//! series always have the same length.
//!
//! ```text
//! turn         A->B   B->A   A->B
//! scores_a     0.2    NaN    0.4
//! scores_b     NaN   -0.3    NaN
//! ```

use super::adjacency::{next_character, previous_character};
use crate::movie::Entry;
use serde::Serialize;

/// Cues this close to either end of the script are not considered
const EDGE_MARGIN: usize = 2;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PairwiseTimeline {
    pub line_indices: Vec<usize>,
    /// Text following the cue of each turn
    pub lines: Vec<String>,
    pub scores_a: Vec<f64>,
    pub scores_b: Vec<f64>,
    /// Number of cues that qualified as a turn
    pub interaction_count: usize,
    pub average_score: f64,
}

impl PairwiseTimeline {
    /// Rough number of exchanges, counting every two turns as one
    pub fn exchanges(&self) -> usize {
        self.interaction_count / 2
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairwiseOutcome {
    /// The two characters never speak next to each other
    NoInteraction,
    Interactions(PairwiseTimeline),
}

impl PairwiseOutcome {
    pub fn timeline(&self) -> Option<&PairwiseTimeline> {
        match self {
            PairwiseOutcome::NoInteraction => None,
            PairwiseOutcome::Interactions(t) => Some(t),
        }
    }

    pub fn interaction_count(&self) -> usize {
        self.timeline().map_or(0, |t| t.interaction_count)
    }
}

/// Sum of the non-gap values divided by the full series length, gaps
/// included. An empty series contributes nothing.
fn gap_tolerant_average(series: &[f64]) -> f64 {
    let len = series.len() as f64;
    series.iter().filter(|v| !v.is_nan()).map(|v| v / len).sum()
}

pub fn pairwise_timeline(entries: &[Entry], a: &str, b: &str) -> PairwiseOutcome {
    let mut t = PairwiseTimeline::default();
    let mut line_index = 0;
    let end = entries.len().saturating_sub(EDGE_MARGIN);

    for i in EDGE_MARGIN..end {
        let Some(speaker) = entries[i].character() else {
            continue;
        };
        let speech = &entries[i + 1];
        let score = speech.score().unwrap_or(f64::NAN);

        let previous = previous_character(entries, i);
        let next = next_character(entries, i);
        let adjacent_to = |other: &str| previous == Some(other) || next == Some(other);

        let a_to_b = speaker == a && adjacent_to(b);
        let b_to_a = speaker == b && adjacent_to(a);

        if a_to_b {
            t.scores_a.push(score);
            t.scores_b.push(f64::NAN);
        }
        if b_to_a {
            t.scores_b.push(score);
            t.scores_a.push(f64::NAN);
        }
        if a_to_b || b_to_a {
            t.interaction_count += 1;
            t.lines.push(speech.content().to_string());
            t.line_indices.push(line_index);
        }
        line_index += 1;
    }

    if t.interaction_count == 0 {
        log::debug!("no interaction between '{}' and '{}'", a, b);
        return PairwiseOutcome::NoInteraction;
    }

    t.average_score = gap_tolerant_average(&t.scores_a) + gap_tolerant_average(&t.scores_b);
    PairwiseOutcome::Interactions(t)
}
