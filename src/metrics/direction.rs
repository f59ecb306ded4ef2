//! Sentiment of the stage directions

use crate::movie::Entry;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectionTimeline {
    pub line_indices: Vec<usize>,
    pub lines: Vec<String>,
    pub scores: Vec<f64>,
}

/// Every `DIRECTION` entry in script order, indexed from 0
pub fn direction_timeline(entries: &[Entry]) -> DirectionTimeline {
    let mut t = DirectionTimeline::default();
    for entry in entries {
        if let Entry::Direction { content, cs } = entry {
            t.line_indices.push(t.scores.len());
            t.lines.push(content.clone());
            t.scores.push(*cs);
        }
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::fixtures::*;

    #[test]
    fn test_collects_directions_only() {
        let movie = sample_movie();
        let t = direction_timeline(&movie.entries);
        assert_eq!(t.line_indices, vec![0, 1]);
        assert_eq!(t.lines, vec!["Alarms blare.", "They fly off."]);
        assert_eq!(t.scores, vec![-0.4, 0.1]);
    }

    #[test]
    fn test_no_directions() {
        let entries = vec![cue("A"), speech("hi", 0.3)];
        assert!(direction_timeline(&entries).scores.is_empty());
    }
}
