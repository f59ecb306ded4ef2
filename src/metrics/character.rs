//! Per-character sentiment over the course of the script

use super::series::mean;
use crate::movie::Entry;
use serde::Serialize;

/// Everything one character says, in script order.
///
/// `line_indices` positions each line on the shared dialogue timeline (the
/// counter advances on every attributable line, whoever speaks), so several
/// characters' timelines can be drawn against the same axis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CharacterTimeline {
    pub line_indices: Vec<usize>,
    pub lines: Vec<String>,
    pub scores: Vec<f64>,
    /// One value per scene; NaN where the character has no lines
    pub scene_averages: Vec<f64>,
    /// The average of the enclosing scene, repeated for each line
    pub line_scene_averages: Vec<f64>,
}

impl CharacterTimeline {
    /// Mean score over all lines (NaN if the character never speaks)
    pub fn average(&self) -> f64 {
        mean(&self.scores)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn close_scene(&mut self, sum: f64, lines: usize) {
        // 0/0 is NaN for a scene without lines from this character
        let avg = sum / lines as f64;
        self.scene_averages.push(avg);
        self.line_scene_averages.extend(std::iter::repeat(avg).take(lines));
    }
}

/// Collect the lines spoken by `name`.
///
/// A line is a `SPEECH` entry directly preceded by a `CHARACTER` cue. Each
/// `LOCATION` closes the running scene, and so does the end of the script
/// when it does not already end on a `LOCATION`.
pub fn character_timeline(entries: &[Entry], name: &str) -> CharacterTimeline {
    let mut timeline = CharacterTimeline::default();
    let mut line_index = 0;
    let mut scene_sum = 0.0;
    let mut scene_lines = 0;

    for pair in entries.windows(2) {
        let (prev, entry) = (&pair[0], &pair[1]);

        match (prev.character(), entry) {
            (Some(speaker), Entry::Speech { content, cs }) => {
                if speaker == name {
                    timeline.line_indices.push(line_index);
                    timeline.lines.push(content.clone());
                    timeline.scores.push(*cs);
                    scene_lines += 1;
                    scene_sum += cs;
                }
                line_index += 1;
            }
            (_, Entry::Location { .. }) => {
                timeline.close_scene(scene_sum, scene_lines);
                scene_sum = 0.0;
                scene_lines = 0;
            }
            _ => {}
        }
    }

    if entries.len() > 1 && !entries.last().is_some_and(Entry::is_location) {
        timeline.close_scene(scene_sum, scene_lines);
    }

    timeline
}
