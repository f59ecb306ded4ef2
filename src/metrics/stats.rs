//! Ingestion statistics
//!
//! Documents carry per-character statistics and a co-occurrence matrix that
//! were computed when the script was analyzed. These functions rebuild them
//! from the entries alone, so documents holding only entries can be
//! completed and stored statistics can be checked for drift.
//!
//! # Co-occurrence
//!
//! Every `LOCATION` closes a scene. For each ordered pair (i, j) of
//! characters cued in that scene, self-pairs included:
//!
//! ```text
//! avg_x   = sum of scores of the speeches following x's cues / number of x's cues
//! mutual  = (avg_i + avg_j) / 2
//! count  += 1, avg_cs = running mean of mutual over the counted scenes
//! ```
//!
//! Cues after the last `LOCATION` never close a scene and are not counted.

use crate::movie::{Character, Cooccurrence, Entry, Movie};
use serde::Serialize;
use std::collections::BTreeMap;

pub type CooccurrenceMatrix = BTreeMap<String, BTreeMap<String, Cooccurrence>>;

/// Names of all cued characters, in name order
pub fn character_names(entries: &[Entry]) -> Vec<String> {
    let mut names: Vec<String> = entries
        .iter()
        .filter_map(|e| e.character().map(str::to_string))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Line count and mean score per character.
///
/// Cued characters that never get a speech are listed with zero lines.
pub fn character_stats(entries: &[Entry]) -> BTreeMap<String, Character> {
    let mut characters: BTreeMap<String, Character> = character_names(entries)
        .into_iter()
        .map(|name| {
            let c = Character { name: name.clone(), line_count: 0, avg_cs: 0.0 };
            (name, c)
        })
        .collect();

    for pair in entries.windows(2) {
        if let (Some(name), Entry::Speech { cs, .. }) = (pair[0].character(), &pair[1]) {
            if let Some(c) = characters.get_mut(name) {
                let n = c.line_count as f64;
                c.avg_cs = (n * c.avg_cs + cs) / (n + 1.0);
                c.line_count += 1;
            }
        }
    }

    characters
}

#[derive(Default)]
struct SceneTally {
    sum_cs: f64,
    cues: u32,
}

pub fn cooccurrence_matrix(entries: &[Entry]) -> CooccurrenceMatrix {
    let names = character_names(entries);
    let mut matrix: CooccurrenceMatrix = names
        .iter()
        .map(|i| {
            let row = names.iter().map(|j| (j.clone(), Cooccurrence::default())).collect();
            (i.clone(), row)
        })
        .collect();

    let mut scene: BTreeMap<&str, SceneTally> = BTreeMap::new();

    for (i, entry) in entries.iter().enumerate() {
        if entry.is_location() && !scene.is_empty() {
            close_scene(&mut matrix, &scene);
            scene.clear();
        }

        if let Some(name) = entry.character() {
            let tally = scene.entry(name).or_default();
            tally.cues += 1;
            if let Some(Entry::Speech { cs, .. }) = entries.get(i + 1) {
                tally.sum_cs += cs;
            }
        }
    }

    matrix
}

fn close_scene(matrix: &mut CooccurrenceMatrix, scene: &BTreeMap<&str, SceneTally>) {
    let average = |t: &SceneTally| t.sum_cs / t.cues as f64;

    for (name_i, tally_i) in scene {
        let avg_i = average(tally_i);
        for (name_j, tally_j) in scene {
            let mutual = (avg_i + average(tally_j)) / 2.0;
            if let Some(cell) = matrix.get_mut(*name_i).and_then(|row| row.get_mut(*name_j)) {
                let c = cell.count as f64;
                cell.avg_cs = (cell.avg_cs * c + mutual) / (c + 1.0);
                cell.count += 1;
            }
        }
    }
}

impl Movie {
    /// Build a complete document from entries, computing every statistic
    pub fn from_entries(info: Option<crate::movie::MovieInfo>, entries: Vec<Entry>) -> Self {
        let characters = character_stats(&entries);
        let cooccurrences = cooccurrence_matrix(&entries);
        Movie { info, entries, characters, cooccurrences }
    }
}

/// A stored statistic that disagrees with its recomputed value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drift {
    /// Character name, or `"A -> B"` for co-occurrence cells
    pub subject: String,
    pub field: &'static str,
    pub stored: f64,
    pub computed: f64,
}

/// Compare the stored statistics with freshly computed ones
pub fn drift(movie: &Movie, tolerance: f64) -> Vec<Drift> {
    let mut found = Vec::new();
    let differs = |a: f64, b: f64| (a - b).abs() > tolerance;

    let computed = character_stats(&movie.entries);
    for (name, c) in &computed {
        let stored = movie.characters.get(name);
        let stored_count = stored.map_or(0, |s| s.line_count);
        let stored_avg = stored.map_or(0.0, |s| s.avg_cs);

        if stored_count != c.line_count {
            found.push(Drift {
                subject: name.clone(),
                field: "line_count",
                stored: stored_count as f64,
                computed: c.line_count as f64,
            });
        }
        if differs(stored_avg, c.avg_cs) {
            found.push(Drift {
                subject: name.clone(),
                field: "avg_cs",
                stored: stored_avg,
                computed: c.avg_cs,
            });
        }
    }

    for (a, row) in cooccurrence_matrix(&movie.entries) {
        for (b, cell) in row {
            let stored = movie.cooccurrence(&a, &b);
            if stored.count != cell.count {
                found.push(Drift {
                    subject: format!("{} -> {}", a, b),
                    field: "count",
                    stored: stored.count as f64,
                    computed: cell.count as f64,
                });
            } else if cell.count > 0 && differs(stored.avg_cs, cell.avg_cs) {
                found.push(Drift {
                    subject: format!("{} -> {}", a, b),
                    field: "avg_cs",
                    stored: stored.avg_cs,
                    computed: cell.avg_cs,
                });
            }
        }
    }

    if !found.is_empty() {
        log::debug!("{} statistics differ from the entries", found.len());
    }
    found
}
