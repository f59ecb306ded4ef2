//! Speaker adjacency within a scene
//!
//! Two characters "interact" when their cues are neighbours inside the same
//! scene: walking away from a cue, the first cue naming someone else is the
//! adjacent speaker. Repeated cues of the same speaker are skipped, and a
//! `LOCATION` entry ends the walk because conversations never cross scenes.

use crate::movie::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Name of the nearest different speaker from the cue at `index`.
///
/// Returns `None` when a scene boundary or either end of the script comes
/// first, or when `index` does not point at a `CHARACTER` entry.
pub fn find_adjacent_character(entries: &[Entry], index: usize, direction: Direction) -> Option<&str> {
    let origin = entries.get(index)?.character()?;
    let mut i = index;

    loop {
        i = match direction {
            Direction::Forward if i + 1 < entries.len() => i + 1,
            Direction::Forward => return None,
            Direction::Backward => i.checked_sub(1)?,
        };

        match &entries[i] {
            Entry::Location { .. } => return None,
            Entry::Character { content } if content != origin => return Some(content),
            _ => {}
        }
    }
}

/// Previous different speaker in the scene
pub fn previous_character(entries: &[Entry], index: usize) -> Option<&str> {
    find_adjacent_character(entries, index, Direction::Backward)
}

/// Next different speaker in the scene
pub fn next_character(entries: &[Entry], index: usize) -> Option<&str> {
    find_adjacent_character(entries, index, Direction::Forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::fixtures::*;

    // ==========================================================================
    // ADJACENCY SCAN TESTS
    // ==========================================================================
    //
    // Layout used by most tests (index: entry):
    //
    //   0: LOCATION      4: CHARACTER B    8: LOCATION
    //   1: CHARACTER A   5: SPEECH         9: CHARACTER C
    //   2: SPEECH        6: CHARACTER A   10: SPEECH
    //   3: CHARACTER A   7: SPEECH
    // ==========================================================================

    fn scene() -> Vec<Entry> {
        vec![
            location("INT. ROOM"),
            cue("A"),
            speech("one", 0.1),
            cue("A"),
            cue("B"),
            speech("two", 0.2),
            cue("A"),
            speech("three", 0.3),
            location("EXT. STREET"),
            cue("C"),
            speech("four", 0.4),
        ]
    }

    #[test]
    fn test_forward_skips_self_repeats() {
        let entries = scene();
        assert_eq!(next_character(&entries, 1), Some("B"));
    }

    #[test]
    fn test_backward_finds_previous_speaker() {
        let entries = scene();
        assert_eq!(previous_character(&entries, 6), Some("B"));
        assert_eq!(previous_character(&entries, 4), Some("A"));
    }

    #[test]
    fn test_location_stops_forward_scan() {
        let entries = scene();
        // A at 6 is the last cue of the first scene; C lives in the next one
        assert_eq!(next_character(&entries, 6), None);
    }

    #[test]
    fn test_location_stops_backward_scan() {
        let entries = scene();
        assert_eq!(previous_character(&entries, 9), None);
        assert_eq!(previous_character(&entries, 1), None);
    }

    #[test]
    fn test_sequence_ends_without_boundary() {
        let entries = vec![cue("A"), speech("hi", 0.0), cue("A"), speech("again", 0.0)];
        assert_eq!(previous_character(&entries, 0), None);
        assert_eq!(next_character(&entries, 2), None);
        // The same speaker at the very edge is still not a partner
        assert_eq!(previous_character(&entries, 2), None);
    }

    #[test]
    fn test_non_character_origin() {
        let entries = scene();
        assert_eq!(next_character(&entries, 2), None);
        assert_eq!(previous_character(&entries, 0), None);
    }

    #[test]
    fn test_out_of_range_origin() {
        let entries = scene();
        assert_eq!(next_character(&entries, 99), None);
        assert_eq!(previous_character(&[], 0), None);
    }

    #[test]
    fn test_never_returns_origin_or_crosses_scenes() {
        let entries = scene();
        for (i, e) in entries.iter().enumerate() {
            let Some(origin) = e.character() else { continue };
            for dir in [Direction::Forward, Direction::Backward] {
                if let Some(found) = find_adjacent_character(&entries, i, dir) {
                    assert_ne!(found, origin);
                    let pos = entries
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| e.character() == Some(found))
                        .map(|(j, _)| j)
                        .min_by_key(|j| j.abs_diff(i))
                        .unwrap();
                    let (lo, hi) = (pos.min(i), pos.max(i));
                    assert!(!entries[lo..=hi].iter().any(Entry::is_location));
                }
            }
        }
    }
}
