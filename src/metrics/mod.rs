//! Derived metrics over a movie's entries
//!
//! Every function here is pure: it borrows the entries (or the document),
//! never mutates them, and returns plain data ready to be charted.
//!
//! - [`adjacency`]: who speaks next to whom inside a scene
//! - [`character`]: one character's lines and per-scene averages
//! - [`pairwise`]: turn-taking between two characters
//! - [`direction`]: sentiment of the stage directions
//! - [`series`]: smoothing and the sentiment color scale
//! - [`stats`]: ingestion statistics rebuilt from the entries

pub mod adjacency;
pub mod character;
pub mod direction;
pub mod pairwise;
pub mod series;
pub mod stats;

pub use adjacency::{find_adjacent_character, Direction};
pub use character::{character_timeline, CharacterTimeline};
pub use direction::{direction_timeline, DirectionTimeline};
pub use pairwise::{pairwise_timeline, PairwiseOutcome, PairwiseTimeline};
pub use series::{color_for, smooth, Rgb};
