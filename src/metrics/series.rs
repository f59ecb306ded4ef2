//! Numeric helpers shared by every chart: moving-window smoothing and the
//! sentiment color scale.
//!
//! # Gaps
//!
//! Series use `f64::NAN` as the gap marker. Gaps are skipped by the smoother
//! and survive it unchanged, and serialize to JSON `null` so chart layers can
//! span over them.
//!
//! # Color scale
//!
//! ```text
//!   -1.0            0.0            +1.0
//!   red  <-------  grey  ------->  green
//!   (220,70,60)  (180,180,180)  (50,170,30)
//! ```
//!
//! The interpolation factor is `|score|^0.4`, which pushes small scores
//! visibly away from grey.

use serde::{Serialize, Serializer};
use std::fmt;

/// An 8-bit RGB color, displayed as `rgb(r,g,b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const NEUTRAL: Rgb = Rgb(180, 180, 180);
pub const POSITIVE: Rgb = Rgb(50, 170, 30);
pub const NEGATIVE: Rgb = Rgb(220, 70, 60);

const COLOR_EXPONENT: f64 = 0.4;

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Color for a compound score on the red-grey-green continuum.
/// Scores of exactly zero and NaN map to the neutral grey.
pub fn color_for(score: f64) -> Rgb {
    if score.is_nan() {
        return NEUTRAL;
    }
    let f = score.abs().powf(COLOR_EXPONENT);
    let target = if score > 0.0 { POSITIVE } else { NEGATIVE };
    interpolate(NEUTRAL, target, f)
}

fn interpolate(from: Rgb, to: Rgb, f: f64) -> Rgb {
    let channel = |a: u8, b: u8| (a as f64 * (1.0 - f) + b as f64 * f).floor() as u8;
    Rgb(channel(from.0, to.0), channel(from.1, to.1), channel(from.2, to.2))
}

/// Default smoothing window: a fifth of the series
pub fn default_window(len: usize) -> usize {
    (len as f64 / 5.0).round() as usize
}

/// Trailing moving average over `[i - window, i]`.
///
/// Window positions before the start are folded back by absolute value
/// (`j = -2` reads index 2), so early points average over values that follow
/// them. NaN values are left out of both the sum and the window size, and a
/// NaN input point stays NaN. A window that folds past the end of a short
/// series yields NaN. Windows of 0 or 1 return the input unchanged.
pub fn smooth(series: &[f64], window: Option<usize>) -> Vec<f64> {
    let window = window.unwrap_or_else(|| default_window(series.len()));
    if window <= 1 {
        return series.to_vec();
    }

    series
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            if value.is_nan() {
                return f64::NAN;
            }

            let mut sum = 0.0;
            let mut count = 0usize;
            for j in (i as isize - window as isize)..=(i as isize) {
                match series.get(j.unsigned_abs()) {
                    Some(v) if v.is_nan() => {}
                    Some(v) => {
                        sum += v;
                        count += 1;
                    }
                    None => return f64::NAN,
                }
            }
            sum / count as f64
        })
        .collect()
}

/// Arithmetic mean, NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
