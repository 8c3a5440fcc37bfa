//! Score normalizer for 0-10 soft scores

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Clamp a bounded score into `[MIN_SCORE, MAX_SCORE]`.
///
/// Only for fields the schema declares bounded. Coordinates, populations and
/// market insights must never go through here.
pub fn clamp_score(value: f64) -> f64 {
    value.min(MAX_SCORE).max(MIN_SCORE)
}
