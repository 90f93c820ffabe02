//! Spaced-repetition scheduling policy.
//!
//! Confidence maps to a review interval through a fixed bucket table, and is
//! itself updated as a fixed-weight moving average of quiz performance. These
//! are product policy constants, not derived quantities.

use chrono::{DateTime, Duration, Utc};

/// Weight kept from the previous confidence in the moving average.
pub const CONFIDENCE_CARRYOVER: f64 = 0.7;
/// Weight given to the newest performance score.
pub const PERFORMANCE_WEIGHT: f64 = 0.3;

/// Weight of answer accuracy in the performance score.
pub const ACCURACY_WEIGHT: f64 = 0.6;
/// Weight of answer completeness in the performance score.
pub const COMPLETENESS_WEIGHT: f64 = 0.4;

/// Review interval in days for a given confidence.
///
/// Bucket table (boundaries inclusive): >=0.9 -> 30d, >=0.8 -> 14d,
/// >=0.6 -> 7d, >=0.4 -> 3d, otherwise 1d.
#[must_use]
pub fn review_interval_days(confidence: f64) -> i64 {
    if confidence >= 0.9 {
        30
    } else if confidence >= 0.8 {
        14
    } else if confidence >= 0.6 {
        7
    } else if confidence >= 0.4 {
        3
    } else {
        1
    }
}

/// Next review timestamp for a concept at the given confidence.
#[must_use]
pub fn next_review_at(now: DateTime<Utc>, confidence: f64) -> DateTime<Utc> {
    now + Duration::days(review_interval_days(confidence))
}

/// Combine accuracy and completeness into a single performance score.
#[must_use]
pub fn performance_score(accuracy: f64, completeness: f64) -> f64 {
    (accuracy.clamp(0.0, 1.0) * ACCURACY_WEIGHT
        + completeness.clamp(0.0, 1.0) * COMPLETENESS_WEIGHT)
        .clamp(0.0, 1.0)
}

/// Update confidence from a new performance score.
///
/// `0.7 * old + 0.3 * performance`, clamped to [0,1].
#[must_use]
pub fn updated_confidence(old: f64, performance: f64) -> f64 {
    (CONFIDENCE_CARRYOVER * old.clamp(0.0, 1.0)
        + PERFORMANCE_WEIGHT * performance.clamp(0.0, 1.0))
    .clamp(0.0, 1.0)
}
