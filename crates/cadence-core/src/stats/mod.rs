//! Retention Statistics
//!
//! Read-only aggregates over cards and the review log:
//!
//! - `DeckStats`: state counts, due load and review-history averages
//! - `CardStats`: per-card history, retrievability and maturity
//! - `PerformanceForecast`: projected retrievability without further reviews
//! - `Forecast`: due-card workload per calendar day
//!
//! Retrievability follows the exponential forgetting curve
//! `R(t) = exp(-t / S)` with `t` in days since the last review and `S` the
//! card's stability in days.

mod card;
mod deck;
mod forecast;

pub use card::{CardStats, Maturity};
pub use deck::DeckStats;
pub use forecast::{Forecast, ForecastDay, PerformanceForecast, PerformancePoint, PerformancePoints};

use chrono::{DateTime, Utc};

use crate::review::ReviewLogEntry;

/// Probability of recall after `elapsed_days` at the given stability
///
/// Returns 1.0 at zero elapsed time. Non-positive stability yields 0.0.
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    if !(stability > 0.0) {
        return 0.0;
    }
    (-elapsed_days.max(0.0) / stability).exp()
}

/// Fractional days between two instants, clamped at 0
pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 86_400_000.0).max(0.0)
}

/// Mean ordinal grade (1..=4); 0 for an empty log
pub(crate) fn average_grade<'a, I>(reviews: I) -> f64
where
    I: IntoIterator<Item = &'a ReviewLogEntry>,
{
    mean(reviews.into_iter().map(|r| f64::from(r.grade.value())))
}

/// Mean answer time in milliseconds; 0 for an empty log
pub(crate) fn average_duration_ms<'a, I>(reviews: I) -> f64
where
    I: IntoIterator<Item = &'a ReviewLogEntry>,
{
    mean(reviews.into_iter().map(|r| r.duration_ms as f64))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
