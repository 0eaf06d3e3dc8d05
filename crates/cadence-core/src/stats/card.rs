//! Per-card statistics

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{average_duration_ms, average_grade, days_between, retrievability};
use crate::card::{Card, CardState, Grade};
use crate::review::ReviewLogEntry;
use crate::selection::SECONDS_PER_DAY;

/// Coarse learning stage derived from the current interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Maturity {
    /// Never reviewed
    New,
    /// Interval below the maturity threshold
    Young,
    /// Interval at or above the maturity threshold
    Mature,
}

impl Maturity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Maturity::New => "new",
            Maturity::Young => "young",
            Maturity::Mature => "mature",
        }
    }
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statistics for one card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub card_id: Uuid,
    pub state: CardState,
    pub review_count: usize,
    /// Reviews graded Again
    pub lapses: usize,
    pub average_grade: f64,
    pub average_duration_ms: f64,
    /// Current probability of recall; `None` if never reviewed
    pub retrievability: Option<f64>,
    pub maturity: Maturity,
    /// Whole days from the last review to the due date
    pub current_interval_days: i64,
    pub leech_count: u32,
}

impl CardStats {
    /// Compute statistics from a card and its review log
    pub fn calculate(
        card: &Card,
        reviews: &[ReviewLogEntry],
        now: DateTime<Utc>,
        maturity_threshold_days: i64,
    ) -> Self {
        let reviews: Vec<&ReviewLogEntry> = reviews.iter().filter(|r| r.card_id == card.id).collect();

        let current_interval_days = card
            .last_review
            .map(|last| ((card.due - last).num_seconds() / SECONDS_PER_DAY).max(0))
            .unwrap_or(0);

        let maturity = if card.state == CardState::New || !card.is_reviewed() {
            Maturity::New
        } else if current_interval_days >= maturity_threshold_days {
            Maturity::Mature
        } else {
            Maturity::Young
        };

        Self {
            card_id: card.id,
            state: card.state,
            review_count: reviews.len(),
            lapses: reviews.iter().filter(|r| r.grade == Grade::Again).count(),
            average_grade: average_grade(reviews.iter().copied()),
            average_duration_ms: average_duration_ms(reviews.iter().copied()),
            retrievability: card.last_review.map(|last| {
                retrievability(card.memory_model.stability, days_between(last, now))
            }),
            maturity,
            current_interval_days,
            leech_count: card.leech_count,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
