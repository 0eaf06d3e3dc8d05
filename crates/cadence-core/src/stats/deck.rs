//! Deck-level statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{average_duration_ms, average_grade};
use crate::card::{Card, CardState};
use crate::review::ReviewLogEntry;
use crate::selection::{next_day_start, overdue_by_days};

/// Aggregate view of a deck
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub deck_id: Uuid,
    pub total_cards: usize,
    pub new_cards: usize,
    pub learning_cards: usize,
    pub review_cards: usize,
    pub relearning_cards: usize,
    pub suspended_cards: usize,
    pub buried_cards: usize,
    /// Non-suspended cards due by the end of today
    pub due_today: usize,
    /// Non-suspended cards at least one whole day late
    pub overdue: usize,
    pub total_reviews: usize,
    pub reviews_today: usize,
    /// Mean ordinal grade over the whole history
    pub average_grade: f64,
    /// Fraction of reviews graded Good or Easy
    pub average_retention: f64,
    /// Mean answer time in milliseconds
    pub average_response_time_ms: f64,
}

impl DeckStats {
    /// Aggregate a deck's cards and review history at `now`
    pub fn calculate(
        deck_id: Uuid,
        cards: &[Card],
        reviews: &[ReviewLogEntry],
        now: DateTime<Utc>,
    ) -> Self {
        let mut stats = DeckStats {
            deck_id,
            total_cards: cards.len(),
            total_reviews: reviews.len(),
            ..Default::default()
        };

        let today = now.date_naive();
        let tomorrow = next_day_start(today);
        let today_start = today.and_time(chrono::NaiveTime::MIN).and_utc();

        for card in cards {
            match card.state {
                CardState::New => stats.new_cards += 1,
                CardState::Learning => stats.learning_cards += 1,
                CardState::Review => stats.review_cards += 1,
                CardState::Relearning => stats.relearning_cards += 1,
            }
            if card.suspended {
                stats.suspended_cards += 1;
                continue;
            }
            if card.buried {
                stats.buried_cards += 1;
            }
            if card.due < tomorrow {
                stats.due_today += 1;
            }
            if overdue_by_days(card.due, now) >= 1 {
                stats.overdue += 1;
            }
        }

        if !reviews.is_empty() {
            let successes = reviews.iter().filter(|r| r.is_success()).count();
            stats.average_grade = average_grade(reviews);
            stats.average_retention = successes as f64 / reviews.len() as f64;
            stats.average_response_time_ms = average_duration_ms(reviews);
            stats.reviews_today = reviews
                .iter()
                .filter(|r| r.timestamp >= today_start && r.timestamp < tomorrow)
                .count();
        }

        stats
    }
}

// ============================================================================
// TESTS
// ============================================================================
