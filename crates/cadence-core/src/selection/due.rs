//! Due-card prioritization
//!
//! Cards are bucketed, then ordered bucket by bucket:
//!
//! 1. `Learning` - Learning/Relearning cards, regardless of due date
//! 2. `Overdue` - Review cards at least one whole day late
//! 3. `Review` - other cards whose due date has arrived
//! 4. `New` - never-reviewed cards
//!
//! Within a bucket the earliest due date comes first. Lapsed cards therefore
//! never wait behind fresh reviews or new material.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::overdue_by_days;
use crate::card::{Card, CardState};

/// Priority bucket of a due card; declaration order is queue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuePriority {
    Learning,
    Overdue,
    Review,
    New,
}

impl DuePriority {
    /// Bucket for a card at `now`
    pub fn classify(card: &Card, overdue_days: i64, now: DateTime<Utc>) -> Self {
        match card.state {
            CardState::Learning | CardState::Relearning => DuePriority::Learning,
            CardState::New => DuePriority::New,
            CardState::Review if card.due <= now && overdue_days > 0 => DuePriority::Overdue,
            CardState::Review => DuePriority::Review,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DuePriority::Learning => "learning",
            DuePriority::Overdue => "overdue",
            DuePriority::Review => "review",
            DuePriority::New => "new",
        }
    }
}

impl fmt::Display for DuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A card in the study queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueCard {
    pub card: Card,
    pub due_date: DateTime<Utc>,
    /// Whole days past due, 0 if not late
    pub overdue_by_days: i64,
    pub priority: DuePriority,
}

impl DueCard {
    pub fn new(card: Card, now: DateTime<Utc>) -> Self {
        let overdue = overdue_by_days(card.due, now);
        let priority = DuePriority::classify(&card, overdue, now);
        Self {
            due_date: card.due,
            overdue_by_days: overdue,
            priority,
            card,
        }
    }
}

/// Build the prioritized queue from candidate cards
///
/// Suspended and buried cards are dropped, as are cards that are neither due
/// nor in a learning state. `limit` applies after sorting.
pub fn select_due_cards<I>(cards: I, now: DateTime<Utc>, limit: Option<usize>) -> Vec<DueCard>
where
    I: IntoIterator<Item = Card>,
{
    let mut queue: Vec<DueCard> = cards
        .into_iter()
        .filter(|card| card.is_available())
        .filter(|card| card.is_due(now) || card.state.is_learning())
        .map(|card| DueCard::new(card, now))
        .collect();

    queue.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.due_date.cmp(&b.due_date))
            .then_with(|| a.card.id.cmp(&b.card.id))
    });

    if let Some(limit) = limit {
        queue.truncate(limit);
    }
    queue
}

// ============================================================================
// TESTS
// ============================================================================
