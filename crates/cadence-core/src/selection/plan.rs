//! Daily study plans

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::next_day_start;
use crate::card::{Card, CardState};
use crate::config::DeckSettings;

/// The cards to study in one deck on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub date: NaiveDate,
    pub deck_id: Uuid,
    /// Every available Learning/Relearning card (never capped)
    pub learning_cards: Vec<Card>,
    /// Review cards due by the end of `date`, earliest due first
    pub review_cards: Vec<Card>,
    /// New cards, oldest created first
    pub new_cards: Vec<Card>,
    pub total_cards: usize,
    pub estimated_duration_minutes: u64,
}

impl StudyPlan {
    /// Build a plan from the deck's cards
    ///
    /// `settings` must already be validated; negative caps are treated as 0.
    pub fn build(
        deck_id: Uuid,
        cards: Vec<Card>,
        date: NaiveDate,
        settings: &DeckSettings,
        seconds_per_card: u32,
    ) -> Self {
        let cutoff = next_day_start(date);
        let mut learning_cards = Vec::new();
        let mut review_cards = Vec::new();
        let mut new_cards = Vec::new();

        for card in cards
            .into_iter()
            .filter(|c| c.deck_id == deck_id && c.is_available())
        {
            match card.state {
                CardState::Learning | CardState::Relearning => learning_cards.push(card),
                CardState::Review if card.due < cutoff => review_cards.push(card),
                CardState::Review => {}
                CardState::New => new_cards.push(card),
            }
        }

        learning_cards.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        review_cards.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        review_cards.truncate(cap(settings.max_reviews_per_day));
        new_cards.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        new_cards.truncate(cap(settings.new_cards_per_day));

        let total_cards = learning_cards.len() + review_cards.len() + new_cards.len();
        let estimated_duration_minutes =
            (total_cards as u64 * u64::from(seconds_per_card)).div_ceil(60);

        Self {
            date,
            deck_id,
            learning_cards,
            review_cards,
            new_cards,
            total_cards,
            estimated_duration_minutes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_cards == 0
    }

    /// All planned cards: learning, then reviews, then new
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.learning_cards
            .iter()
            .chain(&self.review_cards)
            .chain(&self.new_cards)
    }
}

fn cap(limit: i32) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================
