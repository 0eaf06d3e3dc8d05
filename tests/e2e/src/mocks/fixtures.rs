//! Test Data Factory
//!
//! Provides utilities for generating realistic study data:
//! - Decks of vocabulary cards with staggered creation times
//! - Review histories replayed through the engine
//! - Batch review requests for import scenarios
//! - A manual clock so journeys control "now"

use cadence_core::{
    Card, DeckSettings, Grade, NewCard, ReviewEngine, ReviewOutcome, ReviewRequest,
    SchedulingOracle, Storage,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

// ============================================================================
// CLOCK
// ============================================================================

/// Manually advanced clock
///
/// Starts at a fixed mid-morning instant so day boundaries are predictable.
#[derive(Debug, Clone, Copy)]
pub struct TestClock {
    now: DateTime<Utc>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::starting_at(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .single()
                .expect("valid start instant"),
        )
    }
}

impl TestClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Move forward and return the new instant
    pub fn advance(&mut self, by: Duration) -> DateTime<Utc> {
        self.now += by;
        self.now
    }

    pub fn advance_days(&mut self, days: i64) -> DateTime<Utc> {
        self.advance(Duration::days(days))
    }
}

// ============================================================================
// FACTORY
// ============================================================================

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let mut db = TestDatabaseManager::new_temp();
/// let deck = Uuid::new_v4();
/// let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 20, clock.now());
/// ```
pub struct TestDataFactory;

const VOCABULARY: [(&str, &str); 10] = [
    ("el perro", "the dog"),
    ("el gato", "the cat"),
    ("la casa", "the house"),
    ("el libro", "the book"),
    ("la mesa", "the table"),
    ("el agua", "the water"),
    ("la ciudad", "the city"),
    ("el tiempo", "the time / the weather"),
    ("la ventana", "the window"),
    ("el camino", "the road"),
];

impl TestDataFactory {
    /// Card input for the i-th vocabulary entry
    pub fn vocabulary_card(deck_id: Uuid, index: usize) -> NewCard {
        let (front, back) = VOCABULARY[index % VOCABULARY.len()];
        let tag = if index % 2 == 0 { "noun-m" } else { "noun-f" };
        NewCard::new(deck_id, format!("{} ({})", front, index), back).with_tags(["spanish", tag])
    }

    /// Create `count` cards, one second apart, oldest first
    pub fn vocabulary_deck<S, O>(
        engine: &ReviewEngine<S, O>,
        deck_id: Uuid,
        count: usize,
        start: DateTime<Utc>,
    ) -> Vec<Card>
    where
        S: Storage,
        O: SchedulingOracle,
    {
        (0..count)
            .map(|i| {
                engine
                    .initialize_card(
                        Self::vocabulary_card(deck_id, i),
                        start + Duration::seconds(i as i64),
                    )
                    .expect("Failed to initialize card")
            })
            .collect()
    }

    /// Replay grades against one card, `spacing` apart, starting at `start`
    pub fn review_history<S, O>(
        engine: &mut ReviewEngine<S, O>,
        card_id: Uuid,
        grades: &[Grade],
        start: DateTime<Utc>,
        spacing: Duration,
    ) -> Vec<ReviewOutcome>
    where
        S: Storage,
        O: SchedulingOracle,
    {
        grades
            .iter()
            .enumerate()
            .map(|(i, grade)| {
                engine
                    .review_card(card_id, grade.value(), 4_000, start + spacing * i as i32)
                    .expect("Failed to review card")
            })
            .collect()
    }

    /// One Good request per card, a minute apart
    pub fn import_requests(cards: &[Card], start: DateTime<Utc>) -> Vec<ReviewRequest> {
        cards
            .iter()
            .enumerate()
            .map(|(i, card)| {
                ReviewRequest::new(card.id, Grade::Good, 3_000, start + Duration::minutes(i as i64))
            })
            .collect()
    }

    /// Deck settings with explicit daily caps
    pub fn settings_with_caps(new_cards_per_day: i32, max_reviews_per_day: i32) -> DeckSettings {
        DeckSettings {
            new_cards_per_day,
            max_reviews_per_day,
            ..Default::default()
        }
    }
}
