//! Journey: planning a day of study
//!
//! Daily caps, the learning-first rule, deck statistics and the workload
//! forecast, all over a real SQLite deck.

use cadence_core::{CardState, DeckSettings, SchedulerError};
use cadence_e2e_tests::{TestClock, TestDataFactory, TestDatabaseManager};
use chrono::Duration;
use uuid::Uuid;

#[test]
fn test_new_card_cap_takes_oldest_first() {
    let db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 20, clock.now());

    let settings = TestDataFactory::settings_with_caps(5, 100);
    let plan = db
        .engine
        .generate_study_plan(deck, clock.now().date_naive(), &settings)
        .unwrap();

    assert_eq!(plan.new_cards.len(), 5);
    assert_eq!(plan.total_cards, 5);
    let planned: Vec<Uuid> = plan.new_cards.iter().map(|c| c.id).collect();
    let oldest: Vec<Uuid> = cards.iter().take(5).map(|c| c.id).collect();
    assert_eq!(planned, oldest);
    assert_eq!(plan.estimated_duration_minutes, 3);
}

#[test]
fn test_mixed_plan_respects_caps() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 12, clock.now());

    // Six cards graduate straight to review (8-day interval), staggered by an hour
    for (i, card) in cards.iter().take(6).enumerate() {
        db.engine
            .review_card(card.id, 4, 1_000, clock.now() + Duration::hours(i as i64))
            .unwrap();
    }
    // Two cards enter learning
    for card in &cards[6..8] {
        db.engine.review_card(card.id, 1, 1_000, clock.now()).unwrap();
    }
    // One new card is suspended
    db.engine.suspend_card(cards[11].id, clock.now()).unwrap();

    let day = clock.advance_days(8).date_naive();
    let before = db.engine.get_card(cards[0].id).unwrap();
    let settings = TestDataFactory::settings_with_caps(2, 4);
    let plan = db.engine.generate_study_plan(deck, day, &settings).unwrap();

    assert_eq!(plan.learning_cards.len(), 2);
    assert_eq!(plan.review_cards.len(), 4);
    let reviews: Vec<Uuid> = plan.review_cards.iter().map(|c| c.id).collect();
    let earliest: Vec<Uuid> = cards.iter().take(4).map(|c| c.id).collect();
    assert_eq!(reviews, earliest);
    assert_eq!(plan.new_cards.len(), 2);
    assert!(plan.new_cards.iter().all(|c| c.state == CardState::New));
    assert!(plan.cards().all(|c| c.id != cards[11].id));
    assert_eq!(plan.total_cards, 8);
    assert_eq!(plan.estimated_duration_minutes, 4);

    // Planning is read-only
    assert_eq!(db.engine.get_card(cards[0].id).unwrap(), before);
}

#[test]
fn test_stored_settings_drive_plan_for_deck() {
    let db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    TestDataFactory::vocabulary_deck(&db.engine, deck, 30, clock.now());
    let today = clock.now().date_naive();

    assert!(matches!(
        db.engine.plan_for_deck(deck, today),
        Err(SchedulerError::DeckNotFound(id)) if id == deck
    ));

    let invalid = DeckSettings {
        new_cards_per_day: -3,
        ..Default::default()
    };
    assert!(matches!(
        db.engine.save_deck_settings(deck, &invalid),
        Err(SchedulerError::Validation(_))
    ));

    db.engine
        .save_deck_settings(deck, &TestDataFactory::settings_with_caps(10, 50))
        .unwrap();
    assert_eq!(db.engine.deck_settings(deck).unwrap().new_cards_per_day, 10);

    let plan = db.engine.plan_for_deck(deck, today).unwrap();
    assert_eq!(plan.new_cards.len(), 10);
    assert_eq!(plan.estimated_duration_minutes, 5);
}

#[test]
fn test_deck_stats_and_forecast() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 6, clock.now());
    let now = clock.now() + Duration::minutes(1);

    db.engine.review_card(cards[0].id, 4, 2_000, now).unwrap();
    db.engine.review_card(cards[1].id, 3, 4_000, now).unwrap();
    db.engine.review_card(cards[2].id, 1, 6_000, now).unwrap();
    db.engine.bury_card(cards[3].id, now).unwrap();
    db.engine.suspend_card(cards[4].id, now).unwrap();

    let stats = db.engine.calculate_deck_stats(deck, now).unwrap();
    assert_eq!(stats.total_cards, 6);
    assert_eq!(stats.new_cards, 3);
    assert_eq!(stats.learning_cards, 2);
    assert_eq!(stats.review_cards, 1);
    assert_eq!(stats.suspended_cards, 1);
    assert_eq!(stats.buried_cards, 1);
    assert_eq!(stats.total_reviews, 3);
    assert_eq!(stats.reviews_today, 3);
    assert!((stats.average_grade - 8.0 / 3.0).abs() < 1e-9);
    assert!((stats.average_retention - 2.0 / 3.0).abs() < 1e-9);
    assert!((stats.average_response_time_ms - 4_000.0).abs() < 1e-9);

    let forecast = db.engine.forecast(Some(deck), None, now).unwrap();
    assert_eq!(forecast.days.len(), 7);
    // Today: two learning cards and the untouched new card
    assert_eq!(forecast.days[0].learning, 2);
    assert_eq!(forecast.days[0].new, 1);
    // The buried new card waits until tomorrow
    assert_eq!(forecast.days[1].new, 1);
    // The Easy card is due in 8 days, beyond the default horizon
    assert_eq!(forecast.total(), 4);

    let longer = db.engine.forecast(Some(deck), Some(10), now).unwrap();
    assert_eq!(longer.days[8].review, 1);
    assert_eq!(longer.total(), 5);
}
