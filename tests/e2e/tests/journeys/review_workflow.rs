//! Journey: create cards and take them through their review lifecycle
//!
//! Create -> learn -> graduate -> lapse -> relearn, plus the lifecycle
//! toggles a learner reaches for along the way (suspend, bury, reset).

use cadence_core::{CardState, DuePriority, Grade, Maturity, NewCard, SchedulerError};
use cadence_e2e_tests::{TestClock, TestDataFactory, TestDatabaseManager};
use chrono::Duration;
use uuid::Uuid;

#[test]
fn test_new_card_graduates_through_learning() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();

    let card = db
        .engine
        .initialize_card(NewCard::new(deck, "la luna", "the moon"), clock.now())
        .unwrap();
    assert_eq!(card.state, CardState::New);

    let first = db.engine.review_card(card.id, 3, 5_000, clock.now()).unwrap();
    assert!(first.card.due > card.due);
    assert_eq!(first.card.state, CardState::Learning);

    let second = db
        .engine
        .review_card(card.id, 3, 4_000, clock.advance(Duration::minutes(10)))
        .unwrap();
    assert_eq!(second.card.state, CardState::Review);
    assert_eq!(second.card.due, clock.now() + Duration::days(13));
    assert_eq!(second.review.state_before, CardState::Learning);
    assert_eq!(second.review.due_before, first.card.due);

    let history = db.engine.card_reviews(card.id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.grade == Grade::Good));
}

#[test]
fn test_lapse_and_relearn() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let card = TestDataFactory::vocabulary_deck(&db.engine, deck, 1, clock.now()).remove(0);

    let easy = db.engine.review_card(card.id, 4, 2_000, clock.now()).unwrap();
    assert_eq!(easy.card.state, CardState::Review);
    assert_eq!(easy.card.due, clock.now() + Duration::days(8));

    clock.advance_days(8);
    let lapse = db.engine.review_card(card.id, 1, 9_000, clock.now()).unwrap();
    assert_eq!(lapse.card.state, CardState::Relearning);
    assert_eq!(lapse.card.leech_count, 1);

    let relearned = db
        .engine
        .review_card(card.id, 3, 3_000, clock.advance(Duration::minutes(10)))
        .unwrap();
    assert_eq!(relearned.card.state, CardState::Review);
    assert_eq!(relearned.card.leech_count, 1);

    let stats = db.engine.calculate_card_stats(card.id, clock.now()).unwrap();
    assert_eq!(stats.review_count, 3);
    assert_eq!(stats.lapses, 1);
    assert_eq!(stats.maturity, Maturity::Young);
    assert_eq!(stats.current_interval_days, 6);
    assert!((stats.average_grade - 8.0 / 3.0).abs() < 1e-9);
    assert!((stats.retrievability.unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_repeated_again_marks_leech_without_suspending() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let card = TestDataFactory::vocabulary_deck(&db.engine, deck, 1, clock.now()).remove(0);

    let grades = [Grade::Again; 5];
    let outcomes = TestDataFactory::review_history(
        &mut db.engine,
        card.id,
        &grades,
        clock.now(),
        Duration::minutes(1),
    );

    let last = outcomes.last().unwrap();
    assert_eq!(last.card.leech_count, 5);
    assert!(!last.card.suspended);

    let due = db
        .engine
        .get_due_cards(Some(deck), None, clock.now() + Duration::minutes(5))
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].priority, DuePriority::Learning);
}

#[test]
fn test_easy_streak_reaches_maturity() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let card = TestDataFactory::vocabulary_deck(&db.engine, deck, 1, clock.now()).remove(0);

    // Stability 2 -> 8 -> 32 days
    let outcomes = TestDataFactory::review_history(
        &mut db.engine,
        card.id,
        &[Grade::Easy, Grade::Easy],
        clock.now(),
        Duration::days(8),
    );
    let reviewed_at = outcomes[1].review.timestamp;

    let stats = db.engine.calculate_card_stats(card.id, reviewed_at).unwrap();
    assert_eq!(stats.current_interval_days, 32);
    assert_eq!(stats.maturity, Maturity::Mature);
}

#[test]
fn test_suspend_bury_and_reset() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 3, clock.now());
    let now = clock.advance(Duration::minutes(1));

    db.engine.suspend_card(cards[0].id, now).unwrap();
    db.engine.bury_card(cards[1].id, now).unwrap();

    let err = db.engine.review_card(cards[0].id, 3, 0, now).unwrap_err();
    assert!(matches!(err, SchedulerError::CardSuspended(_)));
    assert!(err.is_excluded_card());
    assert!(matches!(
        db.engine.review_card(cards[1].id, 3, 0, now),
        Err(SchedulerError::CardBuried(_))
    ));

    let due: Vec<Uuid> = db
        .engine
        .get_due_cards(Some(deck), None, now)
        .unwrap()
        .into_iter()
        .map(|d| d.card.id)
        .collect();
    assert_eq!(due, vec![cards[2].id]);

    let now = clock.advance_days(1);
    assert_eq!(db.engine.unbury_all(deck, now).unwrap(), 1);
    db.engine.unsuspend_card(cards[0].id, now).unwrap();
    assert_eq!(db.engine.get_due_cards(Some(deck), None, now).unwrap().len(), 3);

    db.engine.review_card(cards[0].id, 4, 0, now).unwrap();
    let reset = db.engine.reset_card(cards[0].id, clock.advance_days(2)).unwrap();
    assert_eq!(reset.state, CardState::New);
    assert!(reset.last_review.is_none());
    assert_eq!(db.engine.card_reviews(cards[0].id).unwrap().len(), 1);

    let again = db.engine.review_card(cards[0].id, 3, 0, clock.now()).unwrap();
    assert_eq!(again.review.state_before, CardState::New);
}

#[test]
fn test_unknown_card_everywhere() {
    let mut db = TestDatabaseManager::new_temp();
    let now = TestClock::default().now();
    let missing = Uuid::new_v4();

    assert!(matches!(db.engine.get_card(missing), Err(SchedulerError::CardNotFound(_))));
    assert!(matches!(
        db.engine.review_card(missing, 3, 0, now),
        Err(SchedulerError::CardNotFound(_))
    ));
    assert!(matches!(
        db.engine.suspend_card(missing, now),
        Err(SchedulerError::CardNotFound(_))
    ));
    assert!(matches!(
        db.engine.predict_performance(missing, 7, now),
        Err(SchedulerError::CardNotFound(_))
    ));
    assert!(db.is_empty());
}

#[test]
fn test_performance_prediction_declines() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let card = TestDataFactory::vocabulary_deck(&db.engine, deck, 1, clock.now()).remove(0);
    db.engine.review_card(card.id, 4, 0, clock.now()).unwrap();

    let prediction = db.engine.predict_performance(card.id, 30, clock.now()).unwrap();
    let points: Vec<f64> = prediction.iter().map(|p| p.retrievability).collect();
    assert_eq!(points.len(), 30);
    assert!(points.windows(2).all(|w| w[1] < w[0]));
    assert!(points[0] < 1.0);

    // Restartable: a second pass yields the same values
    let again: Vec<f64> = (&prediction).into_iter().map(|p| p.retrievability).collect();
    assert_eq!(points, again);

    let preview = db.engine.preview_review(card.id, clock.now()).unwrap();
    assert!(preview.easy.due > preview.hard.due);
    assert_eq!(db.engine.card_reviews(card.id).unwrap().len(), 1);
}
