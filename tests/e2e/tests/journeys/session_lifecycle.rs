//! Journey: study sessions
//!
//! One open session per engine instance, wall-clock durations, persisted
//! progress and resuming a session from another instance.

use cadence_core::{Grade, SchedulerError, Storage};
use cadence_e2e_tests::{TestClock, TestDataFactory, TestDatabaseManager};
use chrono::Duration;
use uuid::Uuid;

#[test]
fn test_session_counts_and_durations() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 4, clock.now());

    let session = db.engine.start_session(Some(deck), clock.now()).unwrap();
    assert!(session.is_open());
    assert_eq!(db.engine.current_session().unwrap().id, session.id);

    let grades = [Grade::Good, Grade::Again, Grade::Easy, Grade::Hard];
    for (card, grade) in cards.iter().zip(grades) {
        let outcome = db
            .engine
            .review_card(card.id, grade.value(), 6_000, clock.advance(Duration::seconds(30)))
            .unwrap();
        assert_eq!(outcome.review.session_id, Some(session.id));
    }

    // Card 1 is in Learning now, so this one counts as a review card
    db.engine
        .review_card(cards[1].id, 3, 4_000, clock.advance(Duration::seconds(30)))
        .unwrap();

    let ended = db
        .engine
        .end_session(clock.advance(Duration::seconds(50)))
        .unwrap()
        .expect("session was open");

    assert_eq!(ended.cards_reviewed, 5);
    assert_eq!(ended.new_cards, 4);
    assert_eq!(ended.review_cards, 1);
    assert_eq!(ended.counts_by_grade.good, 2);
    assert_eq!(ended.counts_by_grade.again, 1);
    assert_eq!(ended.total_duration_ms, 200_000);
    assert_eq!(ended.average_duration_ms, 40_000);
    assert!((ended.success_rate() - 0.6).abs() < 1e-9);
    assert!(db.engine.current_session().is_none());

    let stored = db.storage.load_session(ended.id).unwrap().unwrap();
    assert_eq!(stored, ended);
}

#[test]
fn test_single_open_session_per_engine() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();

    assert!(db.engine.end_session(clock.now()).unwrap().is_none());

    let open = db.engine.start_session(None, clock.now()).unwrap();
    let err = db.engine.start_session(None, clock.now()).unwrap_err();
    assert!(matches!(err, SchedulerError::SessionActive(id) if id == open.id));

    let ended = db.engine.end_session(clock.now()).unwrap().unwrap();
    assert_eq!(ended.total_duration_ms, 0);
    assert_eq!(ended.average_duration_ms, 0);
    assert!(db.engine.end_session(clock.now()).unwrap().is_none());
}

#[test]
fn test_engines_study_decks_side_by_side() {
    let mut db = TestDatabaseManager::new_temp();
    let mut other = db.second_engine();
    let clock = TestClock::default();

    let spanish = Uuid::new_v4();
    let german = Uuid::new_v4();
    let spanish_cards = TestDataFactory::vocabulary_deck(&db.engine, spanish, 2, clock.now());
    let german_cards = TestDataFactory::vocabulary_deck(&other, german, 3, clock.now());

    let first = db.engine.start_session(Some(spanish), clock.now()).unwrap();
    let second = other.start_session(Some(german), clock.now()).unwrap();
    assert_ne!(first.id, second.id);

    for card in &spanish_cards {
        db.engine.review_card(card.id, 3, 1_000, clock.now()).unwrap();
    }
    for card in &german_cards {
        other.review_card(card.id, 4, 1_000, clock.now()).unwrap();
    }

    assert_eq!(db.engine.current_session().unwrap().cards_reviewed, 2);
    assert_eq!(other.current_session().unwrap().cards_reviewed, 3);
    assert_eq!(db.deck_review_count(spanish), 2);
    assert_eq!(db.deck_review_count(german), 3);
}

#[test]
fn test_resume_after_engine_restart() {
    let db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();

    let session_id = {
        let mut engine = db.second_engine();
        let cards = TestDataFactory::vocabulary_deck(&engine, deck, 3, clock.now());
        let session = engine.start_session(Some(deck), clock.now()).unwrap();
        for card in &cards {
            engine
                .review_card(card.id, 3, 2_000, clock.advance(Duration::seconds(10)))
                .unwrap();
        }
        session.id
        // engine dropped without ending the session
    };

    let mut engine = db.second_engine();
    let resumed = engine.resume_session(session_id).unwrap();
    assert_eq!(resumed.cards_reviewed, 3);
    assert_eq!(resumed.new_cards, 3);

    let ended = engine
        .end_session(clock.advance(Duration::seconds(30)))
        .unwrap()
        .unwrap();
    assert_eq!(ended.id, session_id);
    assert_eq!(ended.total_duration_ms, 60_000);
    assert_eq!(ended.average_duration_ms, 20_000);

    let mut late = db.second_engine();
    assert!(matches!(
        late.resume_session(session_id),
        Err(SchedulerError::Validation(_))
    ));
}
