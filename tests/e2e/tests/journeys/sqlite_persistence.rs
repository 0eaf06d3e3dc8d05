//! Journey: durability of the SQLite backend
//!
//! Everything written through one engine must come back unchanged through a
//! freshly opened database, a backup copy, or a search query.

use cadence_core::{
    CardFilter, CardQuery, CardSortField, CardState, DeckSettings, ReviewEngine, SortOrder,
    SqliteStorage, Storage,
};
use cadence_e2e_tests::{LadderOracle, TestClock, TestDataFactory, TestDatabaseManager};
use chrono::Duration;
use uuid::Uuid;

#[test]
fn test_state_survives_reopen() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 5, clock.now());

    let settings = DeckSettings {
        new_cards_per_day: 7,
        requested_retention: 0.85,
        ..Default::default()
    };
    db.engine.save_deck_settings(deck, &settings).unwrap();

    db.engine.start_session(Some(deck), clock.now()).unwrap();
    let reviewed = db
        .engine
        .review_card(cards[0].id, 1, 7_000, clock.advance(Duration::seconds(15)))
        .unwrap();
    let session = db
        .engine
        .end_session(clock.advance(Duration::seconds(15)))
        .unwrap()
        .unwrap();
    db.engine.bury_card(cards[1].id, clock.now()).unwrap();

    let reopened = db.reopen();
    assert_eq!(reopened.count_cards().unwrap(), 5);
    assert_eq!(reopened.load_card(cards[0].id).unwrap(), Some(reviewed.card.clone()));
    assert_eq!(reopened.load_card_reviews(cards[0].id).unwrap(), vec![reviewed.review]);
    assert_eq!(reopened.load_session(session.id).unwrap(), Some(session));
    assert_eq!(reopened.load_deck_settings(deck).unwrap(), Some(settings));
    assert!(reopened.load_card(cards[1].id).unwrap().unwrap().buried);

    // A new engine over the reopened database carries on where we stopped
    let mut engine = ReviewEngine::new(reopened, LadderOracle::default());
    let next = engine
        .review_card(cards[0].id, 3, 2_000, clock.advance(Duration::minutes(1)))
        .unwrap();
    assert_eq!(next.review.state_before, CardState::Learning);
    assert_eq!(next.card.leech_count, 1);
}

#[test]
fn test_search_over_sqlite() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 12, clock.now());
    TestDataFactory::vocabulary_deck(&db.engine, Uuid::new_v4(), 4, clock.now());

    for card in cards.iter().take(3) {
        db.engine.review_card(card.id, 4, 1_000, clock.now()).unwrap();
    }

    let feminine = db
        .engine
        .search_cards(&CardQuery {
            filter: CardFilter {
                deck_id: Some(deck),
                tag: Some("noun-f".into()),
                ..Default::default()
            },
            limit: Some(4),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(feminine.total, 6);
    assert_eq!(feminine.cards.len(), 4);
    assert!(feminine.cards.iter().all(|c| c.tags.iter().any(|t| t == "noun-f")));

    let text = db
        .engine
        .search_cards(&CardQuery {
            filter: CardFilter {
                deck_id: Some(deck),
                text: Some("THE HOUSE".into()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    // Only entry 2 of the first ten words is "the house"
    assert_eq!(text.total, 1);
    assert_eq!(text.cards[0].back, "the house");

    let by_stability = db
        .engine
        .search_cards(
            &CardQuery::for_deck(deck)
                .sorted_by(CardSortField::Stability, SortOrder::Desc)
                .limit(3),
        )
        .unwrap();
    assert_eq!(by_stability.total, 12);
    assert!(by_stability.cards.iter().all(|c| c.state == CardState::Review));

    let reviewed = db
        .engine
        .search_cards(&CardQuery {
            filter: CardFilter {
                state: Some(CardState::Review),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    assert_eq!(reviewed.total, 3);
}

#[test]
fn test_backup_copy_is_complete() {
    let mut db = TestDatabaseManager::new_temp();
    let clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 8, clock.now());
    db.engine.review_card(cards[0].id, 3, 1_000, clock.now()).unwrap();

    let backup_dir = tempfile::tempdir().unwrap();
    let backup_path = backup_dir.path().join("cadence-backup.db");
    db.storage.backup_to(&backup_path).unwrap();

    let backup = SqliteStorage::new(Some(backup_path)).unwrap();
    assert_eq!(backup.count_cards().unwrap(), 8);
    assert_eq!(backup.load_deck_reviews(deck).unwrap().len(), 1);
    assert_eq!(backup.load_cards_by_deck(deck).unwrap().len(), 8);
    assert!(db.path().exists());
}

#[test]
fn test_due_query_matches_engine_view() {
    let mut db = TestDatabaseManager::new_temp();
    let mut clock = TestClock::default();
    let deck = Uuid::new_v4();
    let cards = TestDataFactory::vocabulary_deck(&db.engine, deck, 6, clock.now());

    db.engine.review_card(cards[0].id, 4, 0, clock.now()).unwrap();
    db.engine.review_card(cards[1].id, 1, 0, clock.now()).unwrap();
    db.engine.suspend_card(cards[2].id, clock.now()).unwrap();

    let now = clock.advance(Duration::minutes(30));
    let raw = db.storage.load_due_cards(Some(deck), now, None).unwrap();
    let queue = db.engine.get_due_cards(Some(deck), None, now).unwrap();

    // Easy card is in the future, suspended card is excluded
    assert_eq!(raw.len(), 4);
    assert_eq!(queue.len(), 4);
    assert_eq!(queue[0].card.id, cards[1].id);
    assert!(queue.iter().all(|d| d.card.id != cards[2].id));
    assert_eq!(db.storage.load_due_cards(None, now, Some(2)).unwrap().len(), 2);
}
