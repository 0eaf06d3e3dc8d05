//! Storage Module
//!
//! The persistence contract consumed by the review engine, plus two
//! implementations:
//! - `MemoryStorage`: mutex-guarded maps, for tests and ephemeral hosts
//! - `SqliteStorage`: SQLite with versioned migrations and transactional
//!   review commits
//!
//! Storage owns transactional isolation. In particular `commit_review` must
//! persist the updated card and its review log entry as one unit.

mod memory;
mod migrations;
mod query;
mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::card::Card;
use crate::config::DeckSettings;
use crate::review::ReviewLogEntry;
use crate::session::StudySession;

pub use memory::MemoryStorage;
pub use migrations::{apply_migrations, get_current_version, Migration, MIGRATIONS};
pub use query::{CardFilter, CardQuery, CardSearchResult, CardSortField, SortOrder};
pub use sqlite::SqliteStorage;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// JSON encoding of tags, logs or settings failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Stored value outside its domain
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// Initialization error (directories, poisoned locks)
    #[error("Initialization error: {0}")]
    Init(String),
    /// Failure inside a host-provided storage implementation
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// CONTRACT
// ============================================================================

/// Persistence collaborator for cards, reviews, sessions and deck settings
///
/// All calls are synchronous request/response. Async hosts should run them on
/// their executor's blocking pool. Timeouts and retries are the
/// implementation's concern.
pub trait Storage: Send + Sync {
    /// Load a card by id
    fn load_card(&self, id: Uuid) -> Result<Option<Card>>;

    /// Insert or replace a card
    fn save_card(&self, card: &Card) -> Result<()>;

    /// Insert or replace several cards
    fn save_cards(&self, cards: &[Card]) -> Result<()> {
        for card in cards {
            self.save_card(card)?;
        }
        Ok(())
    }

    /// All cards of a deck, in any state
    fn load_cards_by_deck(&self, deck_id: Uuid) -> Result<Vec<Card>>;

    /// Cards eligible for study at `now`
    ///
    /// Returns non-suspended, non-buried cards that are either due at or
    /// before `now`, or in Learning/Relearning regardless of due date.
    /// Ordered by ascending due date; `limit` truncates after ordering.
    fn load_due_cards(
        &self,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Card>>;

    /// Append a review log entry
    fn save_review(&self, entry: &ReviewLogEntry) -> Result<()>;

    /// Persist an updated card together with its review log entry, atomically
    fn commit_review(&self, card: &Card, entry: &ReviewLogEntry) -> Result<()>;

    /// Review history of one card, oldest first
    fn load_card_reviews(&self, card_id: Uuid) -> Result<Vec<ReviewLogEntry>>;

    /// Review history of every card in a deck, oldest first
    fn load_deck_reviews(&self, deck_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        let mut reviews = Vec::new();
        for card in self.load_cards_by_deck(deck_id)? {
            reviews.extend(self.load_card_reviews(card.id)?);
        }
        reviews.sort_by_key(|r| r.timestamp);
        Ok(reviews)
    }

    /// Create and persist a new open session
    fn create_session(&self, deck_id: Option<Uuid>, start: DateTime<Utc>) -> Result<StudySession>;

    /// Insert or replace a session
    fn update_session(&self, session: &StudySession) -> Result<()>;

    /// Load a session by id
    fn load_session(&self, id: Uuid) -> Result<Option<StudySession>>;

    /// Study limits for a deck; `None` if the deck is unknown
    fn load_deck_settings(&self, deck_id: Uuid) -> Result<Option<DeckSettings>>;

    /// Insert or replace the study limits of a deck
    fn save_deck_settings(&self, deck_id: Uuid, settings: &DeckSettings) -> Result<()>;

    /// Filter, sort and limit cards
    fn search_cards(&self, query: &CardQuery) -> Result<CardSearchResult>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn load_card(&self, id: Uuid) -> Result<Option<Card>> {
        (**self).load_card(id)
    }

    fn save_card(&self, card: &Card) -> Result<()> {
        (**self).save_card(card)
    }

    fn save_cards(&self, cards: &[Card]) -> Result<()> {
        (**self).save_cards(cards)
    }

    fn load_cards_by_deck(&self, deck_id: Uuid) -> Result<Vec<Card>> {
        (**self).load_cards_by_deck(deck_id)
    }

    fn load_due_cards(
        &self,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Card>> {
        (**self).load_due_cards(deck_id, now, limit)
    }

    fn save_review(&self, entry: &ReviewLogEntry) -> Result<()> {
        (**self).save_review(entry)
    }

    fn commit_review(&self, card: &Card, entry: &ReviewLogEntry) -> Result<()> {
        (**self).commit_review(card, entry)
    }

    fn load_card_reviews(&self, card_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        (**self).load_card_reviews(card_id)
    }

    fn load_deck_reviews(&self, deck_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        (**self).load_deck_reviews(deck_id)
    }

    fn create_session(&self, deck_id: Option<Uuid>, start: DateTime<Utc>) -> Result<StudySession> {
        (**self).create_session(deck_id, start)
    }

    fn update_session(&self, session: &StudySession) -> Result<()> {
        (**self).update_session(session)
    }

    fn load_session(&self, id: Uuid) -> Result<Option<StudySession>> {
        (**self).load_session(id)
    }

    fn load_deck_settings(&self, deck_id: Uuid) -> Result<Option<DeckSettings>> {
        (**self).load_deck_settings(deck_id)
    }

    fn save_deck_settings(&self, deck_id: Uuid, settings: &DeckSettings) -> Result<()> {
        (**self).save_deck_settings(deck_id, settings)
    }

    fn search_cards(&self, query: &CardQuery) -> Result<CardSearchResult> {
        (**self).search_cards(query)
    }
}
