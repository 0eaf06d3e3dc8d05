//! In-Memory Storage Implementation
//!
//! Everything lives behind a single mutex, which makes `commit_review`
//! atomic with respect to every other call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CardQuery, CardSearchResult, Result, Storage, StorageError};
use crate::card::Card;
use crate::config::DeckSettings;
use crate::review::ReviewLogEntry;
use crate::session::StudySession;

#[derive(Debug, Default)]
struct Inner {
    cards: HashMap<Uuid, Card>,
    reviews: Vec<ReviewLogEntry>,
    sessions: HashMap<Uuid, StudySession>,
    settings: HashMap<Uuid, DeckSettings>,
}

/// Volatile storage backed by hash maps
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Init("Memory storage lock poisoned".into()))
    }

    /// Number of stored cards
    pub fn card_count(&self) -> Result<usize> {
        Ok(self.lock()?.cards.len())
    }

    /// Number of stored review log entries
    pub fn review_count(&self) -> Result<usize> {
        Ok(self.lock()?.reviews.len())
    }
}

fn sort_cards(cards: &mut [Card]) {
    cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

impl Storage for MemoryStorage {
    fn load_card(&self, id: Uuid) -> Result<Option<Card>> {
        Ok(self.lock()?.cards.get(&id).cloned())
    }

    fn save_card(&self, card: &Card) -> Result<()> {
        self.lock()?.cards.insert(card.id, card.clone());
        Ok(())
    }

    fn save_cards(&self, cards: &[Card]) -> Result<()> {
        let mut inner = self.lock()?;
        for card in cards {
            inner.cards.insert(card.id, card.clone());
        }
        Ok(())
    }

    fn load_cards_by_deck(&self, deck_id: Uuid) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .lock()?
            .cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect();
        sort_cards(&mut cards);
        Ok(cards)
    }

    fn load_due_cards(
        &self,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .lock()?
            .cards
            .values()
            .filter(|c| deck_id.is_none_or(|deck| c.deck_id == deck))
            .filter(|c| c.is_available())
            .filter(|c| c.is_due(now) || c.state.is_learning())
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            cards.truncate(limit);
        }
        Ok(cards)
    }

    fn save_review(&self, entry: &ReviewLogEntry) -> Result<()> {
        self.lock()?.reviews.push(entry.clone());
        Ok(())
    }

    fn commit_review(&self, card: &Card, entry: &ReviewLogEntry) -> Result<()> {
        let mut inner = self.lock()?;
        inner.cards.insert(card.id, card.clone());
        inner.reviews.push(entry.clone());
        Ok(())
    }

    fn load_card_reviews(&self, card_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        let mut reviews: Vec<ReviewLogEntry> = self
            .lock()?
            .reviews
            .iter()
            .filter(|r| r.card_id == card_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.timestamp);
        Ok(reviews)
    }

    fn load_deck_reviews(&self, deck_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        let inner = self.lock()?;
        let mut reviews: Vec<ReviewLogEntry> = inner
            .reviews
            .iter()
            .filter(|r| {
                inner
                    .cards
                    .get(&r.card_id)
                    .is_some_and(|c| c.deck_id == deck_id)
            })
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.timestamp);
        Ok(reviews)
    }

    fn create_session(&self, deck_id: Option<Uuid>, start: DateTime<Utc>) -> Result<StudySession> {
        let session = StudySession::new(deck_id, start);
        self.lock()?.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn update_session(&self, session: &StudySession) -> Result<()> {
        self.lock()?.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn load_session(&self, id: Uuid) -> Result<Option<StudySession>> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    fn load_deck_settings(&self, deck_id: Uuid) -> Result<Option<DeckSettings>> {
        Ok(self.lock()?.settings.get(&deck_id).cloned())
    }

    fn save_deck_settings(&self, deck_id: Uuid, settings: &DeckSettings) -> Result<()> {
        self.lock()?.settings.insert(deck_id, settings.clone());
        Ok(())
    }

    fn search_cards(&self, query: &CardQuery) -> Result<CardSearchResult> {
        let cards: Vec<Card> = self.lock()?.cards.values().cloned().collect();
        Ok(query.apply(cards))
    }
}

// ============================================================================
// TESTS
// ============================================================================
