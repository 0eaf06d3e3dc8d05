//! Card - The unit of study
//!
//! A card belongs to exactly one deck and carries:
//! - Front/back content and tags
//! - The oracle's memory model and the current learning state
//! - Lifecycle flags (suspended, buried) and the leech counter
//!
//! Cards are never deleted by the engine. They change only through a review,
//! a lifecycle toggle, or a reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{CardState, MemoryModel};
use crate::oracle::CardSnapshot;

// ============================================================================
// INPUT
// ============================================================================

/// Metadata for a card about to be created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    /// Owning deck
    pub deck_id: Uuid,
    /// Prompt side
    pub front: String,
    /// Answer side
    pub back: String,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewCard {
    /// Card input without tags
    pub fn new(deck_id: Uuid, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            deck_id,
            front: front.into(),
            back: back.into(),
            tags: Vec::new(),
        }
    }

    /// Attach tags
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// CARD
// ============================================================================

/// A flashcard with its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier (UUID v4)
    pub id: Uuid,
    /// Owning deck
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Oracle-owned memory model
    pub memory_model: MemoryModel,
    /// Current learning state
    pub state: CardState,
    /// Next scheduled review
    pub due: DateTime<Utc>,
    /// Last review time; `None` means the card was never reviewed
    /// (or was reset since)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    /// Excluded from review and selection until unsuspended
    #[serde(default)]
    pub suspended: bool,
    /// Excluded for the day, cleared in bulk per deck
    #[serde(default)]
    pub buried: bool,
    /// Number of reviews graded Again
    #[serde(default)]
    pub leech_count: u32,
}

impl Card {
    /// Create a new card, due immediately
    pub fn new(input: NewCard, memory_model: MemoryModel, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id: input.deck_id,
            front: input.front,
            back: input.back,
            tags: input.tags,
            created_at: now,
            updated_at: now,
            memory_model,
            state: CardState::New,
            due: now,
            last_review: None,
            suspended: false,
            buried: false,
            leech_count: 0,
        }
    }

    /// Suspend the card
    pub fn suspend(&mut self, now: DateTime<Utc>) {
        self.suspended = true;
        self.updated_at = now;
    }

    /// Lift a suspension
    pub fn unsuspend(&mut self, now: DateTime<Utc>) {
        self.suspended = false;
        self.updated_at = now;
    }

    /// Bury the card for the rest of the day
    pub fn bury(&mut self, now: DateTime<Utc>) {
        self.buried = true;
        self.updated_at = now;
    }

    /// Clear the buried flag
    pub fn unbury(&mut self, now: DateTime<Utc>) {
        self.buried = false;
        self.updated_at = now;
    }

    /// Return the card to a fresh `New` state
    ///
    /// Discards the memory model and the link to past reviews. Logged
    /// reviews are kept by storage.
    pub fn reset(&mut self, memory_model: MemoryModel, now: DateTime<Utc>) {
        self.memory_model = memory_model;
        self.state = CardState::New;
        self.due = now;
        self.last_review = None;
        self.leech_count = 0;
        self.updated_at = now;
    }

    /// Neither suspended nor buried
    pub fn is_available(&self) -> bool {
        !self.suspended && !self.buried
    }

    /// Scheduled review time has arrived
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due <= now
    }

    /// Whether the card has ever been reviewed since creation or reset
    pub fn is_reviewed(&self) -> bool {
        self.last_review.is_some()
    }

    /// Scheduling inputs handed to the oracle
    pub fn snapshot(&self) -> CardSnapshot {
        CardSnapshot {
            memory_model: self.memory_model,
            state: self.state,
            due: self.due,
            last_review: self.last_review,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
