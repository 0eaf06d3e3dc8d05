//! Study Sessions
//!
//! A session bounds a run of reviews and keeps rolling counters:
//!
//! ```text
//! NoSession --start--> Open --end--> NoSession
//! ```
//!
//! Each engine instance owns one `SessionTracker`, so at most one session is
//! open per instance. Studying several decks at once means running several
//! engine instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::{CardState, Grade};
use crate::error::{Result, SchedulerError};

// ============================================================================
// GRADE COUNTS
// ============================================================================

/// Reviews tallied per grade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCounts {
    pub again: u32,
    pub hard: u32,
    pub good: u32,
    pub easy: u32,
}

impl GradeCounts {
    /// Count one review
    pub fn increment(&mut self, grade: Grade) {
        match grade {
            Grade::Again => self.again += 1,
            Grade::Hard => self.hard += 1,
            Grade::Good => self.good += 1,
            Grade::Easy => self.easy += 1,
        }
    }

    /// Count for a grade
    pub fn get(&self, grade: Grade) -> u32 {
        match grade {
            Grade::Again => self.again,
            Grade::Hard => self.hard,
            Grade::Good => self.good,
            Grade::Easy => self.easy,
        }
    }

    /// Sum over all grades
    pub fn total(&self) -> u32 {
        self.again + self.hard + self.good + self.easy
    }
}

// ============================================================================
// STUDY SESSION
// ============================================================================

/// A bounded run of reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: Uuid,
    /// Deck being studied; `None` for a cross-deck session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    /// Unset while the session is open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub cards_reviewed: u32,
    /// Reviews of cards that were New when graded
    pub new_cards: u32,
    /// Reviews of cards in any other state
    pub review_cards: u32,
    pub counts_by_grade: GradeCounts,
    /// Wall-clock length in milliseconds, set when the session ends
    pub total_duration_ms: u64,
    /// `total_duration_ms / cards_reviewed`, 0 without reviews
    pub average_duration_ms: u64,
}

impl StudySession {
    /// Open a session starting at `start_time`
    pub fn new(deck_id: Option<Uuid>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            start_time,
            end_time: None,
            cards_reviewed: 0,
            new_cards: 0,
            review_cards: 0,
            counts_by_grade: GradeCounts::default(),
            total_duration_ms: 0,
            average_duration_ms: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Update the rolling counters for one review
    pub fn record_review(&mut self, state_before: CardState, grade: Grade) {
        self.cards_reviewed += 1;
        if state_before == CardState::New {
            self.new_cards += 1;
        } else {
            self.review_cards += 1;
        }
        self.counts_by_grade.increment(grade);
    }

    /// Close the session and compute its durations
    pub fn finalize(&mut self, end_time: DateTime<Utc>) {
        let total = (end_time - self.start_time).num_milliseconds().max(0) as u64;
        self.end_time = Some(end_time);
        self.total_duration_ms = total;
        self.average_duration_ms = if self.cards_reviewed == 0 {
            0
        } else {
            total / u64::from(self.cards_reviewed)
        };
    }

    /// Fraction of reviews graded Good or Easy
    pub fn success_rate(&self) -> f64 {
        if self.cards_reviewed == 0 {
            return 0.0;
        }
        let successes = self.counts_by_grade.good + self.counts_by_grade.easy;
        successes as f64 / self.cards_reviewed as f64
    }
}

// ============================================================================
// SESSION TRACKER
// ============================================================================

/// Holder for the single open session of an engine instance
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<StudySession>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `SessionActive` when a session is already open
    pub fn ensure_idle(&self) -> Result<()> {
        match &self.current {
            Some(open) => Err(SchedulerError::SessionActive(open.id)),
            None => Ok(()),
        }
    }

    /// Adopt an open session
    pub fn open(&mut self, session: StudySession) -> Result<()> {
        self.ensure_idle()?;
        if !session.is_open() {
            return Err(SchedulerError::Validation(format!(
                "session {} has already ended",
                session.id
            )));
        }
        self.current = Some(session);
        Ok(())
    }

    pub fn current(&self) -> Option<&StudySession> {
        self.current.as_ref()
    }

    pub fn current_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|s| s.id)
    }

    /// Count a review against the open session, if any
    pub fn record_review(&mut self, state_before: CardState, grade: Grade) {
        if let Some(session) = self.current.as_mut() {
            session.record_review(state_before, grade);
        }
    }

    /// Finalized copy of the open session; the tracker keeps it open
    pub fn finished(&self, end_time: DateTime<Utc>) -> Option<StudySession> {
        let mut session = self.current.clone()?;
        session.finalize(end_time);
        Some(session)
    }

    /// Forget the open session
    pub fn clear(&mut self) {
        self.current = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================
