//! Scheduling Oracle Port
//!
//! The memory-model algorithm (FSRS or any other) lives behind this trait.
//! The engine hands the oracle a snapshot of a card and receives one candidate
//! outcome per grade; it then keeps the candidate matching the learner's
//! grade. Everything inside the oracle is opaque to the engine, so algorithms
//! can be swapped without touching review orchestration.
//!
//! ## Contract
//!
//! - `create_empty_model()` returns the memory model of a brand-new card
//! - `schedule(snapshot, now)` is pure: same input, same output
//! - every candidate carries a memory model with stability > 0

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::{CardState, Grade, MemoryModel};

// ============================================================================
// INPUT
// ============================================================================

/// Scheduling inputs extracted from a card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSnapshot {
    pub memory_model: MemoryModel,
    pub state: CardState,
    pub due: DateTime<Utc>,
    /// `None` for a card that has never been reviewed
    pub last_review: Option<DateTime<Utc>>,
}

impl CardSnapshot {
    /// Days elapsed since the last review (0 for unreviewed cards)
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> f64 {
        self.last_review
            .map(|last| ((now - last).num_seconds() as f64 / 86_400.0).max(0.0))
            .unwrap_or(0.0)
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// The oracle's own record of a scheduling decision
///
/// Stored verbatim inside each review log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleLog {
    pub grade: Grade,
    /// State the card was in when graded
    pub state: CardState,
    /// Due date the card had when graded
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    /// Days since the previous review
    pub elapsed_days: f64,
    /// Days until the newly scheduled review
    pub scheduled_days: f64,
    pub reviewed_at: DateTime<Utc>,
}

/// One possible outcome of a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingCandidate {
    pub memory_model: MemoryModel,
    pub state: CardState,
    pub due: DateTime<Utc>,
    pub log: OracleLog,
}

/// Candidate outcomes for all four grades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcomes {
    pub again: SchedulingCandidate,
    pub hard: SchedulingCandidate,
    pub good: SchedulingCandidate,
    pub easy: SchedulingCandidate,
}

impl ScheduleOutcomes {
    /// Borrow the candidate for a grade
    pub fn get(&self, grade: Grade) -> &SchedulingCandidate {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }

    /// Take ownership of the candidate for a grade
    pub fn select(self, grade: Grade) -> SchedulingCandidate {
        match grade {
            Grade::Again => self.again,
            Grade::Hard => self.hard,
            Grade::Good => self.good,
            Grade::Easy => self.easy,
        }
    }
}

// ============================================================================
// PORT
// ============================================================================

/// Pluggable memory-model strategy
pub trait SchedulingOracle: Send + Sync {
    /// Memory model assigned to new and reset cards
    fn create_empty_model(&self) -> MemoryModel;

    /// Compute the candidate outcome for every grade
    fn schedule(&self, snapshot: &CardSnapshot, now: DateTime<Utc>) -> ScheduleOutcomes;
}

impl<T: SchedulingOracle + ?Sized> SchedulingOracle for Box<T> {
    fn create_empty_model(&self) -> MemoryModel {
        (**self).create_empty_model()
    }

    fn schedule(&self, snapshot: &CardSnapshot, now: DateTime<Utc>) -> ScheduleOutcomes {
        (**self).schedule(snapshot, now)
    }
}

impl<T: SchedulingOracle + ?Sized> SchedulingOracle for Arc<T> {
    fn create_empty_model(&self) -> MemoryModel {
        (**self).create_empty_model()
    }

    fn schedule(&self, snapshot: &CardSnapshot, now: DateTime<Utc>) -> ScheduleOutcomes {
        (**self).schedule(snapshot, now)
    }
}

// ============================================================================
// TESTS
// ============================================================================
