//! Review Orchestration
//!
//! - `ReviewLogEntry`: the immutable record of one graded review
//! - `ReviewEngine`: drives reviews, lifecycle operations and sessions,
//!   delegating scheduling to the oracle and persistence to storage

mod engine;

pub use engine::ReviewEngine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::{Card, CardState, Grade};
use crate::error::SchedulerError;
use crate::oracle::OracleLog;

// ============================================================================
// REVIEW LOG
// ============================================================================

/// Append-only record of a review, with before/after snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub id: Uuid,
    pub card_id: Uuid,
    /// Session open at review time, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub grade: Grade,
    /// Time spent answering, in milliseconds
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub state_before: CardState,
    pub due_before: DateTime<Utc>,
    pub state_after: CardState,
    pub due_after: DateTime<Utc>,
    pub oracle_log: OracleLog,
}

impl ReviewLogEntry {
    /// Whether the review was graded Good or Easy
    pub fn is_success(&self) -> bool {
        self.grade.is_success()
    }
}

/// Result of a single review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub card: Card,
    pub review: ReviewLogEntry,
}

// ============================================================================
// BATCH REVIEWS
// ============================================================================

/// One item of a batch review (replay, import)
///
/// `rating` is the raw 1..=4 value as found in the import source; it is
/// validated per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub card_id: Uuid,
    pub rating: i32,
    pub duration_ms: u64,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewRequest {
    pub fn new(card_id: Uuid, grade: Grade, duration_ms: u64, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            card_id,
            rating: grade.value(),
            duration_ms,
            reviewed_at,
        }
    }
}

/// A batch item that could not be applied
#[derive(Debug)]
pub struct FailedReview {
    pub request: ReviewRequest,
    pub error: SchedulerError,
}

/// Partitioned result of a batch review
#[derive(Debug, Default)]
pub struct BatchReviewResult {
    pub successful: Vec<ReviewOutcome>,
    pub failed: Vec<FailedReview>,
}

impl BatchReviewResult {
    /// Number of items processed
    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
