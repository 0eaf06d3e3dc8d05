//! Scheduling primitives shared by every card
//!
//! - `MemoryModel`: the oracle-owned {difficulty, stability} pair
//! - `CardState`: position in the learning state machine
//! - `Grade`: the learner's recall rating

use serde::{Deserialize, Serialize};

// ============================================================================
// MEMORY MODEL
// ============================================================================

/// Per-card memory model consumed by the scheduling oracle
///
/// Opaque to the engine apart from the stability invariant: stability is
/// measured in days and must stay strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryModel {
    /// Item difficulty as defined by the oracle
    pub difficulty: f64,
    /// Memory stability in days (> 0)
    pub stability: f64,
}

impl MemoryModel {
    /// Create a memory model, rejecting non-positive or non-finite stability
    pub fn new(difficulty: f64, stability: f64) -> Option<Self> {
        let model = Self {
            difficulty,
            stability,
        };
        model.is_valid().then_some(model)
    }

    /// Whether the stability invariant holds
    pub fn is_valid(&self) -> bool {
        self.stability.is_finite() && self.stability > 0.0 && self.difficulty.is_finite()
    }
}

// ============================================================================
// CARD STATE
// ============================================================================

/// Learning state of a card
///
/// Transitions are decided by the scheduling oracle. Only card creation and
/// reset put a card back into `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed
    #[default]
    New,
    /// In the initial learning steps
    Learning,
    /// Graduated, on spaced intervals
    Review,
    /// Lapsed and being re-learned
    Relearning,
}

impl CardState {
    /// All states in lifecycle order
    pub const ALL: [CardState; 4] = [
        CardState::New,
        CardState::Learning,
        CardState::Review,
        CardState::Relearning,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(CardState::New),
            "learning" => Some(CardState::Learning),
            "review" => Some(CardState::Review),
            "relearning" => Some(CardState::Relearning),
            _ => None,
        }
    }

    /// Learning and relearning cards surface immediately, regardless of due date
    pub fn is_learning(&self) -> bool {
        matches!(self, CardState::Learning | CardState::Relearning)
    }
}

impl std::fmt::Display for CardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GRADE
// ============================================================================

/// Recall grade given by the learner, ordinally ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Forgot the item
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled perfectly
    Easy = 4,
}

impl Grade {
    /// All grades in ascending order
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Convert a raw 1..=4 rating
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Grade::Again),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Good),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }

    /// Ordinal value (1..=4)
    pub fn value(&self) -> i32 {
        *self as i32
    }

    /// A review counts as successful when graded Good or better
    pub fn is_success(&self) -> bool {
        *self >= Grade::Good
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================
