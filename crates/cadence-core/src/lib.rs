//! # Cadence Core
//!
//! Spaced-repetition review engine. Cadence owns everything around a review
//! except the memory model itself:
//!
//! - **Card Lifecycle**: create, suspend, bury, reset; leech counting
//! - **Review Orchestration**: oracle call, before/after log entries, atomic persistence
//! - **Due-Card Selection**: learning first, then overdue, review and new cards
//! - **Study Plans**: per-deck daily caps for reviews and new cards
//! - **Statistics**: deck and card aggregates, retrievability, workload forecasts
//! - **Sessions**: one open study session per engine instance
//!
//! ## Collaborators
//!
//! - [`SchedulingOracle`]: the memory-model algorithm (FSRS or similar). It
//!   proposes one outcome per grade; the engine applies the one the learner chose.
//! - [`Storage`]: persistence. [`MemoryStorage`] keeps everything in memory,
//!   [`SqliteStorage`] uses SQLite with versioned migrations.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_core::prelude::*;
//!
//! // Open the default database and plug in an FSRS-backed oracle
//! let storage = SqliteStorage::new(None)?;
//! let mut engine = ReviewEngine::new(storage, MyFsrsOracle::default());
//!
//! let deck = Uuid::new_v4();
//! let card = engine.initialize_card(NewCard::new(deck, "hola", "hello"), Utc::now())?;
//!
//! engine.start_session(Some(deck), Utc::now())?;
//! for due in engine.get_due_cards(Some(deck), Some(20), Utc::now())? {
//!     engine.review_card(due.card.id, Grade::Good.value(), 4_000, Utc::now())?;
//! }
//! let session = engine.end_session(Utc::now())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): compile SQLite into the crate

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod config;
pub mod error;
pub mod oracle;
pub mod review;
pub mod selection;
pub mod session;
pub mod stats;
pub mod storage;


// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Cards
pub use card::{Card, CardState, Grade, MemoryModel, NewCard};

// Configuration
pub use config::{
    DeckSettings, EngineConfig, DEFAULT_FORECAST_HORIZON_DAYS, DEFAULT_MATURITY_THRESHOLD_DAYS,
    DEFAULT_SECONDS_PER_CARD,
};

// Errors
pub use error::{Result, SchedulerError};

// Scheduling oracle port
pub use oracle::{CardSnapshot, OracleLog, ScheduleOutcomes, SchedulingCandidate, SchedulingOracle};

// Review orchestration
pub use review::{
    BatchReviewResult, FailedReview, ReviewEngine, ReviewLogEntry, ReviewOutcome, ReviewRequest,
};

// Selection and planning
pub use selection::{select_due_cards, DueCard, DuePriority, StudyPlan};

// Sessions
pub use session::{GradeCounts, StudySession};

// Statistics
pub use stats::{
    retrievability, CardStats, DeckStats, Forecast, ForecastDay, Maturity, PerformanceForecast,
    PerformancePoint,
};

// Storage layer
pub use storage::{
    CardFilter, CardQuery, CardSearchResult, CardSortField, MemoryStorage, SortOrder,
    SqliteStorage, Storage, StorageError,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current database schema version
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Card, CardState, DeckSettings, DueCard, Grade, MemoryStorage, NewCard, Result,
        ReviewEngine, SchedulerError, SchedulingOracle, SqliteStorage, Storage, StudyPlan,
        StudySession,
    };

    pub use chrono::Utc;
    pub use uuid::Uuid;
}
