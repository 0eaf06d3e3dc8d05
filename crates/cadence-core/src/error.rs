//! Engine error types

use uuid::Uuid;

use crate::storage::StorageError;

/// Errors raised by review orchestration, selection and statistics
///
/// Validation and lifecycle errors are raised immediately and never retried.
/// Storage failures are passed through unchanged; retry policy belongs to
/// the storage implementation or the host.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// No card with this id
    #[error("Card not found: {0}")]
    CardNotFound(Uuid),
    /// No settings stored for this deck
    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),
    /// A session is already open on this engine instance
    #[error("Study session already active: {0}")]
    SessionActive(Uuid),
    /// The card must be unsuspended before it can be reviewed
    #[error("Card is suspended: {0}")]
    CardSuspended(Uuid),
    /// The card must be unburied before it can be reviewed
    #[error("Card is buried: {0}")]
    CardBuried(Uuid),
    /// Input outside its domain
    #[error("Validation error: {0}")]
    Validation(String),
    /// Storage collaborator failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SchedulerError {
    /// Rejection caused by a suspended or buried card
    ///
    /// Hosts can turn these into an unsuspend/unbury prompt instead of
    /// showing a raw error.
    pub fn is_excluded_card(&self) -> bool {
        matches!(
            self,
            SchedulerError::CardSuspended(_) | SchedulerError::CardBuried(_)
        )
    }
}

/// Engine result type
pub type Result<T> = std::result::Result<T, SchedulerError>;
