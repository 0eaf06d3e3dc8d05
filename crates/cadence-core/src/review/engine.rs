//! Review Engine
//!
//! Orchestrates everything that touches a card after creation:
//!
//! - Reviews: oracle call, log entry, leech counting, atomic persistence
//! - Lifecycle: suspend, bury, reset
//! - Sessions: at most one open session per engine instance
//! - Read paths: due queue, study plans, statistics and forecasts
//!
//! The engine is generic over its two collaborators. Storage decides how
//! data is kept; the oracle decides how memory evolves. Both are passed in,
//! so tests and hosts pick their own.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{BatchReviewResult, FailedReview, ReviewLogEntry, ReviewOutcome, ReviewRequest};
use crate::card::{Card, Grade, MemoryModel, NewCard};
use crate::config::{DeckSettings, EngineConfig};
use crate::error::{Result, SchedulerError};
use crate::oracle::{ScheduleOutcomes, SchedulingOracle};
use crate::selection::{select_due_cards, DueCard, StudyPlan};
use crate::session::{SessionTracker, StudySession};
use crate::stats::{CardStats, DeckStats, Forecast, PerformanceForecast};
use crate::storage::{CardFilter, CardQuery, CardSearchResult, Storage};

/// Review orchestrator bound to one storage and one scheduling oracle
///
/// Operations that touch the open session take `&mut self`; run one engine
/// per concurrently studied deck.
pub struct ReviewEngine<S, O> {
    storage: S,
    oracle: O,
    config: EngineConfig,
    sessions: SessionTracker,
}

impl<S: Storage, O: SchedulingOracle> ReviewEngine<S, O> {
    /// Create an engine with default configuration
    pub fn new(storage: S, oracle: O) -> Self {
        Self::with_config(storage, oracle, EngineConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(storage: S, oracle: O, config: EngineConfig) -> Self {
        Self {
            storage,
            oracle,
            config,
            sessions: SessionTracker::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn initial_model(&self) -> Result<MemoryModel> {
        let model = self.oracle.create_empty_model();
        if !model.is_valid() {
            return Err(SchedulerError::Validation(format!(
                "oracle produced an invalid initial memory model (stability {})",
                model.stability
            )));
        }
        Ok(model)
    }

    fn load_existing(&self, card_id: Uuid) -> Result<Card> {
        self.storage
            .load_card(card_id)?
            .ok_or(SchedulerError::CardNotFound(card_id))
    }

    // ========================================================================
    // CARD LIFECYCLE
    // ========================================================================

    /// Create and persist a new card, due immediately
    pub fn initialize_card(&self, input: NewCard, now: DateTime<Utc>) -> Result<Card> {
        let model = self.initial_model()?;
        let card = Card::new(input, model, now);
        self.storage.save_card(&card)?;
        tracing::debug!(card_id = %card.id, deck_id = %card.deck_id, "Card initialized");
        Ok(card)
    }

    /// Load a card
    pub fn get_card(&self, card_id: Uuid) -> Result<Card> {
        self.load_existing(card_id)
    }

    /// Review history of a card, oldest first
    pub fn card_reviews(&self, card_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        self.load_existing(card_id)?;
        Ok(self.storage.load_card_reviews(card_id)?)
    }

    pub fn suspend_card(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<Card> {
        self.update_card(card_id, |card| card.suspend(now))
    }

    pub fn unsuspend_card(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<Card> {
        self.update_card(card_id, |card| card.unsuspend(now))
    }

    pub fn bury_card(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<Card> {
        self.update_card(card_id, |card| card.bury(now))
    }

    /// Clear the buried flag on every card of a deck
    ///
    /// Returns the number of cards that were buried.
    pub fn unbury_all(&self, deck_id: Uuid, now: DateTime<Utc>) -> Result<usize> {
        let mut buried: Vec<Card> = self
            .storage
            .load_cards_by_deck(deck_id)?
            .into_iter()
            .filter(|card| card.buried)
            .collect();
        for card in &mut buried {
            card.unbury(now);
        }

        if !buried.is_empty() {
            self.storage.save_cards(&buried)?;
            tracing::info!(deck_id = %deck_id, count = buried.len(), "Unburied cards");
        }
        Ok(buried.len())
    }

    /// Return a card to `New` with a fresh memory model
    ///
    /// Earlier review log entries stay in storage.
    pub fn reset_card(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<Card> {
        let model = self.initial_model()?;
        self.update_card(card_id, |card| card.reset(model, now))
    }

    fn update_card(&self, card_id: Uuid, apply: impl FnOnce(&mut Card)) -> Result<Card> {
        let mut card = self.load_existing(card_id)?;
        apply(&mut card);
        self.storage.save_card(&card)?;
        Ok(card)
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    /// Grade a card
    ///
    /// `rating` is the raw learner input and must be in 1..=4. Suspended
    /// and buried cards are rejected before the rating is looked at.
    pub fn review_card(
        &mut self,
        card_id: Uuid,
        rating: i32,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let mut card = self.load_existing(card_id)?;
        if card.suspended {
            return Err(SchedulerError::CardSuspended(card_id));
        }
        if card.buried {
            return Err(SchedulerError::CardBuried(card_id));
        }
        let grade = Grade::from_i32(rating).ok_or_else(|| {
            SchedulerError::Validation(format!("grade must be between 1 and 4, got {}", rating))
        })?;

        let before = card.snapshot();
        let candidate = self.oracle.schedule(&before, now).select(grade);
        if !candidate.memory_model.is_valid() {
            tracing::warn!(
                card_id = %card_id,
                grade = %grade,
                stability = candidate.memory_model.stability,
                "Oracle returned an invalid memory model"
            );
            return Err(SchedulerError::Validation(format!(
                "oracle returned stability {} for card {}",
                candidate.memory_model.stability, card_id
            )));
        }

        card.memory_model = candidate.memory_model;
        card.state = candidate.state;
        card.due = candidate.due;
        if grade == Grade::Again {
            card.leech_count += 1;
        }
        card.last_review = Some(now);
        card.updated_at = now;

        let review = ReviewLogEntry {
            id: Uuid::new_v4(),
            card_id,
            session_id: self.sessions.current_id(),
            grade,
            duration_ms,
            timestamp: now,
            state_before: before.state,
            due_before: before.due,
            state_after: card.state,
            due_after: card.due,
            oracle_log: candidate.log,
        };

        self.storage.commit_review(&card, &review)?;
        self.sessions.record_review(before.state, grade);
        self.persist_session_progress();

        tracing::debug!(
            card_id = %card_id,
            grade = %grade,
            from = %before.state,
            to = %card.state,
            due = %card.due,
            "Card reviewed"
        );

        Ok(ReviewOutcome { card, review })
    }

    /// Apply many reviews in order, isolating failures per item
    pub fn review_cards<I>(&mut self, requests: I) -> BatchReviewResult
    where
        I: IntoIterator<Item = ReviewRequest>,
    {
        let mut result = BatchReviewResult::default();

        for request in requests {
            match self.review_card(
                request.card_id,
                request.rating,
                request.duration_ms,
                request.reviewed_at,
            ) {
                Ok(outcome) => result.successful.push(outcome),
                Err(error) => {
                    tracing::warn!("Batch review of {} failed: {}", request.card_id, error);
                    result.failed.push(FailedReview { request, error });
                }
            }
        }

        tracing::info!(
            successful = result.successful.len(),
            failed = result.failed.len(),
            "Batch review finished"
        );
        result
    }

    /// Every candidate outcome for a card, without applying any
    pub fn preview_review(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<ScheduleOutcomes> {
        let card = self.load_existing(card_id)?;
        Ok(self.oracle.schedule(&card.snapshot(), now))
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Open a study session
    pub fn start_session(
        &mut self,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        self.sessions.ensure_idle()?;
        let session = self.storage.create_session(deck_id, now)?;
        self.sessions.open(session.clone())?;
        tracing::info!(session_id = %session.id, "Study session started");
        Ok(session)
    }

    /// Close the open session; `None` when no session is open
    pub fn end_session(&mut self, now: DateTime<Utc>) -> Result<Option<StudySession>> {
        let Some(finished) = self.sessions.finished(now) else {
            return Ok(None);
        };

        self.storage.update_session(&finished)?;
        self.sessions.clear();

        tracing::info!(
            session_id = %finished.id,
            cards_reviewed = finished.cards_reviewed,
            total_duration_ms = finished.total_duration_ms,
            "Study session ended"
        );
        Ok(Some(finished))
    }

    /// Re-adopt a persisted session that was never ended
    pub fn resume_session(&mut self, session_id: Uuid) -> Result<StudySession> {
        self.sessions.ensure_idle()?;
        let session = self.storage.load_session(session_id)?.ok_or_else(|| {
            SchedulerError::Validation(format!("session {} not found", session_id))
        })?;
        self.sessions.open(session.clone())?;
        tracing::info!(session_id = %session_id, "Study session resumed");
        Ok(session)
    }

    /// The open session, if any
    pub fn current_session(&self) -> Option<&StudySession> {
        self.sessions.current()
    }

    fn persist_session_progress(&self) {
        // The review itself is already committed; a failed counter write only
        // loses progress the session will recount at end_session.
        if let Some(session) = self.sessions.current() {
            if let Err(e) = self.storage.update_session(session) {
                tracing::warn!("Failed to persist progress of session {}: {}", session.id, e);
            }
        }
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Prioritized queue of cards to study now
    pub fn get_due_cards(
        &self,
        deck_id: Option<Uuid>,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueCard>> {
        let candidates = self.storage.load_due_cards(deck_id, now, None)?;
        Ok(select_due_cards(candidates, now, limit))
    }

    /// Plan a day of study with explicit settings
    pub fn generate_study_plan(
        &self,
        deck_id: Uuid,
        date: NaiveDate,
        settings: &DeckSettings,
    ) -> Result<StudyPlan> {
        settings.validate()?;
        let cards = self.storage.load_cards_by_deck(deck_id)?;
        Ok(StudyPlan::build(
            deck_id,
            cards,
            date,
            settings,
            self.config.assumed_seconds_per_card,
        ))
    }

    /// Plan a day of study with the deck's stored settings
    pub fn plan_for_deck(&self, deck_id: Uuid, date: NaiveDate) -> Result<StudyPlan> {
        let settings = self.deck_settings(deck_id)?;
        self.generate_study_plan(deck_id, date, &settings)
    }

    pub fn deck_settings(&self, deck_id: Uuid) -> Result<DeckSettings> {
        self.storage
            .load_deck_settings(deck_id)?
            .ok_or(SchedulerError::DeckNotFound(deck_id))
    }

    /// Validate and store a deck's settings
    pub fn save_deck_settings(&self, deck_id: Uuid, settings: &DeckSettings) -> Result<()> {
        settings.validate()?;
        self.storage.save_deck_settings(deck_id, settings)?;
        Ok(())
    }

    pub fn search_cards(&self, query: &CardQuery) -> Result<CardSearchResult> {
        Ok(self.storage.search_cards(query)?)
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    pub fn calculate_deck_stats(&self, deck_id: Uuid, now: DateTime<Utc>) -> Result<DeckStats> {
        let cards = self.storage.load_cards_by_deck(deck_id)?;
        let reviews = self.storage.load_deck_reviews(deck_id)?;
        Ok(DeckStats::calculate(deck_id, &cards, &reviews, now))
    }

    pub fn calculate_card_stats(&self, card_id: Uuid, now: DateTime<Utc>) -> Result<CardStats> {
        let card = self.load_existing(card_id)?;
        let reviews = self.storage.load_card_reviews(card_id)?;
        Ok(CardStats::calculate(
            &card,
            &reviews,
            now,
            self.config.maturity_threshold_days,
        ))
    }

    /// Project a card's retrievability for the next `days_ahead` days
    pub fn predict_performance(
        &self,
        card_id: Uuid,
        days_ahead: u32,
        now: DateTime<Utc>,
    ) -> Result<PerformanceForecast> {
        let card = self.load_existing(card_id)?;
        Ok(PerformanceForecast::for_card(&card, days_ahead, now))
    }

    /// Due-card workload per day; `horizon` defaults to the configured days
    pub fn forecast(
        &self,
        deck_id: Option<Uuid>,
        horizon: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Forecast> {
        let horizon = horizon.unwrap_or(self.config.forecast_horizon_days);
        let cards = match deck_id {
            Some(deck) => self.storage.load_cards_by_deck(deck)?,
            None => {
                let query = CardQuery {
                    filter: CardFilter {
                        suspended: Some(false),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                self.storage.search_cards(&query)?.cards
            }
        };
        Ok(Forecast::build(deck_id, &cards, horizon, now))
    }
}

// ============================================================================
// TESTS
// ============================================================================
