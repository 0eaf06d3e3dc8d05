//! Engine and deck configuration
//!
//! `EngineConfig` holds policy constants that apply to every deck an engine
//! studies. `DeckSettings` holds the per-deck daily limits persisted through
//! storage.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Interval (days) at which a card counts as mature
pub const DEFAULT_MATURITY_THRESHOLD_DAYS: i64 = 21;

/// Assumed time per card when estimating a study plan
pub const DEFAULT_SECONDS_PER_CARD: u32 = 30;

/// Default number of days covered by a workload forecast
pub const DEFAULT_FORECAST_HORIZON_DAYS: u32 = 7;

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Policy knobs for the review engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Cards whose current interval reaches this many days are mature
    pub maturity_threshold_days: i64,
    /// Seconds assumed per card when no history is available
    pub assumed_seconds_per_card: u32,
    /// Default forecast length in days
    pub forecast_horizon_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maturity_threshold_days: DEFAULT_MATURITY_THRESHOLD_DAYS,
            assumed_seconds_per_card: DEFAULT_SECONDS_PER_CARD,
            forecast_horizon_days: DEFAULT_FORECAST_HORIZON_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn with_maturity_threshold_days(mut self, days: i64) -> Self {
        self.maturity_threshold_days = days;
        self
    }

    pub fn with_assumed_seconds_per_card(mut self, seconds: u32) -> Self {
        self.assumed_seconds_per_card = seconds;
        self
    }

    pub fn with_forecast_horizon_days(mut self, days: u32) -> Self {
        self.forecast_horizon_days = days;
        self
    }
}

// ============================================================================
// DECK SETTINGS
// ============================================================================

fn default_new_cards_per_day() -> i32 {
    20
}

fn default_max_reviews_per_day() -> i32 {
    200
}

fn default_requested_retention() -> f64 {
    0.9
}

fn default_maximum_interval_days() -> i32 {
    36_500
}

/// Per-deck study limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSettings {
    /// Maximum new cards introduced per day
    #[serde(default = "default_new_cards_per_day")]
    pub new_cards_per_day: i32,
    /// Maximum review cards shown per day
    #[serde(default = "default_max_reviews_per_day")]
    pub max_reviews_per_day: i32,
    /// Target recall probability, strictly between 0 and 1
    #[serde(default = "default_requested_retention")]
    pub requested_retention: f64,
    /// Longest interval the oracle may schedule
    #[serde(default = "default_maximum_interval_days")]
    pub maximum_interval_days: i32,
}

impl Default for DeckSettings {
    fn default() -> Self {
        Self {
            new_cards_per_day: default_new_cards_per_day(),
            max_reviews_per_day: default_max_reviews_per_day(),
            requested_retention: default_requested_retention(),
            maximum_interval_days: default_maximum_interval_days(),
        }
    }
}

impl DeckSettings {
    /// Check every field against its domain
    pub fn validate(&self) -> Result<()> {
        if self.new_cards_per_day < 0 {
            return Err(SchedulerError::Validation(format!(
                "newCardsPerDay must be >= 0, got {}",
                self.new_cards_per_day
            )));
        }
        if self.max_reviews_per_day < 0 {
            return Err(SchedulerError::Validation(format!(
                "maxReviewsPerDay must be >= 0, got {}",
                self.max_reviews_per_day
            )));
        }
        if !(self.requested_retention > 0.0 && self.requested_retention < 1.0) {
            return Err(SchedulerError::Validation(format!(
                "requestedRetention must be in (0, 1), got {}",
                self.requested_retention
            )));
        }
        if self.maximum_interval_days < 1 {
            return Err(SchedulerError::Validation(format!(
                "maximumIntervalDays must be >= 1, got {}",
                self.maximum_interval_days
            )));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
