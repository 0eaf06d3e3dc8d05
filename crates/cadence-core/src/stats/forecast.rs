//! Forecasts
//!
//! - `PerformanceForecast`: how a single card's recall decays if it is not
//!   reviewed again. Stability and difficulty are held constant.
//! - `Forecast`: how many cards fall due on each upcoming calendar day.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{days_between, retrievability};
use crate::card::{Card, CardState};
use crate::selection::next_day_start;

// ============================================================================
// PERFORMANCE FORECAST
// ============================================================================

/// Projected state of a card on one future day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub date: DateTime<Utc>,
    pub retrievability: f64,
    pub difficulty: f64,
    pub stability: f64,
}

/// Finite, restartable projection over `days_ahead` days
///
/// Iterate with `iter()` (or `&forecast`) as many times as needed; each pass
/// yields the same points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceForecast {
    pub card_id: Uuid,
    /// Day 0 of the projection
    pub start: DateTime<Utc>,
    /// Instant the forgetting curve is measured from
    pub anchor: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub days_ahead: u32,
}

impl PerformanceForecast {
    /// Project a card forward from `now`
    pub fn for_card(card: &Card, days_ahead: u32, now: DateTime<Utc>) -> Self {
        Self {
            card_id: card.id,
            start: now,
            anchor: card.last_review.unwrap_or(now),
            stability: card.memory_model.stability,
            difficulty: card.memory_model.difficulty,
            days_ahead,
        }
    }

    /// Point for day `offset` (1-based)
    ///
    /// `None` once the date is past the last representable instant.
    pub fn point(&self, offset: u32) -> Option<PerformancePoint> {
        let date = self
            .start
            .checked_add_signed(Duration::days(i64::from(offset)))?;
        Some(PerformancePoint {
            date,
            retrievability: retrievability(self.stability, days_between(self.anchor, date)),
            difficulty: self.difficulty,
            stability: self.stability,
        })
    }

    /// Last day with a representable date, capped at `days_ahead`
    fn last_day(&self) -> u32 {
        let room = (DateTime::<Utc>::MAX_UTC - self.start).num_days().max(0);
        self.days_ahead.min(u32::try_from(room).unwrap_or(u32::MAX))
    }

    pub fn iter(&self) -> PerformancePoints<'_> {
        PerformancePoints {
            forecast: self,
            next: 1,
            end: u64::from(self.last_day()),
        }
    }

    /// Number of points; shorter than `days_ahead` only near the end of the calendar
    pub fn len(&self) -> usize {
        self.last_day() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &'a PerformanceForecast {
    type Item = PerformancePoint;
    type IntoIter = PerformancePoints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the points of a `PerformanceForecast`
#[derive(Debug, Clone)]
pub struct PerformancePoints<'a> {
    forecast: &'a PerformanceForecast,
    next: u64,
    end: u64,
}

impl Iterator for PerformancePoints<'_> {
    type Item = PerformancePoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let offset = u32::try_from(self.next).ok()?;
        self.next += 1;
        self.forecast.point(offset)
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self.next.saturating_add(n as u64);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PerformancePoints<'_> {}

// ============================================================================
// WORKLOAD FORECAST
// ============================================================================

/// Cards falling due on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Learning and Relearning cards
    pub learning: usize,
    pub review: usize,
    pub new: usize,
    pub total: usize,
}

impl ForecastDay {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            learning: 0,
            review: 0,
            new: 0,
            total: 0,
        }
    }

    fn add(&mut self, state: CardState) {
        match state {
            CardState::Learning | CardState::Relearning => self.learning += 1,
            CardState::Review => self.review += 1,
            CardState::New => self.new += 1,
        }
        self.total += 1;
    }
}

/// Due-card workload per day, starting today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<Uuid>,
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    /// Bucket cards by due day over `horizon_days` days
    ///
    /// Day 0 also holds everything already overdue. Suspended cards are
    /// skipped; buried cards count from day 1 at the earliest. The horizon
    /// ends early at the last representable calendar day.
    pub fn build<'a, I>(
        deck_id: Option<Uuid>,
        cards: I,
        horizon_days: u32,
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let today = now.date_naive();
        let mut days: Vec<ForecastDay> = (0..horizon_days)
            .map_while(|offset| today.checked_add_days(Days::new(u64::from(offset))))
            .map(ForecastDay::empty)
            .collect();

        let tomorrow = next_day_start(today);
        for card in cards
            .into_iter()
            .filter(|c| !c.suspended)
            .filter(|c| deck_id.is_none_or(|deck| c.deck_id == deck))
        {
            let mut offset = if card.due < tomorrow {
                0
            } else {
                (card.due.date_naive() - today).num_days()
            };
            if card.buried {
                offset = offset.max(1);
            }
            if let Some(day) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) {
                day.add(card.state);
            }
        }

        Self { deck_id, days }
    }

    /// Cards due across the whole horizon
    pub fn total(&self) -> usize {
        self.days.iter().map(|d| d.total).sum()
    }

    /// Day with the largest workload (earliest on ties)
    pub fn busiest_day(&self) -> Option<&ForecastDay> {
        self.days
            .iter()
            .rev()
            .max_by_key(|d| d.total)
            .filter(|d| d.total > 0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
