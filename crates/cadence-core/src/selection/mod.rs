//! Card Selection
//!
//! Pure functions that decide what to study:
//!
//! - `select_due_cards`: the prioritized queue of cards due right now
//! - `StudyPlan::build`: a day's workload under per-deck caps
//!
//! Both take card sets already loaded from storage and never mutate them.

mod due;
mod plan;

pub use due::{select_due_cards, DueCard, DuePriority};
pub use plan::StudyPlan;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Seconds in a day, used for whole-day arithmetic
pub(crate) const SECONDS_PER_DAY: i64 = 86_400;

/// First instant of the day after `date` (UTC)
///
/// "Due on or before the end of `date`" is `due < next_day_start(date)`.
pub(crate) fn next_day_start(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt()
        .unwrap_or(NaiveDate::MAX)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Whole days `due` lies behind `now`; 0 when not yet due
pub(crate) fn overdue_by_days(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    ((now - due).num_seconds() / SECONDS_PER_DAY).max(0)
}
