//! Card search queries
//!
//! `CardQuery` is interpreted by each storage implementation. The in-memory
//! evaluation here (`CardFilter::matches`, `CardQuery::apply`) is the
//! reference semantics that `SqliteStorage` mirrors in SQL.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::{Card, CardState};

/// Predicate over cards; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilter {
    pub deck_id: Option<Uuid>,
    pub state: Option<CardState>,
    /// Exact tag match
    pub tag: Option<String>,
    /// Case-insensitive substring of front or back
    pub text: Option<String>,
    pub suspended: Option<bool>,
    pub buried: Option<bool>,
    /// Due strictly before this instant
    pub due_before: Option<DateTime<Utc>>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        if self.deck_id.is_some_and(|deck| deck != card.deck_id) {
            return false;
        }
        if self.state.is_some_and(|state| state != card.state) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !card.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !card.front.to_lowercase().contains(&needle)
                && !card.back.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.suspended.is_some_and(|s| s != card.suspended) {
            return false;
        }
        if self.buried.is_some_and(|b| b != card.buried) {
            return false;
        }
        if self.due_before.is_some_and(|before| card.due >= before) {
            return false;
        }
        true
    }
}

/// Sort key for card searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSortField {
    #[default]
    Due,
    Created,
    Updated,
    Stability,
    Difficulty,
}

impl CardSortField {
    /// Column name in the `cards` table
    pub fn column(&self) -> &'static str {
        match self {
            CardSortField::Due => "due",
            CardSortField::Created => "created_at",
            CardSortField::Updated => "updated_at",
            CardSortField::Stability => "stability",
            CardSortField::Difficulty => "difficulty",
        }
    }

    fn compare(&self, a: &Card, b: &Card) -> Ordering {
        match self {
            CardSortField::Due => a.due.cmp(&b.due),
            CardSortField::Created => a.created_at.cmp(&b.created_at),
            CardSortField::Updated => a.updated_at.cmp(&b.updated_at),
            CardSortField::Stability => a
                .memory_model
                .stability
                .total_cmp(&b.memory_model.stability),
            CardSortField::Difficulty => a
                .memory_model
                .difficulty
                .total_cmp(&b.memory_model.difficulty),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Card search request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
    #[serde(default)]
    pub filter: CardFilter,
    #[serde(default)]
    pub sort_by: CardSortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
}

impl CardQuery {
    /// Query matching every card of a deck
    pub fn for_deck(deck_id: Uuid) -> Self {
        Self {
            filter: CardFilter {
                deck_id: Some(deck_id),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: CardSortField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.sort_order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the query over an in-memory card set
    pub fn apply<I>(&self, cards: I) -> CardSearchResult
    where
        I: IntoIterator<Item = Card>,
    {
        let mut matched: Vec<Card> = cards
            .into_iter()
            .filter(|card| self.filter.matches(card))
            .collect();
        let total = matched.len();

        matched.sort_by(|a, b| {
            let ord = self.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id));
            match self.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }

        CardSearchResult {
            cards: matched,
            total,
        }
    }
}

/// Search page plus the number of matches before the limit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSearchResult {
    pub cards: Vec<Card>,
    pub total: usize,
}

// ============================================================================
// TESTS
// ============================================================================
