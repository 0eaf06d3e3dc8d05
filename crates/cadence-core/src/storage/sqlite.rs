//! SQLite Storage Implementation
//!
//! Durable implementation of the storage contract with:
//! - Versioned schema migrations
//! - Separate reader/writer connections (WAL mode)
//! - Transactional review commits (card update + review log entry)
//! - Parameterized card search

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use super::{CardQuery, CardSearchResult, Result, Storage, StorageError};
use crate::card::{Card, CardState, Grade, MemoryModel};
use crate::config::DeckSettings;
use crate::review::ReviewLogEntry;
use crate::session::{GradeCounts, StudySession};

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed storage
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, so the storage can be shared as `Arc<SqliteStorage>`
/// between engine instances studying different decks.
pub struct SqliteStorage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteStorage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        // SQLite's LOWER() only folds ASCII
        conn.create_scalar_function(
            "unicode_lower",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
        )?;
        Ok(())
    }

    /// Open (or create) a database
    ///
    /// Without an explicit path the database lives in the platform data
    /// directory, e.g. `~/.local/share/cadence/cadence.db` on Linux.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("org", "cadence", "cadence").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("cadence.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        tracing::debug!(path = %path.display(), "Opened SQLite storage");

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            path,
        })
    }

    /// Database file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    fn reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    /// Number of stored cards
    pub fn count_cards(&self) -> Result<i64> {
        let reader = self.reader()?;
        let count = reader.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Create a consistent backup using VACUUM INTO
    pub fn backup_to(&self, path: &Path) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| StorageError::Init("Invalid backup path encoding".to_string()))?;
        if path_str.bytes().any(|b| b < 0x20 && b != b'\t') {
            return Err(StorageError::Init(
                "Backup path contains invalid characters".to_string(),
            ));
        }
        let reader = self.reader()?;
        // VACUUM INTO doesn't support parameterized queries; escape single quotes
        reader.execute_batch(&format!("VACUUM INTO '{}'", path_str.replace('\'', "''")))?;
        tracing::info!(backup = %path_str, "Database backup written");
        Ok(())
    }

    // ========================================================================
    // ROW CONVERSION
    // ========================================================================

    /// Format a timestamp with fixed width so text ordering matches time ordering
    fn format_timestamp(value: DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    fn conversion_error(message: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(StorageError::InvalidValue(message)),
        )
    }

    fn parse_json<T: DeserializeOwned>(value: &str) -> rusqlite::Result<T> {
        serde_json::from_str(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(StorageError::InvalidTimestamp(format!(
                        "Invalid {} timestamp '{}': {}",
                        field_name, value, e
                    ))),
                )
            })
    }

    fn parse_uuid(value: &str, field_name: &str) -> rusqlite::Result<Uuid> {
        Uuid::parse_str(value)
            .map_err(|e| Self::conversion_error(format!("Invalid {} '{}': {}", field_name, value, e)))
    }

    fn parse_state(value: &str) -> rusqlite::Result<CardState> {
        CardState::parse_name(value)
            .ok_or_else(|| Self::conversion_error(format!("Unknown card state '{}'", value)))
    }

    fn count(row: &rusqlite::Row, column: &str) -> rusqlite::Result<u32> {
        let value: i64 = row.get(column)?;
        u32::try_from(value)
            .map_err(|_| Self::conversion_error(format!("{} out of range: {}", column, value)))
    }

    fn millis(row: &rusqlite::Row, column: &str) -> rusqlite::Result<u64> {
        let value: i64 = row.get(column)?;
        u64::try_from(value)
            .map_err(|_| Self::conversion_error(format!("{} out of range: {}", column, value)))
    }

    /// Convert a row to Card
    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<Card> {
        let id: String = row.get("id")?;
        let deck_id: String = row.get("deck_id")?;
        let tags_json: String = row.get("tags")?;
        let tags: Vec<String> = Self::parse_json(&tags_json)?;

        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        let due: String = row.get("due")?;
        let last_review: Option<String> = row.get("last_review")?;
        let state: String = row.get("state")?;

        Ok(Card {
            id: Self::parse_uuid(&id, "card id")?,
            deck_id: Self::parse_uuid(&deck_id, "deck id")?,
            front: row.get("front")?,
            back: row.get("back")?,
            tags,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
            memory_model: MemoryModel {
                difficulty: row.get("difficulty")?,
                stability: row.get("stability")?,
            },
            state: Self::parse_state(&state)?,
            due: Self::parse_timestamp(&due, "due")?,
            last_review: last_review
                .map(|s| Self::parse_timestamp(&s, "last_review"))
                .transpose()?,
            suspended: row.get("suspended")?,
            buried: row.get("buried")?,
            leech_count: Self::count(row, "leech_count")?,
        })
    }

    /// Convert a row to ReviewLogEntry
    fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<ReviewLogEntry> {
        let id: String = row.get("id")?;
        let card_id: String = row.get("card_id")?;
        let session_id: Option<String> = row.get("session_id")?;
        let grade: i32 = row.get("grade")?;
        let reviewed_at: String = row.get("reviewed_at")?;
        let state_before: String = row.get("state_before")?;
        let due_before: String = row.get("due_before")?;
        let state_after: String = row.get("state_after")?;
        let due_after: String = row.get("due_after")?;
        let oracle_log: String = row.get("oracle_log")?;

        Ok(ReviewLogEntry {
            id: Self::parse_uuid(&id, "review id")?,
            card_id: Self::parse_uuid(&card_id, "card id")?,
            session_id: session_id
                .map(|s| Self::parse_uuid(&s, "session id"))
                .transpose()?,
            grade: Grade::from_i32(grade)
                .ok_or_else(|| Self::conversion_error(format!("Invalid grade {}", grade)))?,
            duration_ms: Self::millis(row, "duration_ms")?,
            timestamp: Self::parse_timestamp(&reviewed_at, "reviewed_at")?,
            state_before: Self::parse_state(&state_before)?,
            due_before: Self::parse_timestamp(&due_before, "due_before")?,
            state_after: Self::parse_state(&state_after)?,
            due_after: Self::parse_timestamp(&due_after, "due_after")?,
            oracle_log: Self::parse_json(&oracle_log)?,
        })
    }

    /// Convert a row to StudySession
    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<StudySession> {
        let id: String = row.get("id")?;
        let deck_id: Option<String> = row.get("deck_id")?;
        let start_time: String = row.get("start_time")?;
        let end_time: Option<String> = row.get("end_time")?;

        Ok(StudySession {
            id: Self::parse_uuid(&id, "session id")?,
            deck_id: deck_id
                .map(|s| Self::parse_uuid(&s, "deck id"))
                .transpose()?,
            start_time: Self::parse_timestamp(&start_time, "start_time")?,
            end_time: end_time
                .map(|s| Self::parse_timestamp(&s, "end_time"))
                .transpose()?,
            cards_reviewed: Self::count(row, "cards_reviewed")?,
            new_cards: Self::count(row, "new_cards")?,
            review_cards: Self::count(row, "review_cards")?,
            counts_by_grade: GradeCounts {
                again: Self::count(row, "again_count")?,
                hard: Self::count(row, "hard_count")?,
                good: Self::count(row, "good_count")?,
                easy: Self::count(row, "easy_count")?,
            },
            total_duration_ms: Self::millis(row, "total_duration_ms")?,
            average_duration_ms: Self::millis(row, "average_duration_ms")?,
        })
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    fn upsert_card(conn: &Connection, card: &Card) -> Result<()> {
        let tags = serde_json::to_string(&card.tags)?;
        conn.execute(
            "INSERT INTO cards (
                id, deck_id, front, back, tags, created_at, updated_at,
                difficulty, stability, state, due, last_review,
                suspended, buried, leech_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                deck_id = excluded.deck_id,
                front = excluded.front,
                back = excluded.back,
                tags = excluded.tags,
                updated_at = excluded.updated_at,
                difficulty = excluded.difficulty,
                stability = excluded.stability,
                state = excluded.state,
                due = excluded.due,
                last_review = excluded.last_review,
                suspended = excluded.suspended,
                buried = excluded.buried,
                leech_count = excluded.leech_count",
            params![
                card.id.to_string(),
                card.deck_id.to_string(),
                card.front,
                card.back,
                tags,
                Self::format_timestamp(card.created_at),
                Self::format_timestamp(card.updated_at),
                card.memory_model.difficulty,
                card.memory_model.stability,
                card.state.as_str(),
                Self::format_timestamp(card.due),
                card.last_review.map(Self::format_timestamp),
                card.suspended,
                card.buried,
                card.leech_count,
            ],
        )?;
        Ok(())
    }

    fn insert_review(conn: &Connection, entry: &ReviewLogEntry) -> Result<()> {
        let oracle_log = serde_json::to_string(&entry.oracle_log)?;
        let duration_ms = i64::try_from(entry.duration_ms).map_err(|_| {
            StorageError::InvalidValue(format!("duration_ms out of range: {}", entry.duration_ms))
        })?;
        conn.execute(
            "INSERT INTO review_log (
                id, card_id, session_id, grade, duration_ms, reviewed_at,
                state_before, due_before, state_after, due_after, oracle_log
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id.to_string(),
                entry.card_id.to_string(),
                entry.session_id.map(|id| id.to_string()),
                entry.grade.value(),
                duration_ms,
                Self::format_timestamp(entry.timestamp),
                entry.state_before.as_str(),
                Self::format_timestamp(entry.due_before),
                entry.state_after.as_str(),
                Self::format_timestamp(entry.due_after),
                oracle_log,
            ],
        )?;
        Ok(())
    }

    fn upsert_session(conn: &Connection, session: &StudySession) -> Result<()> {
        let to_i64 = |value: u64| {
            i64::try_from(value)
                .map_err(|_| StorageError::InvalidValue(format!("duration out of range: {}", value)))
        };
        conn.execute(
            "INSERT INTO study_sessions (
                id, deck_id, start_time, end_time, cards_reviewed, new_cards, review_cards,
                again_count, hard_count, good_count, easy_count,
                total_duration_ms, average_duration_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                deck_id = excluded.deck_id,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                cards_reviewed = excluded.cards_reviewed,
                new_cards = excluded.new_cards,
                review_cards = excluded.review_cards,
                again_count = excluded.again_count,
                hard_count = excluded.hard_count,
                good_count = excluded.good_count,
                easy_count = excluded.easy_count,
                total_duration_ms = excluded.total_duration_ms,
                average_duration_ms = excluded.average_duration_ms",
            params![
                session.id.to_string(),
                session.deck_id.map(|id| id.to_string()),
                Self::format_timestamp(session.start_time),
                session.end_time.map(Self::format_timestamp),
                session.cards_reviewed,
                session.new_cards,
                session.review_cards,
                session.counts_by_grade.again,
                session.counts_by_grade.hard,
                session.counts_by_grade.good,
                session.counts_by_grade.easy,
                to_i64(session.total_duration_ms)?,
                to_i64(session.average_duration_ms)?,
            ],
        )?;
        Ok(())
    }

    fn query_cards(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Card>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| Self::row_to_card(row))?;

        let mut result = Vec::new();
        for card in rows {
            result.push(card?);
        }
        Ok(result)
    }

    fn query_reviews(&self, sql: &str, id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(sql)?;
        let rows = stmt.query_map(params![id.to_string()], |row| Self::row_to_review(row))?;

        let mut result = Vec::new();
        for review in rows {
            result.push(review?);
        }
        Ok(result)
    }
}

// ============================================================================
// SEARCH
// ============================================================================

fn limit_value(limit: Option<usize>) -> Value {
    // SQLite treats a negative LIMIT as "no limit"
    Value::Integer(limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX)))
}

/// Build the WHERE clause for a card query
fn filter_clause(query: &CardQuery) -> (String, Vec<Value>) {
    let filter = &query.filter;
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(deck_id) = filter.deck_id {
        values.push(Value::Text(deck_id.to_string()));
        clauses.push(format!("deck_id = ?{}", values.len()));
    }
    if let Some(state) = filter.state {
        values.push(Value::Text(state.as_str().to_string()));
        clauses.push(format!("state = ?{}", values.len()));
    }
    if let Some(tag) = &filter.tag {
        values.push(Value::Text(tag.clone()));
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(cards.tags) WHERE json_each.value = ?{})",
            values.len()
        ));
    }
    if let Some(text) = &filter.text {
        values.push(Value::Text(text.to_lowercase()));
        let n = values.len();
        clauses.push(format!(
            "(instr(unicode_lower(front), ?{n}) > 0 OR instr(unicode_lower(back), ?{n}) > 0)"
        ));
    }
    if let Some(suspended) = filter.suspended {
        values.push(Value::Integer(i64::from(suspended)));
        clauses.push(format!("suspended = ?{}", values.len()));
    }
    if let Some(buried) = filter.buried {
        values.push(Value::Integer(i64::from(buried)));
        clauses.push(format!("buried = ?{}", values.len()));
    }
    if let Some(before) = filter.due_before {
        values.push(Value::Text(SqliteStorage::format_timestamp(before)));
        clauses.push(format!("due < ?{}", values.len()));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (clause, values)
}

// ============================================================================
// CONTRACT
// ============================================================================

impl Storage for SqliteStorage {
    fn load_card(&self, id: Uuid) -> Result<Option<Card>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM cards WHERE id = ?1")?;
        let card = stmt
            .query_row(params![id.to_string()], |row| Self::row_to_card(row))
            .optional()?;
        Ok(card)
    }

    fn save_card(&self, card: &Card) -> Result<()> {
        let writer = self.writer()?;
        Self::upsert_card(&writer, card)
    }

    fn save_cards(&self, cards: &[Card]) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        for card in cards {
            Self::upsert_card(&tx, card)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_cards_by_deck(&self, deck_id: Uuid) -> Result<Vec<Card>> {
        self.query_cards(
            "SELECT * FROM cards WHERE deck_id = ?1 ORDER BY created_at ASC, id ASC",
            vec![Value::Text(deck_id.to_string())],
        )
    }

    fn load_due_cards(
        &self,
        deck_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<Card>> {
        self.query_cards(
            "SELECT * FROM cards
             WHERE suspended = 0 AND buried = 0
             AND (due <= ?1 OR state IN ('learning', 'relearning'))
             AND (?2 IS NULL OR deck_id = ?2)
             ORDER BY due ASC, id ASC
             LIMIT ?3",
            vec![
                Value::Text(Self::format_timestamp(now)),
                deck_id.map_or(Value::Null, |id| Value::Text(id.to_string())),
                limit_value(limit),
            ],
        )
    }

    fn save_review(&self, entry: &ReviewLogEntry) -> Result<()> {
        let writer = self.writer()?;
        Self::insert_review(&writer, entry)
    }

    fn commit_review(&self, card: &Card, entry: &ReviewLogEntry) -> Result<()> {
        let mut writer = self.writer()?;
        let tx = writer.transaction()?;
        Self::upsert_card(&tx, card)?;
        Self::insert_review(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    fn load_card_reviews(&self, card_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        self.query_reviews(
            "SELECT * FROM review_log WHERE card_id = ?1 ORDER BY reviewed_at ASC, id ASC",
            card_id,
        )
    }

    fn load_deck_reviews(&self, deck_id: Uuid) -> Result<Vec<ReviewLogEntry>> {
        self.query_reviews(
            "SELECT r.* FROM review_log r
             JOIN cards c ON c.id = r.card_id
             WHERE c.deck_id = ?1
             ORDER BY r.reviewed_at ASC, r.id ASC",
            deck_id,
        )
    }

    fn create_session(&self, deck_id: Option<Uuid>, start: DateTime<Utc>) -> Result<StudySession> {
        let session = StudySession::new(deck_id, start);
        let writer = self.writer()?;
        Self::upsert_session(&writer, &session)?;
        Ok(session)
    }

    fn update_session(&self, session: &StudySession) -> Result<()> {
        let writer = self.writer()?;
        Self::upsert_session(&writer, session)
    }

    fn load_session(&self, id: Uuid) -> Result<Option<StudySession>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare("SELECT * FROM study_sessions WHERE id = ?1")?;
        let session = stmt
            .query_row(params![id.to_string()], |row| Self::row_to_session(row))
            .optional()?;
        Ok(session)
    }

    fn load_deck_settings(&self, deck_id: Uuid) -> Result<Option<DeckSettings>> {
        let reader = self.reader()?;
        let json: Option<String> = reader
            .query_row(
                "SELECT settings FROM deck_settings WHERE deck_id = ?1",
                params![deck_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_deck_settings(&self, deck_id: Uuid, settings: &DeckSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO deck_settings (deck_id, settings, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(deck_id) DO UPDATE SET
                settings = excluded.settings,
                updated_at = excluded.updated_at",
            params![
                deck_id.to_string(),
                json,
                Self::format_timestamp(Utc::now())
            ],
        )?;
        Ok(())
    }

    fn search_cards(&self, query: &CardQuery) -> Result<CardSearchResult> {
        let (clause, values) = filter_clause(query);

        let total: i64 = {
            let reader = self.reader()?;
            reader.query_row(
                &format!("SELECT COUNT(*) FROM cards{}", clause),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?
        };

        let direction = query.sort_order.as_sql();
        let mut page_values = values;
        page_values.push(limit_value(query.limit));
        let sql = format!(
            "SELECT * FROM cards{} ORDER BY {} {dir}, id {dir} LIMIT ?{}",
            clause,
            query.sort_by.column(),
            page_values.len(),
            dir = direction,
        );
        let cards = self.query_cards(&sql, page_values)?;

        Ok(CardSearchResult {
            cards,
            total: usize::try_from(total).unwrap_or_default(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
