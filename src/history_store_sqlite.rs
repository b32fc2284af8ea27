use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::{DopamindError, DopamindResult, SafeLock};
use crate::history_store::{
    mood_from_record, HistoryQuery, HistoryStore, MoodEntry, RewardRecord, SessionRecord,
};
use crate::migrations::run_migrations;

/// SQLite-backed history: users, moods, dopamine_scores and sessions tables.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

fn to_db_time(at: DateTime<Utc>) -> String {
    // Fixed width so that text comparison matches time ordering.
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(value: &str, field: &str) -> DopamindResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DopamindError::internal(format!("failed to parse {field} '{value}': {e}")))
}

fn to_i64(value: usize, field: &str) -> DopamindResult<i64> {
    i64::try_from(value)
        .map_err(|_| DopamindError::internal(format!("{field} {value} exceeds SQLite INTEGER range")))
}

impl SqliteHistoryStore {
    pub fn open<P: AsRef<Path>>(path: P) -> DopamindResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DopamindError::io(format!("creating database directory {}", parent.display()), e)
            })?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| DopamindError::database("opening SQLite history database", e))?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            tracing::warn!("Failed to enable WAL mode: {err}");
        }
        let store = Self::init(conn, Some(path))?;
        if let Some(path) = &store.path {
            tracing::info!("History database initialized at {}", path.display());
        }
        Ok(store)
    }

    pub fn open_in_memory() -> DopamindResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DopamindError::database("opening in-memory SQLite database", e))?;
        Self::init(conn, None)
    }

    fn init(mut conn: Connection, path: Option<PathBuf>) -> DopamindResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| DopamindError::database("enabling foreign keys", e))?;
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn touch_user(&self, user_id: &str, at: DateTime<Utc>) -> DopamindResult<()> {
        let conn = self.conn.safe_lock("history_db")?;
        conn.execute(
            "INSERT INTO users (id, created_at, last_seen_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET last_seen_at = excluded.last_seen_at",
            params![user_id, to_db_time(at)],
        )
        .map_err(|e| DopamindError::database("upserting user", e))?;
        Ok(())
    }

    fn user_exists(&self, user_id: &str) -> DopamindResult<bool> {
        let conn = self.conn.safe_lock("history_db")?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| DopamindError::database("looking up user", e))?;
        Ok(count > 0)
    }

    fn record_reward(&self, record: &RewardRecord<'_>) -> DopamindResult<MoodEntry> {
        let entry = mood_from_record(record);
        let recorded_at = to_db_time(entry.recorded_at);

        let mut conn = self.conn.safe_lock("history_db")?;
        let tx = conn
            .transaction()
            .map_err(|e| DopamindError::database("opening reward transaction", e))?;
        tx.execute(
            "INSERT INTO moods (id, user_id, reward_type, emotion, intensity, confidence, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.user_id,
                entry.reward_type.as_str(),
                entry.emotion.as_str(),
                entry.intensity,
                entry.confidence,
                recorded_at,
            ],
        )
        .map_err(|e| DopamindError::database("inserting mood", e))?;
        tx.execute(
            "INSERT INTO dopamine_scores (id, mood_id, user_id, baseline, peak, duration, decay_rate, emotional_impact, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Uuid::new_v4().to_string(),
                entry.id,
                entry.user_id,
                record.dopamine.baseline,
                record.dopamine.peak,
                record.dopamine.duration,
                record.dopamine.decay_rate,
                record.dopamine.emotional_impact,
                recorded_at,
            ],
        )
        .map_err(|e| DopamindError::database("inserting dopamine score", e))?;
        tx.commit()
            .map_err(|e| DopamindError::database("committing reward", e))?;
        Ok(entry)
    }

    fn moods(&self, query: &HistoryQuery) -> DopamindResult<Vec<MoodEntry>> {
        let conn = self.conn.safe_lock("history_db")?;
        let mut stmt = conn
            .prepare(
                "SELECT m.id, m.user_id, m.reward_type, m.emotion, m.intensity, m.confidence, m.recorded_at, d.peak
                 FROM moods m
                 LEFT JOIN dopamine_scores d ON d.mood_id = m.id
                 WHERE (?1 IS NULL OR m.user_id = ?1)
                   AND (?2 IS NULL OR m.recorded_at >= ?2)
                 ORDER BY m.recorded_at, m.rowid",
            )
            .map_err(|e| DopamindError::database("preparing mood query", e))?;

        type RawMood = (String, String, String, String, f64, f64, String, Option<f64>);
        let rows: Vec<RawMood> = stmt
            .query_map(
                params![query.user_id, query.since.map(to_db_time)],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                    ))
                },
            )
            .and_then(|mapped| mapped.collect())
            .map_err(|e| DopamindError::database("reading moods", e))?;

        rows.into_iter()
            .map(
                |(id, user_id, reward_type, emotion, intensity, confidence, recorded_at, peak)|
                 -> DopamindResult<MoodEntry> {
                    Ok(MoodEntry {
                        id,
                        user_id,
                        reward_type: reward_type.parse()?,
                        emotion: emotion.parse()?,
                        intensity,
                        confidence,
                        dopamine_peak: peak,
                        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
                    })
                },
            )
            .collect()
    }

    fn record_session(&self, session: &SessionRecord) -> DopamindResult<()> {
        let conn = self.conn.safe_lock("history_db")?;
        conn.execute(
            "INSERT INTO sessions (id, user_id, duration, total_rewards, average_intensity, focus_mode, dopamine_trend, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.id,
                session.user_id,
                session.duration,
                to_i64(session.total_rewards, "total_rewards")?,
                session.average_intensity,
                session.focus_mode,
                session.dopamine_trend,
                to_db_time(session.recorded_at),
            ],
        )
        .map_err(|e| DopamindError::database("inserting session", e))?;
        Ok(())
    }

    fn session_count(&self, query: &HistoryQuery) -> DopamindResult<usize> {
        let conn = self.conn.safe_lock("history_db")?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions
                 WHERE (?1 IS NULL OR user_id = ?1)
                   AND (?2 IS NULL OR recorded_at >= ?2)",
                params![query.user_id, query.since.map(to_db_time)],
                |row| row.get(0),
            )
            .map_err(|e| DopamindError::database("counting sessions", e))?;
        usize::try_from(count)
            .map_err(|_| DopamindError::internal(format!("negative session count {count}")))
    }
}
