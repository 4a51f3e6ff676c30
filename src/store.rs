//! SQLite persistence for learners, the lesson catalogue, and progress rows.
//!
//! Badge, prerequisite and option lists are JSON text columns. They are
//! encoded and decoded here and nowhere else; the rest of the crate only sees
//! typed collections. A malformed stored list decodes to empty and is logged.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::badges::BadgeSet;
use crate::config::LessonCfg;
use crate::domain::{Exercise, ExerciseKind, Learner, Lesson};
use crate::error::{CoreError, Result};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS learners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    xp INTEGER NOT NULL DEFAULT 0,
    streak INTEGER NOT NULL DEFAULT 0,
    last_login TEXT,
    badges TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS lessons (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    sort_order INTEGER NOT NULL UNIQUE,
    xp_reward INTEGER NOT NULL CHECK (xp_reward > 0),
    prerequisites TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lesson_id INTEGER NOT NULL REFERENCES lessons(id),
    kind TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    options TEXT NOT NULL DEFAULT '[]',
    hint TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_exercises_lesson ON exercises(lesson_id, sort_order);

CREATE TABLE IF NOT EXISTS progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    learner_id INTEGER NOT NULL REFERENCES learners(id),
    lesson_id INTEGER NOT NULL REFERENCES lessons(id),
    completed INTEGER NOT NULL DEFAULT 0,
    best_score REAL NOT NULL DEFAULT 0.0,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_attempt TEXT,
    UNIQUE (learner_id, lesson_id)
);
"#;

/// Shared handle to the database. Cloning shares the same connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        // Other writers hold the lock only for one short transaction.
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Lock the connection. A poisoned lock still holds a usable connection:
    /// any half-done transaction was rolled back when its guard dropped.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` inside `BEGIN IMMEDIATE`. The write lock is taken up front so
    /// two read-modify-write cycles cannot interleave. Commits on `Ok`, rolls
    /// back on `Err` (the transaction is dropped without commit).
    pub fn with_immediate_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Insert the lesson catalogue if the lessons table is empty.
    /// Returns the number of lessons inserted.
    #[instrument(level = "info", skip_all, fields(lessons = lessons.len()))]
    pub fn seed_catalogue(&self, lessons: &[LessonCfg]) -> Result<usize> {
        self.with_immediate_transaction(|tx| {
            if lesson_count(tx)? > 0 {
                info!(target: "calcuingo_backend", "Catalogue already present; skipping seed");
                return Ok(0);
            }
            for lesson in lessons {
                insert_lesson(tx, lesson)?;
            }
            info!(target: "calcuingo_backend", count = lessons.len(), "Seeded lesson catalogue");
            Ok(lessons.len())
        })
    }
}

//
// JSON list columns
//

fn decode_list<T: DeserializeOwned>(raw: Option<String>, column: &str, id: i64) -> Vec<T> {
    let Some(raw) = raw else { return Vec::new() };
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(target: "calcuingo_backend", %column, %id, error = %e, "Malformed stored list; using empty list");
            Vec::new()
        }
    }
}

fn encode_list<T: serde::Serialize>(items: &[T]) -> Result<String> {
    serde_json::to_string(items).map_err(|e| CoreError::Store(format!("encode list: {e}")))
}

//
// Learners
//

const LEARNER_COLUMNS: &str = "SELECT id, username, password_hash, xp, streak, last_login, badges FROM learners";

fn learner_from_row(row: &Row<'_>) -> rusqlite::Result<Learner> {
    let id: i64 = row.get(0)?;
    Ok(Learner {
        id,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        xp: row.get(3)?,
        streak: row.get(4)?,
        last_login: row.get(5)?,
        badges: BadgeSet::from(decode_list::<String>(row.get(6)?, "badges", id)),
    })
}

pub fn get_learner(conn: &Connection, id: i64) -> Result<Option<Learner>> {
    let sql = format!("{LEARNER_COLUMNS} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], learner_from_row).optional()?)
}

pub fn find_learner_by_username(conn: &Connection, username: &str) -> Result<Option<Learner>> {
    let sql = format!("{LEARNER_COLUMNS} WHERE username = ?1");
    Ok(conn.query_row(&sql, params![username], learner_from_row).optional()?)
}

/// Create a learner with zero XP, zero streak and no badges.
pub fn insert_learner(conn: &Connection, username: &str, password_hash: &str) -> Result<Learner> {
    if find_learner_by_username(conn, username)?.is_some() {
        return Err(CoreError::Validation("Username already exists".into()));
    }
    conn.execute(
        "INSERT INTO learners (username, password_hash, xp, streak, badges) VALUES (?1, ?2, 0, 0, '[]')",
        params![username, password_hash],
    )?;
    Ok(Learner {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        xp: 0,
        streak: 0,
        last_login: None,
        badges: BadgeSet::new(),
    })
}

/// Persist the mutable learner fields (XP, streak, last login, badges).
pub fn save_learner(conn: &Connection, learner: &Learner) -> Result<()> {
    conn.execute(
        "UPDATE learners SET xp = ?1, streak = ?2, last_login = ?3, badges = ?4 WHERE id = ?5",
        params![
            learner.xp,
            learner.streak,
            learner.last_login,
            encode_list(learner.badges.names())?,
            learner.id,
        ],
    )?;
    Ok(())
}

//
// Lessons & exercises
//

const LESSON_COLUMNS: &str = "SELECT id, title, description, sort_order, xp_reward, prerequisites FROM lessons";

fn lesson_from_row(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    let id: i64 = row.get(0)?;
    Ok(Lesson {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        order: row.get(3)?,
        xp_reward: row.get(4)?,
        prerequisites: decode_list::<i64>(row.get(5)?, "prerequisites", id),
    })
}

pub fn get_lesson(conn: &Connection, id: i64) -> Result<Option<Lesson>> {
    let sql = format!("{LESSON_COLUMNS} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], lesson_from_row).optional()?)
}

/// All lessons in learning-path order.
pub fn list_lessons(conn: &Connection) -> Result<Vec<Lesson>> {
    let sql = format!("{LESSON_COLUMNS} ORDER BY sort_order");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], lesson_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn lesson_count(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("SELECT COUNT(*) FROM lessons", [], |r| r.get(0))?)
}

const EXERCISE_COLUMNS: &str =
    "SELECT id, lesson_id, kind, question, answer, options, hint, sort_order FROM exercises";

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    let id: i64 = row.get(0)?;
    let kind_raw: String = row.get(2)?;
    let kind = kind_raw.parse::<ExerciseKind>().unwrap_or_else(|_| {
        warn!(target: "calcuingo_backend", %id, kind = %kind_raw, "Unknown exercise kind; treating as fill_blank");
        ExerciseKind::FillBlank
    });
    Ok(Exercise {
        id,
        lesson_id: row.get(1)?,
        kind,
        question: row.get(3)?,
        answer: row.get(4)?,
        options: decode_list::<String>(row.get(5)?, "options", id),
        hint: row.get(6)?,
        order: row.get(7)?,
    })
}

pub fn get_exercise(conn: &Connection, id: i64) -> Result<Option<Exercise>> {
    let sql = format!("{EXERCISE_COLUMNS} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], exercise_from_row).optional()?)
}

pub fn list_exercises(conn: &Connection, lesson_id: i64) -> Result<Vec<Exercise>> {
    let sql = format!("{EXERCISE_COLUMNS} WHERE lesson_id = ?1 ORDER BY sort_order, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![lesson_id], exercise_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Insert one lesson and its exercises. The lesson id defaults to its order.
pub fn insert_lesson(conn: &Connection, cfg: &LessonCfg) -> Result<i64> {
    let id = cfg.id.unwrap_or(cfg.order);
    conn.execute(
        "INSERT INTO lessons (id, title, description, sort_order, xp_reward, prerequisites) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, cfg.title, cfg.description, cfg.order, cfg.xp_reward, encode_list(&cfg.prerequisites)?],
    )?;
    for (idx, ex) in cfg.exercises.iter().enumerate() {
        let order = ex.order.unwrap_or(idx as i64 + 1);
        conn.execute(
            "INSERT INTO exercises (lesson_id, kind, question, answer, options, hint, sort_order) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, ex.kind.as_str(), ex.question, ex.answer, encode_list(&ex.options)?, ex.hint, order],
        )?;
    }
    Ok(id)
}

#[cfg(test)]
impl Store {
    /// Insert a learner with a placeholder hash; returns its id.
    pub(crate) fn seed_learner_for_tests(&self, username: &str) -> i64 {
        insert_learner(&self.conn(), username, "$argon2id$placeholder").unwrap().id
    }

    /// Insert a lesson with one fill-blank exercise (answer "13"); returns the lesson id.
    pub(crate) fn seed_lesson_for_tests(&self, xp_reward: u32) -> i64 {
        let conn = self.conn();
        let order = lesson_count(&conn).unwrap() as i64 + 1;
        let cfg = LessonCfg {
            id: None,
            title: format!("Lesson {order}"),
            description: String::new(),
            order,
            xp_reward,
            prerequisites: vec![],
            exercises: vec![crate::config::ExerciseCfg {
                kind: ExerciseKind::FillBlank,
                question: "If f(x) = 2x + 3, then f(5) = ___".into(),
                answer: "13".into(),
                options: vec![],
                hint: Some("Substitute x = 5 into the function".into()),
                order: None,
            }],
        };
        insert_lesson(&conn, &cfg).unwrap()
    }
}
