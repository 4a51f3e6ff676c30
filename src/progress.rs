//! Progress record store: one row per (learner, lesson) pair.
//!
//! The transition rules live in [`record_attempt`], which is pure. The query
//! helpers take a `&Connection` so the reward engine can run them inside its
//! own transaction (a `rusqlite::Transaction` derefs to `Connection`).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::ProgressRecord;
use crate::error::Result;

const SELECT_COLUMNS: &str =
  "SELECT id, learner_id, lesson_id, completed, best_score, attempts, last_attempt FROM progress";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ProgressRecord> {
  Ok(ProgressRecord {
    id: row.get(0)?,
    learner_id: row.get(1)?,
    lesson_id: row.get(2)?,
    completed: row.get(3)?,
    best_score: row.get(4)?,
    attempts: row.get(5)?,
    last_attempt: row.get(6)?,
  })
}

/// Apply one graded submission to a record.
///
/// Attempts and the timestamp always move. A correct answer sets full score
/// and completion; a wrong one never takes either back.
pub fn record_attempt(mut record: ProgressRecord, is_correct: bool, now: DateTime<Utc>) -> ProgressRecord {
  record.attempts = record.attempts.saturating_add(1);
  record.last_attempt = Some(now);
  if is_correct {
    record.best_score = record.best_score.max(1.0);
    record.completed = true;
  }
  record
}

/// Mark a record completed outside of grading (manual completion).
/// Attempts are left alone; no answer was submitted.
pub fn mark_completed(mut record: ProgressRecord) -> ProgressRecord {
  record.best_score = record.best_score.max(1.0);
  record.completed = true;
  record
}

pub fn find(conn: &Connection, learner_id: i64, lesson_id: i64) -> Result<Option<ProgressRecord>> {
  let sql = format!("{SELECT_COLUMNS} WHERE learner_id = ?1 AND lesson_id = ?2");
  let record = conn
    .query_row(&sql, params![learner_id, lesson_id], from_row)
    .optional()?;
  Ok(record)
}

/// Existing record for the pair, or a fresh one (not completed, score 0, no attempts).
pub fn get_or_create(conn: &Connection, learner_id: i64, lesson_id: i64) -> Result<ProgressRecord> {
  if let Some(existing) = find(conn, learner_id, lesson_id)? {
    return Ok(existing);
  }
  conn.execute(
    "INSERT INTO progress (learner_id, lesson_id, completed, best_score, attempts) VALUES (?1, ?2, 0, 0.0, 0)",
    params![learner_id, lesson_id],
  )?;
  Ok(ProgressRecord {
    id: conn.last_insert_rowid(),
    learner_id,
    lesson_id,
    completed: false,
    best_score: 0.0,
    attempts: 0,
    last_attempt: None,
  })
}

pub fn save(conn: &Connection, record: &ProgressRecord) -> Result<()> {
  conn.execute(
    "UPDATE progress SET completed = ?1, best_score = ?2, attempts = ?3, last_attempt = ?4 WHERE id = ?5",
    params![record.completed, record.best_score, record.attempts, record.last_attempt, record.id],
  )?;
  Ok(())
}

pub fn list_for_learner(conn: &Connection, learner_id: i64) -> Result<Vec<ProgressRecord>> {
  let sql = format!("{SELECT_COLUMNS} WHERE learner_id = ?1 ORDER BY lesson_id");
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params![learner_id], from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// (completed lesson count, total attempts across all lessons)
pub fn totals_for_learner(conn: &Connection, learner_id: i64) -> Result<(u32, u32)> {
  let totals = conn.query_row(
    "SELECT COALESCE(SUM(completed), 0), COALESCE(SUM(attempts), 0) FROM progress WHERE learner_id = ?1",
    params![learner_id],
    |r| Ok((r.get::<_, u32>(0)?, r.get::<_, u32>(1)?)),
  )?;
  Ok(totals)
}
