//! Reward engine: the operations the HTTP layer calls.
//!
//! Every operation that mutates a learner runs in one immediate transaction,
//! so a progress row and the learner's XP/badges are written together or not
//! at all. Two concurrent correct submissions for the same (learner, lesson)
//! serialize on the write lock and only the first sees an uncompleted record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::auth::{hash_password, verify_password};
use crate::badges::{BadgeContext, BadgePolicy};
use crate::domain::{Completion, Learner, LoginTouch, Outcome, Stats};
use crate::error::{CoreError, Result};
use crate::grader::grade;
use crate::progress;
use crate::protocol::{ExercisePublic, LessonDetail, PathNode};
use crate::store::{self, Store};
use crate::streak::update_streak;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct RewardEngine {
  store: Store,
  policy: BadgePolicy,
  max_answer_len: usize,
}

fn learner_or_not_found(conn: &rusqlite::Connection, learner_id: i64) -> Result<Learner> {
  store::get_learner(conn, learner_id)?
    .ok_or_else(|| CoreError::NotFound(format!("learner {learner_id}")))
}

impl RewardEngine {
  pub fn new(store: Store, policy: BadgePolicy, max_answer_len: usize) -> Self {
    Self { store, policy, max_answer_len }
  }

  pub fn store(&self) -> &Store { &self.store }

  /// Credit XP and evaluate badges after a lesson flipped to completed.
  /// Runs inside the caller's transaction; returns the newly earned badges.
  fn award_completion(&self, tx: &rusqlite::Connection, learner: &mut Learner, xp_reward: u32) -> Result<Vec<String>> {
    learner.xp = learner.xp.saturating_add(xp_reward);
    let (completed_lessons, _) = progress::totals_for_learner(tx, learner.id)?;
    let ctx = BadgeContext { lessons_completed: completed_lessons, xp: learner.xp, streak: learner.streak };
    let new_badges = self.policy.award(ctx, &mut learner.badges);
    store::save_learner(tx, learner)?;
    Ok(new_badges)
  }

  fn validate_answer<'a>(&self, answer: Option<&'a str>) -> Result<&'a str> {
    let answer = answer.ok_or_else(|| CoreError::Validation("Missing answer".into()))?;
    if answer.chars().count() > self.max_answer_len {
      return Err(CoreError::Validation(format!(
        "Answer exceeds {} characters",
        self.max_answer_len
      )));
    }
    Ok(answer)
  }

  /// Grade an answer and apply it to the learner's progress.
  ///
  /// XP is credited only when the answer is correct and the lesson was not
  /// already completed before this submission.
  #[instrument(level = "info", skip(self, answer), fields(%learner_id, %lesson_id, %exercise_id))]
  pub fn submit_answer(
    &self,
    learner_id: i64,
    lesson_id: i64,
    exercise_id: i64,
    answer: Option<&str>,
    now: DateTime<Utc>,
  ) -> Result<Outcome> {
    let answer = self.validate_answer(answer)?;

    let outcome = self.store.with_immediate_transaction(|tx| {
      let mut learner = learner_or_not_found(tx, learner_id)?;
      let lesson = store::get_lesson(tx, lesson_id)?
        .ok_or_else(|| CoreError::NotFound(format!("lesson {lesson_id}")))?;
      let exercise = store::get_exercise(tx, exercise_id)?
        .filter(|ex| ex.lesson_id == lesson.id)
        .ok_or_else(|| CoreError::NotFound(format!("exercise {exercise_id} in lesson {lesson_id}")))?;

      let is_correct = grade(&exercise, answer);

      let record = progress::get_or_create(tx, learner_id, lesson_id)?;
      let was_already_completed = record.completed;
      let record = progress::record_attempt(record, is_correct, now);
      progress::save(tx, &record)?;

      let newly_completed = is_correct && !was_already_completed;
      let xp_awarded = if newly_completed { lesson.xp_reward } else { 0 };

      let new_badges = if newly_completed {
        self.award_completion(tx, &mut learner, xp_awarded)?
      } else {
        Vec::new()
      };

      Ok(Outcome {
        is_correct,
        hint: if is_correct { None } else { exercise.hint.clone() },
        xp_awarded,
        total_xp: learner.xp,
        lesson_completed: record.completed,
        newly_completed,
        attempts: record.attempts,
        new_badges,
      })
    })?;

    debug!(target: "progress", answer = %trunc_for_log(answer, 40), "Submission graded");
    info!(
      target: "progress",
      %learner_id, %lesson_id, %exercise_id,
      correct = outcome.is_correct,
      xp_awarded = outcome.xp_awarded,
      total_xp = outcome.total_xp,
      attempts = outcome.attempts,
      "Answer applied"
    );
    Ok(outcome)
  }

  /// Mark a lesson completed without grading an answer.
  ///
  /// Same award-once rule as `submit_answer`: XP only if the lesson was not
  /// already completed. Attempts are not counted.
  #[instrument(level = "info", skip(self), fields(%learner_id, %lesson_id))]
  pub fn complete_lesson(&self, learner_id: i64, lesson_id: i64, now: DateTime<Utc>) -> Result<Completion> {
    let completion = self.store.with_immediate_transaction(|tx| {
      let mut learner = learner_or_not_found(tx, learner_id)?;
      let lesson = store::get_lesson(tx, lesson_id)?
        .ok_or_else(|| CoreError::NotFound(format!("lesson {lesson_id}")))?;

      let record = progress::get_or_create(tx, learner_id, lesson_id)?;
      let newly_completed = !record.completed;
      let mut record = progress::mark_completed(record);
      if newly_completed {
        record.last_attempt = Some(now);
      }
      progress::save(tx, &record)?;

      let (xp_awarded, new_badges) = if newly_completed {
        (lesson.xp_reward, self.award_completion(tx, &mut learner, lesson.xp_reward)?)
      } else {
        (0, Vec::new())
      };
      Ok(Completion { xp_awarded, total_xp: learner.xp, newly_completed, new_badges })
    })?;
    info!(
      target: "progress",
      %learner_id, %lesson_id,
      xp_awarded = completion.xp_awarded,
      total_xp = completion.total_xp,
      "Lesson marked completed"
    );
    Ok(completion)
  }

  /// Update the daily streak for a login at `now` and persist it.
  #[instrument(level = "info", skip(self), fields(%learner_id))]
  pub fn login_touch(&self, learner_id: i64, now: DateTime<Utc>) -> Result<LoginTouch> {
    let touch = self.store.with_immediate_transaction(|tx| {
      let mut learner = learner_or_not_found(tx, learner_id)?;
      let (streak, last_login) = update_streak(learner.last_login, learner.streak, now);
      learner.streak = streak;
      learner.last_login = Some(last_login);

      let (completed_lessons, _) = progress::totals_for_learner(tx, learner_id)?;
      let ctx = BadgeContext { lessons_completed: completed_lessons, xp: learner.xp, streak };
      let new_badges = self.policy.award(ctx, &mut learner.badges);

      store::save_learner(tx, &learner)?;
      Ok(LoginTouch { streak, last_login, new_badges })
    })?;
    info!(target: "progress", %learner_id, streak = touch.streak, "Login streak updated");
    Ok(touch)
  }

  #[instrument(level = "debug", skip(self), fields(%learner_id))]
  pub fn get_stats(&self, learner_id: i64) -> Result<Stats> {
    let conn = self.store.conn();
    let learner = learner_or_not_found(&conn, learner_id)?;
    let (completed_lessons, total_attempts) = progress::totals_for_learner(&conn, learner_id)?;
    let total_lessons = store::lesson_count(&conn)?;
    Ok(Stats {
      xp: learner.xp,
      streak: learner.streak,
      badges: learner.badges.into_vec(),
      completed_lessons,
      total_lessons,
      total_attempts,
    })
  }

  /// Create a learner. Usernames are trimmed and must be unique.
  #[instrument(level = "info", skip(self, password))]
  pub fn register(&self, username: &str, password: &str) -> Result<Learner> {
    let username = username.trim();
    if username.is_empty() {
      return Err(CoreError::Validation("Username is required".into()));
    }
    if password.is_empty() {
      return Err(CoreError::Validation("Password is required".into()));
    }
    // Hash before taking the store lock; argon2 is deliberately slow.
    let hash = hash_password(password)?;
    let learner = self
      .store
      .with_immediate_transaction(|tx| store::insert_learner(tx, username, &hash))?;
    info!(target: "calcuingo_backend", id = learner.id, %username, "Learner registered");
    Ok(learner)
  }

  /// Verify credentials, then touch the login streak.
  #[instrument(level = "info", skip(self, password))]
  pub fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> Result<(Learner, LoginTouch)> {
    let learner = store::find_learner_by_username(&self.store.conn(), username.trim())?;
    let learner = match learner {
      Some(l) if verify_password(password, &l.password_hash) => l,
      _ => return Err(CoreError::Unauthorized("Invalid username or password".into())),
    };
    let touch = self.login_touch(learner.id, now)?;
    Ok((learner, touch))
  }

  /// All lessons in order, annotated with the learner's progress if one is given.
  /// Prerequisites are reported, not enforced.
  pub fn learning_path(&self, learner_id: Option<i64>) -> Result<Vec<PathNode>> {
    let conn = self.store.conn();
    let lessons = store::list_lessons(&conn)?;
    let mut by_lesson = HashMap::new();
    if let Some(id) = learner_id {
      learner_or_not_found(&conn, id)?;
      for rec in progress::list_for_learner(&conn, id)? {
        by_lesson.insert(rec.lesson_id, rec);
      }
    }
    Ok(lessons
      .into_iter()
      .map(|lesson| {
        let progress = by_lesson.remove(&lesson.id);
        PathNode { lesson, progress }
      })
      .collect())
  }

  /// A lesson and its exercises in order, plus the learner's progress row
  /// when a learner is given. Canonical answers are not included.
  pub fn lesson_detail(&self, lesson_id: i64, learner_id: Option<i64>) -> Result<LessonDetail> {
    let conn = self.store.conn();
    let lesson = store::get_lesson(&conn, lesson_id)?
      .ok_or_else(|| CoreError::NotFound(format!("lesson {lesson_id}")))?;
    let exercises = store::list_exercises(&conn, lesson_id)?
      .iter()
      .map(ExercisePublic::from)
      .collect();
    let progress = match learner_id {
      Some(id) => {
        learner_or_not_found(&conn, id)?;
        progress::find(&conn, id, lesson_id)?
      }
      None => None,
    };
    Ok(LessonDetail { lesson, exercises, progress })
  }
}
