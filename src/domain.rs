//! Domain models: learners, lessons, exercises, and per-lesson progress.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badges::BadgeSet;

/// What kind of exercise is presented to the learner?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  /// Pick one of `options`.
  MultipleChoice,
  /// Type the answer into a blank.
  FillBlank,
}
impl Default for ExerciseKind {
  fn default() -> Self { ExerciseKind::FillBlank }
}

impl ExerciseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MultipleChoice => "multiple_choice",
      Self::FillBlank => "fill_blank",
    }
  }
}

impl FromStr for ExerciseKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "multiple_choice" => Ok(Self::MultipleChoice),
      "fill_blank" => Ok(Self::FillBlank),
      other => Err(format!("unknown exercise kind: {other}")),
    }
  }
}

#[derive(Clone, Debug)]
pub struct Learner {
  pub id: i64,
  pub username: String,
  /// PHC-formatted argon2 hash, never the plain password.
  pub password_hash: String,
  pub xp: u32,
  pub streak: u32,
  pub last_login: Option<DateTime<Utc>>,
  pub badges: BadgeSet,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub order: i64,
  pub xp_reward: u32,
  /// Declared gating; stored and exposed but not enforced.
  pub prerequisites: Vec<i64>,
}

#[derive(Clone, Debug)]
pub struct Exercise {
  pub id: i64,
  pub lesson_id: i64,
  pub kind: ExerciseKind,
  pub question: String,
  pub answer: String,
  pub options: Vec<String>,
  pub hint: Option<String>,
  pub order: i64,
}

/// Per-(learner, lesson) state. At most one exists per pair.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
  pub id: i64,
  pub learner_id: i64,
  pub lesson_id: i64,
  pub completed: bool,
  pub best_score: f64,
  pub attempts: u32,
  pub last_attempt: Option<DateTime<Utc>>,
}

/// Result of a single answer submission.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
  pub is_correct: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
  pub xp_awarded: u32,
  pub total_xp: u32,
  pub lesson_completed: bool,
  pub newly_completed: bool,
  pub attempts: u32,
  pub new_badges: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginTouch {
  pub streak: u32,
  pub last_login: DateTime<Utc>,
  pub new_badges: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub xp: u32,
  pub streak: u32,
  pub badges: Vec<String>,
  pub completed_lessons: u32,
  pub total_lessons: u32,
  pub total_attempts: u32,
}

/// Result of marking a lesson completed without grading an answer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
  pub xp_awarded: u32,
  pub total_xp: u32,
  pub newly_completed: bool,
  pub new_badges: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exercise_kind_parses_its_own_names() {
    for kind in [ExerciseKind::MultipleChoice, ExerciseKind::FillBlank] {
      assert_eq!(kind.as_str().parse::<ExerciseKind>(), Ok(kind));
    }
    assert!("drag_drop".parse::<ExerciseKind>().is_err());
  }
}
