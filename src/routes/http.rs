//! HTTP endpoint handlers. These are thin wrappers that forward to the reward engine.
//! Each handler is instrumented; the engine itself logs outcomes.
//!
//! The engine is synchronous (SQLite), so calls run on the blocking pool.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  Json,
};
use tracing::{info, instrument};

use crate::domain::{Completion, LoginTouch, Outcome, Stats};
use crate::engine::RewardEngine;
use crate::error::{CoreError, Result};
use crate::protocol::*;
use crate::state::AppState;

async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T>
where
  T: Send + 'static,
  F: FnOnce(RewardEngine) -> Result<T> + Send + 'static,
{
  let engine = state.engine.clone();
  tokio::task::spawn_blocking(move || f(engine))
    .await
    .map_err(|e| CoreError::Store(format!("blocking task failed: {e}")))?
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
  payload
    .map(|Json(v)| v)
    .map_err(|e| CoreError::Validation(e.body_text()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> Json<HealthOut> {
  Json(HealthOut { ok: true, app: state.app.name.clone() })
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_register(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<CredentialsIn>, JsonRejection>,
) -> Result<Json<RegisterOut>> {
  let creds = body(payload)?;
  let learner = run_blocking(&state, move |engine| engine.register(&creds.username, &creds.password)).await?;
  Ok(Json(RegisterOut { learner_id: learner.id, username: learner.username }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_login(
  State(state): State<Arc<AppState>>,
  payload: std::result::Result<Json<CredentialsIn>, JsonRejection>,
) -> Result<Json<LoginOut>> {
  let creds = body(payload)?;
  let now = state.clock.now();
  let (learner, touch) = run_blocking(&state, move |engine| engine.login(&creds.username, &creds.password, now)).await?;
  info!(target: "calcuingo_backend", id = learner.id, streak = touch.streak, "HTTP login");
  Ok(Json(LoginOut { learner_id: learner.id, username: learner.username, touch }))
}

#[instrument(level = "info", skip(state), fields(learner_id = ?q.learner_id))]
pub async fn http_get_path(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LearnerQuery>,
) -> Result<Json<Vec<PathNode>>> {
  let nodes = run_blocking(&state, move |engine| engine.learning_path(q.learner_id)).await?;
  Ok(Json(nodes))
}

#[instrument(level = "info", skip(state), fields(learner_id = ?q.learner_id))]
pub async fn http_get_lesson(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<i64>,
  Query(q): Query<LearnerQuery>,
) -> Result<Json<LessonDetail>> {
  let detail = run_blocking(&state, move |engine| engine.lesson_detail(lesson_id, q.learner_id)).await?;
  Ok(Json(detail))
}

#[instrument(level = "info", skip(state, payload))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Path(lesson_id): Path<i64>,
  payload: std::result::Result<Json<SubmitIn>, JsonRejection>,
) -> Result<Json<Outcome>> {
  let submit = body(payload)?;
  let learner_id = submit.learner_id.ok_or_else(|| CoreError::Validation("Missing learnerId".into()))?;
  let exercise_id = submit.exercise_id.ok_or_else(|| CoreError::Validation("Missing exerciseId".into()))?;
  let answer = submit.answer_text()?;
  let now = state.clock.now();

  let outcome = run_blocking(&state, move |engine| {
    engine.submit_answer(learner_id, lesson_id, exercise_id, answer.as_deref(), now)
  })
  .await?;
  info!(target: "progress", %learner_id, %lesson_id, %exercise_id, correct = outcome.is_correct, "HTTP submit evaluated");
  Ok(Json(outcome))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_touch(
  State(state): State<Arc<AppState>>,
  Path(learner_id): Path<i64>,
) -> Result<Json<LoginTouch>> {
  let now = state.clock.now();
  let touch = run_blocking(&state, move |engine| engine.login_touch(learner_id, now)).await?;
  Ok(Json(touch))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_complete(
  State(state): State<Arc<AppState>>,
  Path((learner_id, lesson_id)): Path<(i64, i64)>,
) -> Result<Json<Completion>> {
  let now = state.clock.now();
  let completion = run_blocking(&state, move |engine| engine.complete_lesson(learner_id, lesson_id, now)).await?;
  Ok(Json(completion))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_stats(
  State(state): State<Arc<AppState>>,
  Path(learner_id): Path<i64>,
) -> Result<Json<Stats>> {
  let stats = run_blocking(&state, move |engine| engine.get_stats(learner_id)).await?;
  Ok(Json(stats))
}
