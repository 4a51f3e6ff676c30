//! Loading app configuration (settings, badge rules, optional lesson catalogue) from TOML.
//!
//! See `AppConfig` for the expected schema. Everything is optional; a missing
//! section falls back to the built-in defaults.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{info, error};

use crate::badges::BadgeRule;
use crate::domain::ExerciseKind;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub app: AppSettings,
  #[serde(default)]
  pub badges: Vec<BadgeRule>,
  #[serde(default)]
  pub lessons: Vec<LessonCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppSettings {
  #[serde(default = "default_app_name")]
  pub name: String,
  #[serde(default = "default_app_description")]
  pub description: String,
  /// Submitted answers longer than this are rejected before grading.
  #[serde(default = "default_max_answer_len")]
  pub max_answer_len: usize,
}

fn default_app_name() -> String { "Calcuingo".into() }
fn default_app_description() -> String { "Learn Calculus the Modern Way".into() }
fn default_max_answer_len() -> usize { 1024 }

impl Default for AppSettings {
  fn default() -> Self {
    Self {
      name: default_app_name(),
      description: default_app_description(),
      max_answer_len: default_max_answer_len(),
    }
  }
}

/// Lesson entry accepted in TOML (`[[lessons]]`) and used by the built-in seeds.
#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  #[serde(default)] pub id: Option<i64>,
  pub title: String,
  #[serde(default)] pub description: String,
  pub order: i64,
  pub xp_reward: u32,
  #[serde(default)] pub prerequisites: Vec<i64>,
  #[serde(default)] pub exercises: Vec<ExerciseCfg>,
}

/// `[[lessons.exercises]]`. `options` only makes sense for multiple choice.
#[derive(Clone, Debug, Deserialize)]
pub struct ExerciseCfg {
  #[serde(default)] pub kind: ExerciseKind,
  pub question: String,
  pub answer: String,
  #[serde(default)] pub options: Vec<String>,
  #[serde(default)] pub hint: Option<String>,
  #[serde(default)] pub order: Option<i64>,
}

/// Process-level settings read from the environment.
#[derive(Clone, Debug)]
pub struct ServerSettings {
  pub port: u16,
  pub database_path: PathBuf,
}

impl ServerSettings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT")
      .ok()
      .and_then(|p| p.parse::<u16>().ok())
      .unwrap_or(3000);
    let database_path = std::env::var("DATABASE_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("calcuingo.db"));
    Self { port, database_path }
  }
}

pub fn parse_app_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_app_config(&s) {
      Ok(cfg) => {
        info!(target: "calcuingo_backend", %path, lessons = cfg.lessons.len(), badges = cfg.badges.len(), "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "calcuingo_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "calcuingo_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = parse_app_config("").unwrap();
    assert_eq!(cfg.app.name, "Calcuingo");
    assert_eq!(cfg.app.max_answer_len, 1024);
    assert!(cfg.badges.is_empty());
    assert!(cfg.lessons.is_empty());
  }

  #[test]
  fn lessons_with_nested_exercises() {
    let cfg = parse_app_config(
      r#"
      [app]
      max_answer_len = 64

      [[lessons]]
      title = "Limits"
      order = 2
      xp_reward = 15
      prerequisites = [1]

      [[lessons.exercises]]
      kind = "multiple_choice"
      question = "lim(x→2) (x² - 4)/(x - 2)?"
      answer = "4"
      options = ["2", "4", "0", "undefined"]

      [[lessons.exercises]]
      question = "lim(x→0) sin(x)/x = ___"
      answer = "1"
      "#,
    ).unwrap();

    assert_eq!(cfg.app.max_answer_len, 64);
    assert_eq!(cfg.app.name, "Calcuingo");
    let lesson = &cfg.lessons[0];
    assert_eq!(lesson.prerequisites, vec![1]);
    assert_eq!(lesson.exercises[0].kind, ExerciseKind::MultipleChoice);
    assert_eq!(lesson.exercises[1].kind, ExerciseKind::FillBlank);
    assert!(lesson.exercises[1].hint.is_none());
  }

  #[test]
  fn invalid_toml_is_an_error() {
    assert!(parse_app_config("[[lessons]]\ntitle = ").is_err());
  }
}
