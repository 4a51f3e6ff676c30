//! Error taxonomy shared by the core and the HTTP layer.
//!
//! Handlers return `Result<_, CoreError>` and axum renders it through
//! `IntoResponse` as `{"error": "..."}` with a matching status code.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Store error: {0}")]
  Store(String),
}

impl CoreError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<rusqlite::Error> for CoreError {
  fn from(err: rusqlite::Error) -> Self {
    Self::Store(err.to_string())
  }
}

impl IntoResponse for CoreError {
  fn into_response(self) -> axum::response::Response {
    let status = self.status_code();
    // Store failures are logged in full but surfaced generically.
    let message = match &self {
      Self::Store(detail) => {
        error!(target: "calcuingo_backend", error = %detail, "Store failure");
        "Internal error, please retry later".to_string()
      }
      other => other.to_string(),
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
  }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_follow_taxonomy() {
    assert_eq!(CoreError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(CoreError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(CoreError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(CoreError::Store("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn sqlite_errors_map_to_store() {
    let err: CoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, CoreError::Store(_)));
  }
}
