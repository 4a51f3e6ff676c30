//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Exercise, ExerciseKind, Lesson, LoginTouch, ProgressRecord};
use crate::error::{CoreError, Result};

/// One node of the learning path.
#[derive(Debug, Serialize)]
pub struct PathNode {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub progress: Option<ProgressRecord>,
}

/// Exercise as shown to learners: no canonical answer, no hint until a wrong attempt.
#[derive(Debug, Serialize)]
pub struct ExercisePublic {
    pub id: i64,
    pub kind: ExerciseKind,
    pub question: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub order: i64,
}

impl From<&Exercise> for ExercisePublic {
    fn from(ex: &Exercise) -> Self {
        Self {
            id: ex.id,
            kind: ex.kind,
            question: ex.question.clone(),
            options: ex.options.clone(),
            order: ex.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub exercises: Vec<ExercisePublic>,
    /// Present only when the request names a learner who has touched the lesson.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct CredentialsIn {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOut {
    pub learner_id: i64,
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOut {
    pub learner_id: i64,
    pub username: String,
    #[serde(flatten)]
    pub touch: LoginTouch,
}

/// Body of `POST /lessons/{id}/submit`. Fields are optional so that a missing
/// one surfaces as a validation error rather than a decoding failure.
#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    #[serde(rename = "learnerId")]
    pub learner_id: Option<i64>,
    #[serde(rename = "exerciseId")]
    pub exercise_id: Option<i64>,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
}

impl SubmitIn {
    /// Numbers are accepted and graded by their textual form ("13" == 13).
    /// `null`, booleans, arrays and objects are malformed.
    pub fn answer_text(&self) -> Result<Option<String>> {
        match &self.answer {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(CoreError::Validation("Answer must be a string or number".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LearnerQuery {
    #[serde(rename = "learnerId")]
    pub learner_id: Option<i64>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub app: String,
}
