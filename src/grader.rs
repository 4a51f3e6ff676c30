//! Answer grading.
//!
//! Answers are compared after trimming surrounding whitespace and lower-casing.
//! This accepts case and spacing variation but not equivalent notations:
//! "3x^2" does not match "3x²".

use crate::domain::Exercise;

fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}

pub fn answers_match(canonical: &str, submitted: &str) -> bool {
  normalize(canonical) == normalize(submitted)
}

pub fn grade(exercise: &Exercise, submitted: &str) -> bool {
  answers_match(&exercise.answer, submitted)
}
