//! Built-in calculus catalogue, used when no `[[lessons]]` are configured.

use crate::config::{ExerciseCfg, LessonCfg};
use crate::domain::ExerciseKind;

fn mc(question: &str, answer: &str, options: &[&str], hint: &str) -> ExerciseCfg {
  ExerciseCfg {
    kind: ExerciseKind::MultipleChoice,
    question: question.into(),
    answer: answer.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
    hint: Some(hint.into()),
    order: None,
  }
}

fn blank(question: &str, answer: &str, hint: &str) -> ExerciseCfg {
  ExerciseCfg {
    kind: ExerciseKind::FillBlank,
    question: question.into(),
    answer: answer.into(),
    options: Vec::new(),
    hint: Some(hint.into()),
    order: None,
  }
}

fn lesson(order: i64, title: &str, description: &str, xp_reward: u32, exercises: Vec<ExerciseCfg>) -> LessonCfg {
  LessonCfg {
    id: None,
    title: title.into(),
    description: description.into(),
    order,
    xp_reward,
    // Linear path: each lesson lists the one before it.
    prerequisites: if order > 1 { vec![order - 1] } else { Vec::new() },
    exercises,
  }
}

/// Six lessons, one learning path. Lesson ids equal their order.
pub fn seed_lessons() -> Vec<LessonCfg> {
  vec![
    lesson(1, "Functions & Graphs", "Learn the basics of functions and how to graph them", 10, vec![
      mc("What is the domain of f(x) = √(x-2)?", "[2, ∞)", &["[2, ∞)", "(-∞, 2]", "(-∞, ∞)", "[0, ∞)"],
        "Remember: square root functions are defined when the expression inside is ≥ 0"),
      blank("If f(x) = 2x + 3, then f(5) = ___", "13", "Substitute x = 5 into the function"),
    ]),
    lesson(2, "Limits", "Understanding limits and continuity", 15, vec![
      mc("What is lim(x→2) (x² - 4)/(x - 2)?", "4", &["2", "4", "0", "undefined"],
        "Factor the numerator and cancel common terms"),
      blank("lim(x→0) sin(x)/x = ___", "1", "This is a fundamental limit in calculus"),
    ]),
    lesson(3, "Derivatives", "The power rule and basic differentiation", 20, vec![
      mc("What is the derivative of x³?", "3x²", &["3x²", "x²", "3x", "x³"],
        "Use the power rule: d/dx(xⁿ) = nxⁿ⁻¹"),
      blank("If f(x) = 5x², then f'(x) = ___", "10x", "Apply the power rule: d/dx(5x²) = 5·2x = 10x"),
    ]),
    lesson(4, "Product & Chain Rule", "Advanced differentiation techniques", 25, vec![
      mc("What is the derivative of (x² + 1)(x³ - 2x)?", "5x⁴ - 6x² - 2",
        &["5x⁴ - 6x² - 2", "3x⁴ - 4x²", "2x(x³ - 2x) + (x² + 1)(3x² - 2)", "6x⁵ - 4x³"],
        "Use the product rule: (fg)' = f'g + fg'"),
    ]),
    lesson(5, "Integrals", "Introduction to integration", 30, vec![
      mc("What is ∫(2x + 3)dx?", "x² + 3x + C", &["x² + 3x + C", "2x² + 3x + C", "x² + 3x", "2x + 3"],
        "Integrate term by term and don't forget the constant of integration"),
    ]),
    lesson(6, "Series & Sequences", "Convergence and Taylor series", 35, vec![
      mc("Does the series Σ(1/n) converge?", "No", &["Yes", "No", "Sometimes", "Depends on n"],
        "This is the harmonic series, which diverges"),
    ]),
  ]
}
