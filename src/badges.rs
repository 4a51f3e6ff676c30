//! Badge ledger and the configuration-driven policy that decides when
//! badges are earned.
//!
//! The ledger (`BadgeSet`) only guarantees set semantics. `BadgePolicy` is
//! evaluated by the reward engine after each outcome and on login; it asks
//! the ledger to record whatever thresholds were crossed.

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free set of earned badge names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeSet(Vec<String>);

impl BadgeSet {
  pub fn new() -> Self { Self::default() }

  /// Returns `true` if the badge was not held before.
  pub fn add_badge(&mut self, name: &str) -> bool {
    if self.contains(name) {
      return false;
    }
    self.0.push(name.to_string());
    true
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.iter().any(|b| b == name)
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn names(&self) -> &[String] { &self.0 }

  pub fn into_vec(self) -> Vec<String> { self.0 }
}

impl From<Vec<String>> for BadgeSet {
  /// Duplicates in stored data collapse to their first occurrence.
  fn from(names: Vec<String>) -> Self {
    let mut set = BadgeSet::new();
    for n in &names {
      set.add_badge(n);
    }
    set
  }
}

/// What has to happen for a badge to be earned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeTrigger {
  LessonsCompleted(u32),
  Xp(u32),
  Streak(u32),
}

/// One `[[badges]]` entry. At most one threshold is expected; rules without
/// any are catalogue-only and never awarded automatically.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BadgeRule {
  pub name: String,
  #[serde(default)] pub lessons_completed: Option<u32>,
  #[serde(default)] pub xp: Option<u32>,
  #[serde(default)] pub streak: Option<u32>,
}

impl BadgeRule {
  pub fn with_trigger(name: &str, trigger: Option<BadgeTrigger>) -> Self {
    let mut rule = BadgeRule { name: name.into(), ..Default::default() };
    match trigger {
      Some(BadgeTrigger::LessonsCompleted(n)) => rule.lessons_completed = Some(n),
      Some(BadgeTrigger::Xp(n)) => rule.xp = Some(n),
      Some(BadgeTrigger::Streak(n)) => rule.streak = Some(n),
      None => {}
    }
    rule
  }

  pub fn trigger(&self) -> Option<BadgeTrigger> {
    self.lessons_completed.map(BadgeTrigger::LessonsCompleted)
      .or(self.xp.map(BadgeTrigger::Xp))
      .or(self.streak.map(BadgeTrigger::Streak))
  }
}

/// Snapshot of the learner numbers that triggers are evaluated against.
#[derive(Clone, Copy, Debug, Default)]
pub struct BadgeContext {
  pub lessons_completed: u32,
  pub xp: u32,
  pub streak: u32,
}

#[derive(Clone, Debug)]
pub struct BadgePolicy {
  rules: Vec<BadgeRule>,
}

impl Default for BadgePolicy {
  fn default() -> Self {
    use BadgeTrigger::*;
    let rule = BadgeRule::with_trigger;
    Self {
      rules: vec![
        rule("First Steps", Some(LessonsCompleted(1))),
        rule("Quick Learner", Some(LessonsCompleted(3))),
        rule("Math Master", Some(Xp(100))),
        rule("Calculus Champion", Some(LessonsCompleted(6))),
        rule("Perfect Score", None),
        rule("Streak Master", Some(Streak(7))),
      ],
    }
  }
}

impl BadgePolicy {
  pub fn new(rules: Vec<BadgeRule>) -> Self { Self { rules } }

  pub fn rules(&self) -> &[BadgeRule] { &self.rules }

  /// Record every badge whose threshold is met. Returns the newly added names.
  pub fn award(&self, ctx: BadgeContext, ledger: &mut BadgeSet) -> Vec<String> {
    let mut added = Vec::new();
    for rule in &self.rules {
      let met = match rule.trigger() {
        Some(BadgeTrigger::LessonsCompleted(n)) => ctx.lessons_completed >= n,
        Some(BadgeTrigger::Xp(n)) => ctx.xp >= n,
        Some(BadgeTrigger::Streak(n)) => ctx.streak >= n,
        None => false,
      };
      if met && ledger.add_badge(&rule.name) {
        added.push(rule.name.clone());
      }
    }
    added
  }
}
