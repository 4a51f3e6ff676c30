//! Daily login streak rules.

use chrono::{DateTime, Utc};

/// Compute the streak after a login at `now`.
///
/// - first login ever: 1
/// - exactly one whole day since the last login: `current + 1`
/// - more than one day: back to 1
/// - same day (or a clock that went backwards): unchanged
///
/// The returned last-login is always `now`.
pub fn update_streak(
  last_login: Option<DateTime<Utc>>,
  current: u32,
  now: DateTime<Utc>,
) -> (u32, DateTime<Utc>) {
  let streak = match last_login {
    None => 1,
    Some(last) => match (now - last).num_days() {
      1 => current.saturating_add(1),
      d if d > 1 => 1,
      _ => current,
    },
  };
  (streak, now)
}
