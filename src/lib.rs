//! Calcuingo backend: the progress-and-reward core of a gamified calculus
//! course, plus the HTTP surface that drives it.
//!
//! Learners answer exercises; the reward engine grades each answer, updates
//! the per-lesson progress record, credits XP the first time a lesson is
//! completed, and keeps a daily login streak and a badge ledger.

pub mod auth;
pub mod badges;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod grader;
pub mod progress;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod store;
pub mod streak;
pub mod telemetry;
pub mod util;
