//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use calcuingo_backend::config::AppConfig;
use calcuingo_backend::domain::Exercise;
use calcuingo_backend::state::AppState;
use calcuingo_backend::store::{self, Store};
use calcuingo_backend::util::FixedClock;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// App state over an in-memory store seeded with the built-in catalogue.
pub fn memory_state() -> AppState {
    let store = Store::open_in_memory().expect("open in-memory store");
    AppState::build(store, AppConfig::default(), Arc::new(FixedClock(t0()))).expect("build state")
}

/// App state over a fresh SQLite file. Keep the TempDir alive for the test.
pub fn file_state() -> (TempDir, AppState) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open(&dir.path().join("calcuingo.db")).expect("open file store");
    let state = AppState::build(store, AppConfig::default(), Arc::new(FixedClock(t0()))).expect("build state");
    (dir, state)
}

pub fn db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("calcuingo.db")
}

/// The fill-in-blank exercise of lesson 1 ("f(5) = ___", answer "13").
pub fn fill_blank_exercise(store: &Store) -> Exercise {
    store::list_exercises(&store.conn(), 1)
        .unwrap()
        .into_iter()
        .find(|e| e.answer == "13")
        .expect("seeded fill-blank exercise")
}

pub fn open(path: &Path) -> Store {
    Store::open(path).expect("reopen store")
}
