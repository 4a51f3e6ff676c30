//! Concurrent submissions by one learner to one lesson must award XP once.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use calcuingo_backend::badges::BadgePolicy;
use calcuingo_backend::engine::RewardEngine;

use common::{db_path, file_state, fill_blank_exercise, open, t0};

const WRITERS: usize = 8;

#[test]
fn test_separate_connections_award_xp_once() {
    let (dir, state) = file_state();
    let learner_id = state.engine.register("ada", "lovelace").unwrap().id;
    let exercise_id = fill_blank_exercise(state.engine.store()).id;
    let path = db_path(&dir);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let path = path.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                // Each writer gets its own SQLite connection to the same file.
                let engine = RewardEngine::new(open(&path), BadgePolicy::default(), 1024);
                barrier.wait();
                engine.submit_answer(learner_id, 1, exercise_id, Some("13"), t0())
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("writer thread panicked").expect("submission failed"))
        .collect();

    let awarded: u32 = outcomes.iter().map(|o| o.xp_awarded).sum();
    let newly: usize = outcomes.iter().filter(|o| o.newly_completed).count();
    assert_eq!(awarded, 10, "XP must be credited exactly once, got {}", awarded);
    assert_eq!(newly, 1, "exactly one submission should complete the lesson");

    let stats = state.engine.get_stats(learner_id).unwrap();
    assert_eq!(stats.xp, 10);
    assert_eq!(stats.total_attempts, WRITERS as u32);
    assert_eq!(stats.completed_lessons, 1);
}

#[test]
fn test_shared_engine_award_xp_once() {
    let (_dir, state) = file_state();
    let learner_id = state.engine.register("ada", "lovelace").unwrap().id;
    let exercise_id = fill_blank_exercise(state.engine.store()).id;
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let engine = state.engine.clone();
            let barrier = barrier.clone();
            // Mix right and wrong answers; only right ones can complete.
            let answer = if i % 2 == 0 { "13" } else { "12" };
            thread::spawn(move || {
                barrier.wait();
                engine.submit_answer(learner_id, 1, exercise_id, Some(answer), t0())
            })
        })
        .collect();

    for h in handles {
        h.join().expect("writer thread panicked").expect("submission failed");
    }

    let stats = state.engine.get_stats(learner_id).unwrap();
    assert_eq!(stats.xp, 10);
    assert_eq!(stats.total_attempts, WRITERS as u32);
}
