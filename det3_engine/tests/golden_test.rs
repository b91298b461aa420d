//! Golden trace test: drives the frozen stimulus fixture and asserts the
//! observable trace hash matches the pinned value.
//!
//! This test must NEVER be modified to match new behavior.
//! If it fails, the engine's cycle timing has changed.

use std::fs;

use det3_engine::engine::DeterminantEngine;
use det3_engine::events::Stimulus;
use det3_engine::hashing::{canonical_hash, trace_hash};
use det3_engine::ENGINE_VERSION;

/// Canonical hash of the engine state after the whole fixture.
const GOLDEN_STATE_HASH: &str =
    "4172d1b22e3eba6b2687310209a13cf0411ba4fc0e2de43b47cbc90f59475843";

fn load_stimuli(path: &str) -> Vec<Stimulus> {
    let data = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    let arr: Vec<serde_json::Value> =
        serde_json::from_str(&data).expect("Failed to parse stimulus JSON");
    arr.iter()
        .map(|v| Stimulus::from_value(v).expect("Invalid stimulus in fixture"))
        .collect()
}

fn load_expected_hash(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
        .trim()
        .to_string()
}

#[test]
fn golden_trace_hash_matches() {
    let stimuli = load_stimuli("tests/golden/stimulus.json");
    let mut engine = DeterminantEngine::new();
    let trace = engine.apply_sequence(&stimuli);
    let hash = trace_hash(&trace);

    let expected = load_expected_hash("tests/golden/expected_trace_hash.txt");
    assert_eq!(
        hash, expected,
        "GOLDEN TEST FAILED: the fixture produced a different output trace.\n\
         Got:      {}\n\
         Expected: {}",
        hash, expected
    );
}

#[test]
fn golden_final_state_hash_matches() {
    let stimuli = load_stimuli("tests/golden/stimulus.json");
    let mut engine = DeterminantEngine::new();
    let state = engine.replay(&stimuli);
    assert_eq!(state.cycle, stimuli.len() as u64);
    assert_eq!(canonical_hash(state), GOLDEN_STATE_HASH);
}

#[test]
fn golden_pulses_land_where_expected() {
    let stimuli = load_stimuli("tests/golden/stimulus.json");
    let mut engine = DeterminantEngine::new();
    let trace = engine.apply_sequence(&stimuli);

    let pulses: Vec<(usize, i16, bool)> = trace
        .iter()
        .enumerate()
        .filter(|(_, o)| o.result_valid)
        .map(|(i, o)| (i + 1, o.result, o.overflow))
        .collect();

    assert_eq!(pulses.len(), 12);
    assert_eq!(pulses[0], (11, 1, false));
    assert_eq!(pulses[1], (30, 3, false));
    assert_eq!(pulses[2], (40, 32767, true));
    assert_eq!(pulses[3], (56, -32768, true));
    assert_eq!(pulses[11], (206, -306, false));
}

#[test]
fn golden_replay_is_deterministic() {
    let stimuli = load_stimuli("tests/golden/stimulus.json");

    let mut engine1 = DeterminantEngine::new();
    let h1 = trace_hash(&engine1.apply_sequence(&stimuli));

    let mut engine2 = DeterminantEngine::new();
    let h2 = trace_hash(&engine2.apply_sequence(&stimuli));

    assert_eq!(
        h1, h2,
        "DETERMINISM FAILURE: two runs of the same stimulus produced different traces.\n\
         Run 1: {}\n\
         Run 2: {}",
        h1, h2
    );
}

#[test]
fn engine_version_is_one() {
    assert_eq!(ENGINE_VERSION, 1, "ENGINE_VERSION is part of every pinned hash");
}
