//! Replay: rebuild engine state from a stimulus trace.
//!
//! Delegates all transition logic to the engine. No cached state.

use std::path::Path;

use tracing::{info, warn};

use det3_engine::hashing::{canonical_hash, trace_hash};
use det3_engine::{DeterminantEngine, EngineState, Stimulus};

use crate::error::BenchResult;
use crate::trace_store::TraceStore;

/// Rebuild the engine state from a stimulus sequence.
///
/// Fresh engine, every stimulus in order, then (final_state, canonical_hash).
pub fn rebuild_state(stimuli: &[Stimulus]) -> (EngineState, String) {
    let mut engine = DeterminantEngine::new();
    let state = engine.replay(stimuli).clone();
    let hash = canonical_hash(&state);
    (state, hash)
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(stimuli: &[Stimulus]) -> String {
    rebuild_state(stimuli).1
}

/// Hash of the observable outputs produced by the sequence.
pub fn rebuild_trace_hash(stimuli: &[Stimulus]) -> String {
    let mut engine = DeterminantEngine::new();
    trace_hash(&engine.apply_sequence(stimuli))
}

/// Replay twice on independent engines and compare hashes.
pub fn verify_determinism(stimuli: &[Stimulus]) -> bool {
    let first = rebuild_hash(stimuli);
    let second = rebuild_hash(stimuli);
    if first != second {
        warn!(%first, %second, "replay diverged");
        return false;
    }
    true
}

/// Outcome of replaying a stored trace file.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub edges: usize,
    pub state: EngineState,
    pub state_hash: String,
    pub trace_hash: String,
    /// Result pulses seen while replaying.
    pub results: usize,
}

/// Load a trace log and replay it from scratch.
pub fn replay_file(path: &Path) -> BenchResult<ReplayReport> {
    let stimuli = TraceStore::read_all_from_file(path)?;

    let mut engine = DeterminantEngine::new();
    let outputs = engine.apply_sequence(&stimuli);
    let state = engine.state().clone();
    let report = ReplayReport {
        edges: stimuli.len(),
        state_hash: canonical_hash(&state),
        trace_hash: trace_hash(&outputs),
        results: outputs.iter().filter(|o| o.result_valid).count(),
        state,
    };
    info!(
        edges = report.edges,
        results = report.results,
        hash = %report.state_hash,
        "replay complete"
    );
    Ok(report)
}
