//! Det3 Engine: centralized transition logic
//!
//! All state mutation lives here. Every function takes the current state
//! by reference and returns the next one; the input is never mutated.
//!
//! Output timing: `result`, `overflow`, `result_valid` and `request` all
//! change together on the edge that accepts the ninth element, and are
//! all cleared together on the following edge.

use tracing::{debug, trace};

use crate::arithmetic::compute;
use crate::domain::{Cursor, EdgeResult, EngineState, Phase};
use crate::events::Stimulus;
use crate::state::create_reset_state;

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply one edge to `state` and return `(next_state, result)`.
///
/// A stimulus with `reset` set yields the reset state regardless of what the
/// clocked logic would have produced.
pub fn apply_edge(state: &EngineState, stimulus: &Stimulus) -> (EngineState, EdgeResult) {
    let cycle = state.cycle + 1;

    if stimulus.reset {
        trace!(cycle, "reset overrides edge");
        let mut result = EdgeResult::idle(cycle);
        result.reset = true;
        return (create_reset_state(cycle), result);
    }

    let mut next = state.clone();
    next.cycle = cycle;

    let result = match state.phase {
        Phase::Hold => apply_hold_exit(&mut next, stimulus),
        // Reset and any unrecognised tag behave as a filling edge.
        Phase::Filling | Phase::Reset => apply_fill(&mut next, stimulus),
    };

    (next, result)
}

/// Asynchronous reset: the state as it reads right after reset asserts.
///
/// Does not count as an edge.
pub fn apply_reset(state: &EngineState) -> EngineState {
    create_reset_state(state.cycle)
}

// ---------------------------------------------------------------------------
// Individual edge handlers (private)
// ---------------------------------------------------------------------------

fn apply_fill(state: &mut EngineState, stimulus: &Stimulus) -> EdgeResult {
    let mut result = EdgeResult::idle(state.cycle);
    state.phase = Phase::Filling;

    if !stimulus.valid {
        trace!(cycle = state.cycle, "filling, waiting for valid");
        return result;
    }

    let at = state.cursor;
    state.matrix.set(at, stimulus.data);
    result.accepted = true;
    debug!(
        cycle = state.cycle,
        row = at.row,
        col = at.col,
        data = stimulus.data,
        "accepted element"
    );

    match at.advance() {
        Some(next) => {
            state.cursor = next;
        }
        None => {
            let det = compute(&state.matrix);
            state.result = det.value;
            state.overflow = det.overflow;
            state.result_valid = true;
            state.request = false;
            state.phase = Phase::Hold;

            result.completed = true;
            result.determinant = Some(det);
            debug!(
                cycle = state.cycle,
                raw = det.raw,
                result = det.value,
                overflow = det.overflow,
                "matrix complete"
            );
        }
    }

    result
}

fn apply_hold_exit(state: &mut EngineState, stimulus: &Stimulus) -> EdgeResult {
    let mut result = EdgeResult::idle(state.cycle);

    if stimulus.valid {
        debug!(
            cycle = state.cycle,
            data = stimulus.data,
            "element dropped during hold"
        );
        result.dropped = true;
    }

    state.result_valid = false;
    state.overflow = false;
    state.request = true;
    state.cursor = Cursor::ORIGIN;
    state.phase = Phase::Filling;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Matrix;
    use crate::state::create_initial_state;

    fn drive(state: &EngineState, elements: [i16; 9]) -> (EngineState, EdgeResult) {
        let mut s = state.clone();
        let mut last = EdgeResult::idle(s.cycle);
        for (i, v) in elements.into_iter().enumerate() {
            let (n, r) = apply_edge(&s, &Stimulus::element(i as u64 + 1, v));
            s = n;
            last = r;
        }
        (s, last)
    }

    #[test]
    fn input_state_is_not_mutated() {
        let s0 = create_initial_state();
        let snapshot = s0.clone();
        let _ = apply_edge(&s0, &Stimulus::element(1, 42));
        assert_eq!(s0, snapshot);
    }

    #[test]
    fn reset_phase_edge_accepts_like_filling() {
        let s0 = create_initial_state();
        assert_eq!(s0.phase, Phase::Reset);
        let (s1, r) = apply_edge(&s0, &Stimulus::element(1, 9));
        assert!(r.accepted);
        assert_eq!(s1.phase, Phase::Filling);
        assert_eq!(s1.cursor, Cursor { row: 0, col: 1 });
        assert_eq!(s1.matrix.get(Cursor::ORIGIN), 9);
    }

    #[test]
    fn invalid_edge_holds_position() {
        let s0 = create_initial_state();
        let (s1, _) = apply_edge(&s0, &Stimulus::element(1, 5));
        let (s2, r) = apply_edge(&s1, &Stimulus::idle(2, 0x7777));
        assert!(!r.accepted);
        assert_eq!(s2.cursor, s1.cursor);
        assert_eq!(s2.matrix, s1.matrix);
        assert!(s2.request);
        assert_eq!(s2.cycle, 2);
    }

    #[test]
    fn ninth_element_completes_and_holds() {
        let (s, r) = drive(&create_initial_state(), [2, 1, 0, 1, 2, 0, 0, 0, 1]);
        assert!(r.completed);
        assert_eq!(r.determinant.map(|d| d.raw), Some(3));
        assert_eq!(s.phase, Phase::Hold);
        assert!(s.result_valid);
        assert!(!s.request);
        assert_eq!(s.result, 3);
        assert_eq!(s.cursor, Cursor::LAST);
    }

    #[test]
    fn hold_exit_clears_and_drops() {
        let (s, _) = drive(&create_initial_state(), [100, 0, 0, 0, 100, 0, 0, 0, 100]);
        assert!(s.overflow);
        let (n, r) = apply_edge(&s, &Stimulus::element(10, 77));
        assert!(r.dropped);
        assert!(!r.accepted);
        assert_eq!(n.phase, Phase::Filling);
        assert!(!n.result_valid);
        assert!(!n.overflow);
        assert!(n.request);
        assert_eq!(n.cursor, Cursor::ORIGIN);
        // The dropped element never reached the buffer.
        assert_eq!(n.matrix, Matrix::scalar(100));
    }

    #[test]
    fn reset_stimulus_has_priority() {
        let s0 = create_initial_state();
        let (s1, _) = apply_edge(&s0, &Stimulus::element(1, 5));
        let mut stim = Stimulus::element(2, 6);
        stim.reset = true;
        let (s2, r) = apply_edge(&s1, &stim);
        assert!(r.reset);
        assert!(!r.accepted);
        assert_eq!(s2.phase, Phase::Reset);
        assert_eq!(s2.cursor, Cursor::ORIGIN);
        assert!(s2.matrix.is_zero());
        assert_eq!(s2.cycle, 2);
    }

    #[test]
    fn apply_reset_keeps_cycle() {
        let (s, _) = drive(&create_initial_state(), [1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let r = apply_reset(&s);
        assert_eq!(r.cycle, s.cycle);
        assert_eq!(r.phase, Phase::Reset);
        assert!(!r.result_valid);
        assert_eq!(r.result, 0);
    }
}
