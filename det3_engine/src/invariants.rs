//! Det3 Engine: invariant checks
//!
//! Hard-fail validation of an `EngineState`. The engine runs the panicking
//! variant after every edge; restoring a state from outside the engine uses
//! the `Result` variant.

use thiserror::Error;

use crate::arithmetic::{compute, RESULT_MAX, RESULT_MIN};
use crate::domain::{Cursor, EngineState, Phase};

/// First failed check, tagged with the check name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invariant violation: [INVARIANT:{check}] {detail}")]
pub struct InvariantViolation {
    pub check: &'static str,
    pub detail: String,
}

fn violation(check: &'static str, detail: String) -> Result<(), InvariantViolation> {
    Err(InvariantViolation { check, detail })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Panics on the first failure.
pub fn validate_invariants(state: &EngineState) {
    if let Err(e) = try_validate_invariants(state) {
        panic!("{}", e);
    }
}

/// Non-panicking variant of `validate_invariants`.
pub fn try_validate_invariants(state: &EngineState) -> Result<(), InvariantViolation> {
    check_cursor_range(state)?;
    check_request_handshake(state)?;
    check_result_pulse(state)?;
    check_overflow_saturation(state)?;
    check_result_consistency(state)?;
    check_reset_clean(state)?;
    check_hold_cursor(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_cursor_range(state: &EngineState) -> Result<(), InvariantViolation> {
    if !state.cursor.in_range() {
        return violation(
            "cursor_range",
            format!(
                "cursor ({}, {}) outside the 3x3 buffer",
                state.cursor.row, state.cursor.col
            ),
        );
    }
    Ok(())
}

/// `request` is low exactly while holding a result.
fn check_request_handshake(state: &EngineState) -> Result<(), InvariantViolation> {
    let expected = state.phase != Phase::Hold;
    if state.request != expected {
        return violation(
            "request_handshake",
            format!(
                "request={} in phase {}",
                state.request,
                state.phase.as_str()
            ),
        );
    }
    Ok(())
}

/// `result_valid` is high exactly while holding a result.
fn check_result_pulse(state: &EngineState) -> Result<(), InvariantViolation> {
    let expected = state.phase == Phase::Hold;
    if state.result_valid != expected {
        return violation(
            "result_pulse",
            format!(
                "result_valid={} in phase {}",
                state.result_valid,
                state.phase.as_str()
            ),
        );
    }
    Ok(())
}

fn check_overflow_saturation(state: &EngineState) -> Result<(), InvariantViolation> {
    if !state.overflow {
        return Ok(());
    }
    if !state.result_valid {
        return violation(
            "overflow_saturation",
            "overflow raised without result_valid".to_string(),
        );
    }
    let r = state.result as i64;
    if r != RESULT_MIN && r != RESULT_MAX {
        return violation(
            "overflow_saturation",
            format!("overflow raised with unsaturated result {}", r),
        );
    }
    Ok(())
}

/// While a result is presented it must match the buffered matrix.
fn check_result_consistency(state: &EngineState) -> Result<(), InvariantViolation> {
    if !state.result_valid {
        return Ok(());
    }
    let det = compute(&state.matrix);
    if det.value != state.result || det.overflow != state.overflow {
        return violation(
            "result_consistency",
            format!(
                "presented ({}, overflow={}) but buffer gives ({}, overflow={})",
                state.result, state.overflow, det.value, det.overflow
            ),
        );
    }
    Ok(())
}

fn check_reset_clean(state: &EngineState) -> Result<(), InvariantViolation> {
    if state.phase != Phase::Reset {
        return Ok(());
    }
    if state.cursor != Cursor::ORIGIN || state.result != 0 || !state.matrix.is_zero() {
        return violation(
            "reset_clean",
            "reset state carries residual cursor, result or buffer contents".to_string(),
        );
    }
    Ok(())
}

fn check_hold_cursor(state: &EngineState) -> Result<(), InvariantViolation> {
    if state.phase == Phase::Hold && !state.cursor.is_last() {
        return violation(
            "hold_cursor",
            format!(
                "holding with cursor at ({}, {})",
                state.cursor.row, state.cursor.col
            ),
        );
    }
    Ok(())
}
