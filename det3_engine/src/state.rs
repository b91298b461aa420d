//! Det3 Engine: state construction

use crate::domain::{Cursor, EngineState, Matrix, Phase};

/// The state entered on reset, at the given edge count.
///
/// Cursor at origin, buffer zeroed, outputs cleared, request raised.
pub fn create_reset_state(cycle: u64) -> EngineState {
    EngineState {
        cycle,
        phase: Phase::Reset,
        matrix: Matrix::zero(),
        cursor: Cursor::ORIGIN,
        result: 0,
        result_valid: false,
        overflow: false,
        request: true,
    }
}

/// State of a freshly constructed engine.
pub fn create_initial_state() -> EngineState {
    create_reset_state(0)
}
