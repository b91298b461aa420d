//! Det3 Engine: engine
//!
//! Stateful wrapper around the pure transition layer. Owns exactly one
//! `EngineState`; there is no shared or static storage, so any number of
//! engines can run side by side.

use tracing::{debug, info};

use crate::domain::{EdgeResult, EngineState, Outputs};
use crate::events::Stimulus;
use crate::invariants::{try_validate_invariants, validate_invariants, InvariantViolation};
use crate::state::create_initial_state;
use crate::transitions::{apply_edge, apply_reset};

#[derive(Debug, Clone)]
pub struct DeterminantEngine {
    state: EngineState,
}

impl DeterminantEngine {
    /// A fresh engine, as it reads right after power-on reset.
    pub fn new() -> Self {
        Self {
            state: create_initial_state(),
        }
    }

    /// Resume from a previously captured state after validating it.
    pub fn from_state(state: EngineState) -> Result<Self, InvariantViolation> {
        try_validate_invariants(&state)?;
        Ok(Self { state })
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Signals as observed after the last edge.
    pub fn outputs(&self) -> Outputs {
        self.state.outputs()
    }

    /// Assert reset. Takes effect immediately, without an edge.
    pub fn reset(&mut self) {
        info!(cycle = self.state.cycle, "engine reset");
        self.state = apply_reset(&self.state);
    }

    /// Process one rising edge:
    ///   1. Reset flag short-circuits to the reset state
    ///   2. Otherwise delegate to the clocked transition
    ///   3. Validate invariants on the new state
    pub fn tick(&mut self, stimulus: &Stimulus) -> EdgeResult {
        let (next, result) = apply_edge(&self.state, stimulus);
        validate_invariants(&next);
        if result.reset {
            debug!(cycle = next.cycle, "edge overridden by reset");
        }
        self.state = next;
        result
    }

    /// One edge without reset.
    pub fn clock(&mut self, data: i16, valid: bool) -> EdgeResult {
        let stimulus = Stimulus {
            cycle: self.state.cycle + 1,
            data,
            valid,
            reset: false,
        };
        self.tick(&stimulus)
    }

    /// Apply a stimulus trace, returning the outputs seen after each edge.
    pub fn apply_sequence(&mut self, stimuli: &[Stimulus]) -> Vec<Outputs> {
        stimuli
            .iter()
            .map(|s| {
                self.tick(s);
                self.outputs()
            })
            .collect()
    }

    /// Rebuild from scratch: fresh state, then every stimulus in order.
    pub fn replay(&mut self, stimuli: &[Stimulus]) -> &EngineState {
        self.state = create_initial_state();
        for s in stimuli {
            self.tick(s);
        }
        &self.state
    }
}

impl Default for DeterminantEngine {
    fn default() -> Self {
        Self::new()
    }
}
