//! Det3 Engine: input stimulus
//!
//! A stimulus is the set of input signals sampled at one rising edge.
//! It is pure data and carries no transition logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input signals for one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stimulus {
    /// Harness-side edge number, starting at 1. The engine does not read it.
    pub cycle: u64,
    /// Element on the input bus.
    pub data: i16,
    /// `data` carries a matrix element this edge.
    pub valid: bool,
    /// Reset asserted during this cycle. Takes priority over the edge.
    pub reset: bool,
}

impl Stimulus {
    /// An edge presenting `data` as the next element.
    pub fn element(cycle: u64, data: i16) -> Self {
        Self {
            cycle,
            data,
            valid: true,
            reset: false,
        }
    }

    /// An edge with `valid` low and `data` parked at `idle`.
    pub fn idle(cycle: u64, idle: i16) -> Self {
        Self {
            cycle,
            data: idle,
            valid: false,
            reset: false,
        }
    }

    /// A cycle with reset asserted.
    pub fn reset(cycle: u64) -> Self {
        Self {
            cycle,
            data: 0,
            valid: false,
            reset: true,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "cycle": self.cycle,
            "data": self.data,
            "valid": self.valid,
            "reset": self.reset,
        })
    }

    /// Parse a stimulus from a fixture value.
    ///
    /// Strict: every field is required, `data` must fit 16 bits and
    /// unknown fields are rejected.
    pub fn from_value(v: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(v)
    }
}

/// Lay out nine elements back to back, one per edge, numbered from `first_cycle`.
pub fn matrix_burst(first_cycle: u64, elements: [i16; 9]) -> Vec<Stimulus> {
    elements
        .into_iter()
        .enumerate()
        .map(|(i, v)| Stimulus::element(first_cycle + i as u64, v))
        .collect()
}
