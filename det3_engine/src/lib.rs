#![forbid(unsafe_code)]

//! Cycle-accurate 3×3 determinant engine.
//!
//! Nine signed 16-bit elements arrive one per accepted edge, row-major.
//! On the edge that accepts the ninth, the engine presents the determinant
//! saturated to 16 bits for exactly one cycle, with an overflow flag.

/// Version of the transition table. Part of every canonical hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod arithmetic;
pub mod classify;
pub mod domain;
pub mod engine;
pub mod events;
pub mod hashing;
pub mod invariants;
pub mod state;
pub mod transitions;

pub use domain::{Cursor, EdgeResult, EngineState, Matrix, Outputs, Phase};
pub use engine::DeterminantEngine;
pub use events::Stimulus;
