#![forbid(unsafe_code)]

//! Det3 Runtime: testbench for the determinant engine
//!
//! Drives the engine through its public edge contract with a driver,
//! checks it with passive monitors and a scoreboard, and persists
//! stimulus traces and snapshots for replay.
//!
//! No transition logic lives here; every edge is delegated to the engine.

pub mod config;
pub mod coverage;
pub mod driver;
pub mod error;
pub mod items;
pub mod monitor;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod scoreboard;
pub mod sequence;
pub mod session;
pub mod snapshot;
pub mod trace_store;

pub use config::BenchConfig;
pub use error::{BenchError, BenchResult, SnapshotError};
pub use sequence::{generate, SequenceKind};
pub use session::{BenchSession, RunReport, SharedSession};
