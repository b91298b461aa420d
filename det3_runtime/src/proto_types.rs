//! Hand-written protobuf types for the stimulus trace.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//!
//! ```proto
//! message Stimulus {
//!   uint64 cycle = 1;
//!   sint32 data  = 2;
//!   bool   valid = 3;
//!   bool   reset = 4;
//! }
//! ```

use prost::Message;

// ── Stimulus ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoStimulus {
    #[prost(uint64, tag = "1")]
    pub cycle: u64,
    /// Widened to 32 bits on the wire; zigzag keeps negatives short.
    #[prost(sint32, tag = "2")]
    pub data: i32,
    #[prost(bool, tag = "3")]
    pub valid: bool,
    #[prost(bool, tag = "4")]
    pub reset: bool,
}
