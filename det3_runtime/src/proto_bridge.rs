//! Proto ↔ engine conversion bridge.

use det3_engine::Stimulus;

use crate::error::{BenchError, BenchResult};
use crate::proto_types::ProtoStimulus;

pub fn stimulus_to_proto(stimulus: &Stimulus) -> ProtoStimulus {
    ProtoStimulus {
        cycle: stimulus.cycle,
        data: i32::from(stimulus.data),
        valid: stimulus.valid,
        reset: stimulus.reset,
    }
}

/// Fails if the wire value does not fit the 16-bit data bus.
pub fn proto_to_stimulus(proto: &ProtoStimulus) -> BenchResult<Stimulus> {
    let data = i16::try_from(proto.data).map_err(|_| {
        BenchError::CorruptFrame(format!(
            "data {} out of 16-bit range at cycle {}",
            proto.data, proto.cycle
        ))
    })?;
    Ok(Stimulus {
        cycle: proto.cycle,
        data,
        valid: proto.valid,
        reset: proto.reset,
    })
}
