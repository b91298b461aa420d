//! Scoreboard: expected-versus-observed comparison of result pulses.
//!
//! Expected items come from the input monitor, in order. Each observed
//! pulse is matched against the oldest outstanding expectation.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::items::{DeterminantItem, MatrixItem};

/// Outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Mismatch {
    Determinant { expected: i16, got: i16 },
    Overflow { expected: bool, got: bool },
    /// Pulse seen with nothing outstanding.
    Unexpected { got: DeterminantItem },
}

/// Structured run report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub expected: u64,
    pub observed: u64,
    pub matched: u64,
    pub mismatches: Vec<Mismatch>,
    /// Latency deviations beyond tolerance: (expected, got).
    pub latency_warnings: Vec<(u64, u64)>,
    /// Expectations never answered by a pulse.
    pub unprocessed: u64,
}

impl ScoreReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.unprocessed == 0
    }
}

#[derive(Debug)]
pub struct Scoreboard {
    queue: VecDeque<DeterminantItem>,
    tolerance: u64,
    report: ScoreReport,
}

impl Scoreboard {
    pub fn new(latency_tolerance: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            tolerance: latency_tolerance,
            report: ScoreReport::default(),
        }
    }

    /// Queue the expected result for an item the engine accepted.
    pub fn push_input(&mut self, item: &MatrixItem) {
        let expected = DeterminantItem::expected_for(item);
        self.report.expected += 1;
        self.queue.push_back(expected);
    }

    /// Compare one observed pulse against the oldest expectation.
    pub fn check_output(&mut self, got: DeterminantItem) {
        self.report.observed += 1;

        let Some(expected) = self.queue.pop_front() else {
            error!(%got, "unexpected output, no expected items in queue");
            self.report.mismatches.push(Mismatch::Unexpected { got });
            return;
        };

        let mut ok = true;
        if expected.determinant != got.determinant {
            error!(
                expected = expected.determinant,
                got = got.determinant,
                "determinant mismatch"
            );
            self.report.mismatches.push(Mismatch::Determinant {
                expected: expected.determinant,
                got: got.determinant,
            });
            ok = false;
        }
        if expected.overflow != got.overflow {
            error!(
                expected = expected.overflow,
                got = got.overflow,
                "overflow mismatch"
            );
            self.report.mismatches.push(Mismatch::Overflow {
                expected: expected.overflow,
                got: got.overflow,
            });
            ok = false;
        }
        if expected.pre_det_delay.abs_diff(got.pre_det_delay) > self.tolerance {
            warn!(
                expected = expected.pre_det_delay,
                got = got.pre_det_delay,
                "delay difference"
            );
            self.report
                .latency_warnings
                .push((expected.pre_det_delay, got.pre_det_delay));
        }
        if ok {
            self.report.matched += 1;
        }
    }

    /// Outstanding expectations.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn report(&self) -> &ScoreReport {
        &self.report
    }

    /// Close the run. Anything still queued is reported as unprocessed.
    pub fn finish(mut self) -> ScoreReport {
        self.report.unprocessed = self.queue.len() as u64;
        if self.report.unprocessed > 0 {
            error!(
                count = self.report.unprocessed,
                "end of test with unprocessed expected items"
            );
        } else {
            info!("all expected items processed");
        }
        self.report
    }
}
