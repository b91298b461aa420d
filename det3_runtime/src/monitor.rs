//! Passive monitors on the engine's input and output sides.
//!
//! Both see only signals: the stimulus and the outputs sampled before and
//! after each edge. Neither reads engine internals.

use tracing::{debug, info};

use det3_engine::arithmetic::{ELEMENT_COUNT, MATRIX_SIZE};
use det3_engine::{Matrix, Outputs, Stimulus};

use crate::items::{DeterminantItem, MatrixItem};

/// Reassembles accepted elements into `MatrixItem`s.
#[derive(Debug, Default)]
pub struct InputMonitor {
    elements: Vec<i16>,
    delays: Vec<u32>,
    waiting: u32,
}

impl InputMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one edge. Returns the item once its ninth element is accepted.
    pub fn observe(&mut self, before: &Outputs, stimulus: &Stimulus) -> Option<MatrixItem> {
        if stimulus.reset {
            if !self.elements.is_empty() {
                info!(
                    cycle = stimulus.cycle,
                    captured = self.elements.len(),
                    "resetting input monitor"
                );
            }
            self.clear();
            return None;
        }
        if !before.request {
            return None;
        }
        if !stimulus.valid {
            self.waiting += 1;
            return None;
        }

        self.elements.push(stimulus.data);
        self.delays.push(self.waiting);
        self.waiting = 0;

        if self.elements.len() < ELEMENT_COUNT {
            return None;
        }

        let mut elements = [0i16; ELEMENT_COUNT];
        elements.copy_from_slice(&self.elements);
        let mut item = MatrixItem::new(Matrix::from_row_major(elements));
        for (i, d) in self.delays.iter().enumerate() {
            item.pre_element_delay[i / MATRIX_SIZE][i % MATRIX_SIZE] = *d;
        }
        self.clear();
        debug!(cycle = stimulus.cycle, %item, "input monitor collected item");
        Some(item)
    }

    /// Elements captured for the transaction in progress.
    pub fn pending(&self) -> usize {
        self.elements.len()
    }

    fn clear(&mut self) {
        self.elements.clear();
        self.delays.clear();
        self.waiting = 0;
    }
}

/// Captures every `result_valid` pulse.
#[derive(Debug, Default)]
pub struct OutputMonitor {
    edges: u64,
}

impl OutputMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one edge, given outputs before and after it.
    pub fn observe(
        &mut self,
        before: &Outputs,
        stimulus: &Stimulus,
        after: &Outputs,
    ) -> Option<DeterminantItem> {
        if stimulus.reset {
            self.edges = 0;
            return None;
        }
        if before.request {
            self.edges += 1;
        }
        if !after.result_valid {
            return None;
        }

        let item = DeterminantItem {
            determinant: after.result,
            overflow: after.overflow,
            pre_det_delay: self.edges,
        };
        self.edges = 0;
        debug!(cycle = stimulus.cycle, %item, "output monitor collected item");
        Some(item)
    }
}
