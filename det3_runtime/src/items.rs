//! Transaction items exchanged between driver, monitors and scoreboard.

use std::fmt;

use serde::{Deserialize, Serialize};

use det3_engine::arithmetic::{saturate, ELEMENT_COUNT, MATRIX_SIZE};
use det3_engine::Matrix;

/// One matrix plus the idle edges the driver inserts before each element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixItem {
    pub matrix: Matrix,
    pub pre_element_delay: [[u32; MATRIX_SIZE]; MATRIX_SIZE],
}

impl MatrixItem {
    /// A matrix driven back to back, no idle edges.
    pub fn new(matrix: Matrix) -> Self {
        Self {
            matrix,
            pre_element_delay: [[0; MATRIX_SIZE]; MATRIX_SIZE],
        }
    }

    pub fn with_uniform_delay(mut self, delay: u32) -> Self {
        self.pre_element_delay = [[delay; MATRIX_SIZE]; MATRIX_SIZE];
        self
    }

    /// Delay before the `index`-th element in fill order.
    pub fn delay_at(&self, index: usize) -> u32 {
        self.pre_element_delay[index / MATRIX_SIZE][index % MATRIX_SIZE]
    }

    pub fn total_delay(&self) -> u64 {
        self.pre_element_delay
            .iter()
            .flatten()
            .map(|&d| d as u64)
            .sum()
    }

    /// Exact determinant, computed independently of the engine in i128.
    pub fn reference_determinant(&self) -> i128 {
        let m = self.matrix.cells().map(|r| r.map(|v| v as i128));
        m[0][0] * m[1][1] * m[2][2]
            + m[0][1] * m[1][2] * m[2][0]
            + m[0][2] * m[1][0] * m[2][1]
            - m[0][2] * m[1][1] * m[2][0]
            - m[0][1] * m[1][0] * m[2][2]
            - m[0][0] * m[1][2] * m[2][1]
    }
}

impl fmt::Display for MatrixItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matrix: {:?} Delays: {:?} Expected Det: {}",
            self.matrix.cells(),
            self.pre_element_delay,
            self.reference_determinant()
        )
    }
}

/// One observed (or expected) result pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminantItem {
    pub determinant: i16,
    pub overflow: bool,
    /// Edges with `request` high between the start of the transaction and
    /// the pulse.
    pub pre_det_delay: u64,
}

impl DeterminantItem {
    /// Saturated reference result and ideal latency for `item`.
    pub fn expected_for(item: &MatrixItem) -> Self {
        // The i128 reference always fits i64 for 16-bit inputs.
        let exact = item.reference_determinant() as i64;
        let (determinant, overflow) = saturate(exact);
        Self {
            determinant,
            overflow,
            pre_det_delay: item.total_delay() + ELEMENT_COUNT as u64,
        }
    }
}

impl fmt::Display for DeterminantItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Det: {}, Overflow: {}, Delay: {}",
            self.determinant, self.overflow, self.pre_det_delay
        )
    }
}
