//! Det3 Engine: core domain types
//!
//! Pure data. The only behaviour here is cursor stepping and matrix
//! indexing; every state transition lives in `transitions`.

use serde::{Deserialize, Serialize};

use crate::arithmetic::{Determinant, MATRIX_SIZE};

// ── Matrix buffer ──────────────────────────────────────────────────

/// 3×3 signed 16-bit matrix, indexed `[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matrix([[i16; MATRIX_SIZE]; MATRIX_SIZE]);

impl Matrix {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn identity() -> Self {
        Self([[1, 0, 0], [0, 1, 0], [0, 0, 1]])
    }

    pub fn from_rows(rows: [[i16; MATRIX_SIZE]; MATRIX_SIZE]) -> Self {
        Self(rows)
    }

    /// Build from nine elements in fill order.
    pub fn from_row_major(elements: [i16; MATRIX_SIZE * MATRIX_SIZE]) -> Self {
        let mut cells = [[0i16; MATRIX_SIZE]; MATRIX_SIZE];
        for (i, v) in elements.into_iter().enumerate() {
            cells[i / MATRIX_SIZE][i % MATRIX_SIZE] = v;
        }
        Self(cells)
    }

    /// Diagonal matrix with `value` on every diagonal cell.
    pub fn scalar(value: i16) -> Self {
        Self([[value, 0, 0], [0, value, 0], [0, 0, value]])
    }

    pub fn cells(&self) -> [[i16; MATRIX_SIZE]; MATRIX_SIZE] {
        self.0
    }

    pub fn get(&self, at: Cursor) -> i16 {
        self.0[at.row as usize][at.col as usize]
    }

    pub fn set(&mut self, at: Cursor, value: i16) {
        self.0[at.row as usize][at.col as usize] = value;
    }

    /// Elements in fill order.
    pub fn row_major(&self) -> [i16; MATRIX_SIZE * MATRIX_SIZE] {
        let mut out = [0i16; MATRIX_SIZE * MATRIX_SIZE];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i / MATRIX_SIZE][i % MATRIX_SIZE];
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().flatten().all(|&v| v == 0)
    }
}

// ── Fill cursor ────────────────────────────────────────────────────

/// Position of the cell the next accepted element is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cursor {
    pub row: u8,
    pub col: u8,
}

impl Cursor {
    pub const ORIGIN: Cursor = Cursor { row: 0, col: 0 };
    pub const LAST: Cursor = Cursor {
        row: MATRIX_SIZE as u8 - 1,
        col: MATRIX_SIZE as u8 - 1,
    };

    pub fn is_last(&self) -> bool {
        *self == Self::LAST
    }

    pub fn in_range(&self) -> bool {
        (self.row as usize) < MATRIX_SIZE && (self.col as usize) < MATRIX_SIZE
    }

    /// Row-major step. `None` once the last cell has been written.
    pub fn advance(self) -> Option<Cursor> {
        if self.is_last() {
            None
        } else if self.col as usize == MATRIX_SIZE - 1 {
            Some(Cursor {
                row: self.row + 1,
                col: 0,
            })
        } else {
            Some(Cursor {
                row: self.row,
                col: self.col + 1,
            })
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::ORIGIN
    }
}

// ── Phase ──────────────────────────────────────────────────────────

/// Engine state tag.
///
/// `Reset` is not a clocked state: the next edge after it is evaluated
/// exactly like a `Filling` edge. Unknown tags read from serialized state
/// decode to `Filling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Phase {
    Reset,
    Filling,
    Hold,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Reset => "reset",
            Phase::Filling => "filling",
            Phase::Hold => "hold",
        }
    }
}

impl From<String> for Phase {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "reset" => Phase::Reset,
            "hold" => Phase::Hold,
            _ => Phase::Filling,
        }
    }
}

impl From<Phase> for &'static str {
    fn from(phase: Phase) -> Self {
        phase.as_str()
    }
}

// ── Signals ────────────────────────────────────────────────────────

/// Observable output signals, sampled after an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    /// Engine will accept an element on the next edge.
    pub request: bool,
    /// Meaningful only while `result_valid` is set.
    pub result: i16,
    pub result_valid: bool,
    pub overflow: bool,
}

/// Complete engine state. One instance per engine, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineState {
    /// Number of edges processed since construction. Reset does not rewind it.
    pub cycle: u64,
    pub phase: Phase,
    pub matrix: Matrix,
    pub cursor: Cursor,
    pub result: i16,
    pub result_valid: bool,
    pub overflow: bool,
    pub request: bool,
}

impl EngineState {
    pub fn outputs(&self) -> Outputs {
        Outputs {
            request: self.request,
            result: self.result,
            result_valid: self.result_valid,
            overflow: self.overflow,
        }
    }
}

/// Structured outcome of a single edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeResult {
    /// Value of `EngineState::cycle` after the edge.
    pub edge: u64,
    /// The edge was overridden by reset.
    pub reset: bool,
    /// An element was written to the matrix buffer.
    pub accepted: bool,
    /// `valid` was asserted while the engine could not take the element.
    pub dropped: bool,
    /// This edge wrote the ninth element.
    pub completed: bool,
    pub determinant: Option<Determinant>,
}

impl EdgeResult {
    pub(crate) fn idle(edge: u64) -> Self {
        Self {
            edge,
            reset: false,
            accepted: false,
            dropped: false,
            completed: false,
            determinant: None,
        }
    }
}
