//! Det3 Engine: arithmetic primitives
//!
//! The determinant is accumulated in `i64`. A single triple product of
//! 16-bit factors needs 46 bits and the six-term sum 49, so nothing here
//! can wrap for in-range inputs.

use serde::{Deserialize, Serialize};

use crate::domain::Matrix;

/// Width of the input bus and of the saturated result, in bits.
pub const DATA_WIDTH: u32 = 16;

/// Edge length of the square matrix.
pub const MATRIX_SIZE: usize = 3;

/// Number of elements accepted per matrix.
pub const ELEMENT_COUNT: usize = MATRIX_SIZE * MATRIX_SIZE;

/// Lowest representable result, `0x8000`.
pub const RESULT_MIN: i64 = -(1 << (DATA_WIDTH - 1));

/// Highest representable result, `0x7FFF`.
pub const RESULT_MAX: i64 = (1 << (DATA_WIDTH - 1)) - 1;

/// Checked integer addition. Panics on i64 overflow.
pub fn checked_add(a: i64, b: i64) -> i64 {
    match a.checked_add(b) {
        Some(result) => result,
        None => panic!("Overflow: {} + {} overflows i64", a, b),
    }
}

/// Checked integer subtraction. Panics on i64 overflow.
pub fn checked_sub(a: i64, b: i64) -> i64 {
    match a.checked_sub(b) {
        Some(result) => result,
        None => panic!("Overflow: {} - {} overflows i64", a, b),
    }
}

/// Checked integer multiplication. Panics on i64 overflow.
pub fn checked_mul(a: i64, b: i64) -> i64 {
    match a.checked_mul(b) {
        Some(result) => result,
        None => panic!("Overflow: {} * {} overflows i64", a, b),
    }
}

fn triple(a: i16, b: i16, c: i16) -> i64 {
    checked_mul(checked_mul(a as i64, b as i64), c as i64)
}

/// Six-term cofactor expansion, evaluated entirely in the wide accumulator.
pub fn cofactor_determinant(matrix: &Matrix) -> i64 {
    let m = matrix.cells();

    let positive = checked_add(
        checked_add(
            triple(m[0][0], m[1][1], m[2][2]),
            triple(m[0][1], m[1][2], m[2][0]),
        ),
        triple(m[0][2], m[1][0], m[2][1]),
    );
    let negative = checked_add(
        checked_add(
            triple(m[0][2], m[1][1], m[2][0]),
            triple(m[0][1], m[1][0], m[2][2]),
        ),
        triple(m[0][0], m[1][2], m[2][1]),
    );

    checked_sub(positive, negative)
}

/// Clamp `raw` to the 16-bit signed range.
///
/// Returns the saturated value and whether clamping happened.
pub fn saturate(raw: i64) -> (i16, bool) {
    if raw < RESULT_MIN {
        (RESULT_MIN as i16, true)
    } else if raw > RESULT_MAX {
        (RESULT_MAX as i16, true)
    } else {
        (raw as i16, false)
    }
}

/// Outcome of one determinant computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Determinant {
    /// Exact value from the wide accumulator.
    pub raw: i64,
    /// Value presented on the 16-bit result bus.
    pub value: i16,
    pub overflow: bool,
}

/// Compute and saturate the determinant of `matrix`.
pub fn compute(matrix: &Matrix) -> Determinant {
    let raw = cofactor_determinant(matrix);
    let (value, overflow) = saturate(raw);
    Determinant {
        raw,
        value,
        overflow,
    }
}
