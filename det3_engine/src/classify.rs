//! Det3 Engine: structural classification of matrices
//!
//! Used for coverage bins. Checks run in precedence order: identity,
//! diagonal, upper triangular, lower triangular.

use serde::{Deserialize, Serialize};

use crate::arithmetic::MATRIX_SIZE;
use crate::domain::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Identity,
    Diagonal,
    UpperTriangular,
    LowerTriangular,
    General,
}

impl MatrixKind {
    pub const ALL: [MatrixKind; 5] = [
        MatrixKind::Identity,
        MatrixKind::Diagonal,
        MatrixKind::UpperTriangular,
        MatrixKind::LowerTriangular,
        MatrixKind::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixKind::Identity => "identity",
            MatrixKind::Diagonal => "diagonal",
            MatrixKind::UpperTriangular => "triangular_upper",
            MatrixKind::LowerTriangular => "triangular_lower",
            MatrixKind::General => "general",
        }
    }
}

/// True if every cell for which `pred(row, col)` holds is zero.
fn zero_where(matrix: &Matrix, pred: impl Fn(usize, usize) -> bool) -> bool {
    let cells = matrix.cells();
    (0..MATRIX_SIZE)
        .flat_map(|i| (0..MATRIX_SIZE).map(move |j| (i, j)))
        .filter(|&(i, j)| pred(i, j))
        .all(|(i, j)| cells[i][j] == 0)
}

pub fn classify(matrix: &Matrix) -> MatrixKind {
    if *matrix == Matrix::identity() {
        MatrixKind::Identity
    } else if zero_where(matrix, |i, j| i != j) {
        MatrixKind::Diagonal
    } else if zero_where(matrix, |i, j| j < i) {
        MatrixKind::UpperTriangular
    } else if zero_where(matrix, |i, j| j > i) {
        MatrixKind::LowerTriangular
    } else {
        MatrixKind::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        assert_eq!(classify(&Matrix::identity()), MatrixKind::Identity);
        assert_eq!(classify(&Matrix::zero()), MatrixKind::Diagonal);
        assert_eq!(classify(&Matrix::scalar(-100)), MatrixKind::Diagonal);
        assert_eq!(
            classify(&Matrix::from_rows([[1, 2, 3], [0, 4, 5], [0, 0, 6]])),
            MatrixKind::UpperTriangular
        );
        assert_eq!(
            classify(&Matrix::from_rows([[1, 0, 0], [2, 3, 0], [4, 5, 6]])),
            MatrixKind::LowerTriangular
        );
        assert_eq!(
            classify(&Matrix::from_rows([[2, 1, 0], [1, 2, 0], [0, 0, 1]])),
            MatrixKind::General
        );
    }
}
