//! Dense linear algebra for the efficiency evaluator.
//!
//! Information matrices are stored as `ndarray::Array2<f64>` throughout the
//! pipeline; determinants and inverses are delegated to `nalgebra`, so this
//! module is the single bridge between the two representations. Matrices
//! here are small (one row/column per design coefficient), so the copy is
//! negligible.

use nalgebra::DMatrix;
use ndarray::Array2;

/// Copy a square `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// # Panics
///
/// Panics if the matrix is not square.
#[must_use]
pub fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    assert_eq!(
        matrix.nrows(),
        matrix.ncols(),
        "matrix must be square, got {}x{}",
        matrix.nrows(),
        matrix.ncols()
    );
    let n = matrix.nrows();
    DMatrix::from_fn(n, n, |r, c| matrix[[r, c]])
}

/// Determinant of a square matrix via LU decomposition.
#[must_use]
pub fn determinant(matrix: &Array2<f64>) -> f64 {
    to_dmatrix(matrix).determinant()
}

/// Inverse of a square matrix, or `None` when it is singular.
#[must_use]
pub fn inverse(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let n = matrix.nrows();
    let inverted = to_dmatrix(matrix).try_inverse()?;
    if inverted.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Array2::from_shape_fn((n, n), |(r, c)| inverted[(r, c)]))
}
