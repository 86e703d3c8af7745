//! Conversion helpers between `ndarray` and `nalgebra` types.
//!
//! Purpose
//! -------
//! The crate stores all pulsar data as `ndarray` arrays but performs dense
//! factorizations (Cholesky, SVD, symmetric eigendecomposition) through
//! `nalgebra::DMatrix`. These helpers centralize the explicit copies at that
//! boundary so numeric modules never hand-roll indexing conversions.
//!
//! Conventions
//! -----------
//! - Copies are explicit and allocate; none of these helpers alias memory.
//! - `DMatrix` is column-major, so fills proceed column by column.
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Copy a rectangular `ndarray` matrix into a freshly allocated `DMatrix`.
///
/// The copy proceeds column by column, matching the internal column-major
/// storage of `DMatrix`.
pub fn fill_dmatrix(arr: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = arr.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for j in 0..cols {
        for i in 0..rows {
            out[(i, j)] = arr[[i, j]];
        }
    }
    out
}

/// Copy a length-n `ndarray` vector into a `DVector`.
pub fn fill_dvector(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

/// Copy a `DMatrix` back into an `ndarray` matrix.
pub fn to_array2(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Copy a `DVector` back into an `ndarray` vector.
pub fn to_array1(vec: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(vec.iter().copied())
}
