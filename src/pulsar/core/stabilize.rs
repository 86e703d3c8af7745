//! Design-matrix stabilization: numerically well-conditioned timing bases.
//!
//! Purpose
//! -------
//! Replace the raw timing-model design matrix with a basis that conditions
//! the downstream likelihood linear systems: either a cheap column
//! normalization (shape-preserving) or a full spectral factorization that
//! yields an orthonormal column-space basis `Gc` and, on request, the
//! orthogonal-complement basis `G` used to project out timing-model
//! degeneracies.
//!
//! Key behaviors
//! -------------
//! - [`StabilizeMethod::FastNorm`]: divide each column by its Euclidean
//!   norm. O(rows x cols), identical output shape, no orthonormality
//!   guarantee.
//! - [`StabilizeMethod::Factorize`]: symmetric eigendecomposition of the
//!   outer product `M Mᵀ` with eigenvalue truncation. Eigenvectors above
//!   tolerance span the column space (`gc`, rows x rank); the rest span the
//!   complement (`g`, rows x (rows - rank)) when requested. O(rows³) —
//!   acceptable only for moderate TOA counts.
//! - The complement-projected residuals `g_res = Gᵀ r` are computed by the
//!   container, not here; this module is a pure function of the matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - The design matrix is consumed by view and never mutated in place.
//! - Rank is *threshold-adjusted*: eigenvalues at or below
//!   `max(EIGEN_EPS, ε · max_dim · λ_max)` count as zero, so a
//!   rank-deficient timing model shrinks `gc` rather than polluting it.
//! - Factorization-path bases are orthonormal to floating-point tolerance;
//!   `gcᵀ gc ≈ I` and `gᵀ gc ≈ 0`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover fast-path shape preservation and unit column norms,
//!   the zero-column degenerate case, factorization-path orthonormality,
//!   complement dimensions, and rank reduction on a duplicated column.
use crate::pulsar::errors::{PsrError, PsrResult};
use crate::utils::fill_dmatrix;
use ndarray::{Array2, ArrayView2};

/// Absolute floor for eigenvalue truncation in the factorization path.
///
/// Eigenvalues of `M Mᵀ` at or below this floor (or below the relative
/// machine-precision threshold, whichever is larger) are treated as zero.
pub const EIGEN_EPS: f64 = 1e-12;

/// Stabilization strategy, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizeMethod {
    /// Column-normalize the design matrix. Cheap; preserves shape.
    FastNorm,
    /// Full spectral factorization. `complement` additionally extracts the
    /// orthogonal-complement basis `G` for explicit projection downstream.
    Factorize { complement: bool },
}

/// A stabilized basis derived from the design matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizedBasis {
    /// Column-space basis. FastNorm: same shape as the input.
    /// Factorize: rows x rank, orthonormal.
    pub gc: Array2<f64>,
    /// Orthogonal-complement basis (rows x (rows - rank)), present only
    /// under `Factorize { complement: true }`.
    pub g: Option<Array2<f64>>,
}

/// Stabilize `design` with the chosen method.
///
/// Errors
/// ------
/// - `PsrError::DegenerateBasis` when FastNorm meets an all-zero column
///   (its norm cannot scale anything) or when factorization finds no
///   eigenvalue above tolerance.
pub fn stabilize(design: ArrayView2<'_, f64>, method: StabilizeMethod) -> PsrResult<StabilizedBasis> {
    match method {
        StabilizeMethod::FastNorm => fast_norm(design),
        StabilizeMethod::Factorize { complement } => factorize(design, complement),
    }
}

/// Fast path: divide each column by its Euclidean norm.
fn fast_norm(design: ArrayView2<'_, f64>) -> PsrResult<StabilizedBasis> {
    let mut gc = design.to_owned();
    for (j, mut col) in gc.columns_mut().into_iter().enumerate() {
        let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(PsrError::DegenerateBasis {
                reason: format!("design column {j} has norm {norm}"),
            });
        }
        col.mapv_inplace(|v| v / norm);
    }
    Ok(StabilizedBasis { gc, g: None })
}

/// Factorization path: symmetric eigendecomposition of `M Mᵀ` with
/// eigenvalue truncation, eigenpairs ordered by descending eigenvalue.
fn factorize(design: ArrayView2<'_, f64>, complement: bool) -> PsrResult<StabilizedBasis> {
    let (rows, cols) = design.dim();
    if rows == 0 || cols == 0 {
        return Err(PsrError::DegenerateBasis {
            reason: format!("design matrix is empty ({rows} x {cols})"),
        });
    }
    let m = fill_dmatrix(&design.to_owned());
    let outer = &m * m.transpose();
    let eigen = outer.symmetric_eigen();

    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let lambda_max = eigen.eigenvalues[order[0]].max(0.0);
    let tol = EIGEN_EPS.max(f64::EPSILON * rows.max(cols) as f64 * lambda_max);
    let rank = order.iter().filter(|&&k| eigen.eigenvalues[k] > tol).count();
    if rank == 0 {
        return Err(PsrError::DegenerateBasis {
            reason: "design matrix has no eigenvalue above tolerance".to_string(),
        });
    }

    let mut gc = Array2::<f64>::zeros((rows, rank));
    for (out_col, &k) in order[..rank].iter().enumerate() {
        for i in 0..rows {
            gc[[i, out_col]] = eigen.eigenvectors[(i, k)];
        }
    }

    let g = if complement {
        let mut comp = Array2::<f64>::zeros((rows, rows - rank));
        for (out_col, &k) in order[rank..].iter().enumerate() {
            for i in 0..rows {
                comp[[i, out_col]] = eigen.eigenvectors[(i, k)];
            }
        }
        Some(comp)
    } else {
        None
    };

    Ok(StabilizedBasis { gc, g })
}
