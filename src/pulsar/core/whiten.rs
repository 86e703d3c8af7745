//! Two-component noise projection: whiten residuals against the
//! timing-model complement.
//!
//! Purpose
//! -------
//! Given the orthogonal-complement basis `G` of the timing model and per-TOA
//! uncertainty estimates, build the transform that diagonalizes the combined
//! (scale-noise + basis-projection) covariance, and apply it to the residual
//! vector and to the currently populated Fourier basis. The whitened noise
//! levels come out as the diagonal `diag_white`, and the projected
//! quantities feed the downstream likelihood directly.
//!
//! Key behaviors
//! -------------
//! - Form the quadratic forms `A = Gᵀ diag(σ²) G` and `B = Gᵀ G`.
//! - Cholesky-factor `B`; failure is a [`PsrError::DegenerateBasis`]
//!   (fatal for the pulsar — it means `G` upstream is malformed), surfaced
//!   distinctly from generic computation errors.
//! - Sandwich `A` through the Cholesky inverse and SVD the symmetric result
//!   to obtain the eigenbasis `u` and whitened levels `s`.
//! - The projector is `P = uᵀ L⁻¹ Gᵀ`; outputs are `P·r` and `P·F`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `G` has one row per TOA and full column rank (guaranteed by the
//!   factorization-path stabilizer).
//! - Uncertainties are finite and strictly positive.
//! - No explicit matrix inverse of `B` is formed; `L⁻¹` is obtained by a
//!   triangular solve against the identity.
//!
//! Testing notes
//! -------------
//! - Unit tests verify on synthetic data that the projected noise
//!   covariance `P diag(σ²) Pᵀ` is diagonal to tolerance with diagonal
//!   `diag_white`, plus every shape/degeneracy rejection branch.
use crate::pulsar::errors::{PsrError, PsrResult};
use crate::utils::{fill_dmatrix, fill_dvector, to_array1, to_array2};
use nalgebra::{Cholesky, DMatrix, SVD};
use ndarray::{Array1, Array2, ArrayView2};

/// Output of the two-component projection.
#[derive(Debug, Clone, PartialEq)]
pub struct WhitenedData {
    /// Diagonal whitened noise levels (singular values of the sandwich).
    pub diag_white: Array1<f64>,
    /// Projected residual vector, length = complement dimension.
    pub res_prime: Array1<f64>,
    /// Projected Fourier basis, complement dimension x basis columns.
    pub ftot_prime: Array2<f64>,
}

/// Whiten `residuals` and `ftot` against the complement basis `g` under the
/// per-TOA uncertainties `toaerrs`.
///
/// Parameters
/// ----------
/// - `g`: orthogonal-complement basis, rows = TOAs.
/// - `toaerrs`: per-TOA uncertainty estimates in seconds (calibrated ones if
///   a noise-parameter rescale was requested upstream).
/// - `residuals`: timing residuals in seconds.
/// - `ftot`: the currently populated Fourier total basis (red-only when no
///   DM basis was built).
///
/// Errors
/// ------
/// - `PsrError::ShapeMismatch` when any input disagrees with `g.nrows()`.
/// - `PsrError::NonFiniteValue` for a non-positive or non-finite
///   uncertainty.
/// - `PsrError::DegenerateBasis` when `Gᵀ G` is not positive-definite or
///   the sandwich SVD fails — a malformed `G` upstream.
pub fn two_component_noise(
    g: ArrayView2<'_, f64>, toaerrs: &Array1<f64>, residuals: &Array1<f64>,
    ftot: ArrayView2<'_, f64>,
) -> PsrResult<WhitenedData> {
    let (n, k) = g.dim();
    check_rows("toaerrs", toaerrs.len(), n)?;
    check_rows("residuals", residuals.len(), n)?;
    check_rows("ftot", ftot.nrows(), n)?;
    for (i, &sigma) in toaerrs.iter().enumerate() {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(PsrError::NonFiniteValue { field: "toaerrs", index: i, value: sigma });
        }
    }

    let g_mat = fill_dmatrix(&g.to_owned());

    // A = Gᵀ diag(σ²) G and B = Gᵀ G.
    let mut dg = g_mat.clone();
    for i in 0..n {
        let w = toaerrs[i] * toaerrs[i];
        for j in 0..k {
            dg[(i, j)] *= w;
        }
    }
    let a = g_mat.transpose() * &dg;
    let b = g_mat.transpose() * &g_mat;

    let chol = Cholesky::new(b).ok_or_else(|| PsrError::DegenerateBasis {
        reason: "Gᵀ G is not positive-definite (Cholesky failed)".to_string(),
    })?;
    let l = chol.l();
    let l_inv = l
        .solve_lower_triangular(&DMatrix::<f64>::identity(k, k))
        .ok_or_else(|| PsrError::DegenerateBasis {
            reason: "triangular solve against the Cholesky factor failed".to_string(),
        })?;

    let sand = &l_inv * a * l_inv.transpose();
    let svd = SVD::new(sand, true, false);
    let u = svd.u.ok_or_else(|| PsrError::DegenerateBasis {
        reason: "SVD of the noise sandwich did not converge".to_string(),
    })?;

    let proj = u.transpose() * &l_inv * g_mat.transpose();
    let res_prime = &proj * fill_dvector(residuals);
    let ftot_prime = &proj * fill_dmatrix(&ftot.to_owned());

    Ok(WhitenedData {
        diag_white: Array1::from_iter(svd.singular_values.iter().copied()),
        res_prime: to_array1(&res_prime),
        ftot_prime: to_array2(&ftot_prime),
    })
}

fn check_rows(field: &'static str, actual: usize, expected: usize) -> PsrResult<()> {
    if actual != expected {
        return Err(PsrError::ShapeMismatch { field, expected, actual });
    }
    Ok(())
}
