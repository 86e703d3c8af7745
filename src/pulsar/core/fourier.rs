//! Fourier design matrices for red and dispersion-measure noise.
//!
//! Purpose
//! -------
//! Build the sine/cosine basis matrices that model low-frequency stochastic
//! timing noise: harmonics `n / Tspan` for `n = 1..nmodes`, evaluated at the
//! TOA times. The DM variant scales each row by the inverse dispersion
//! factor `1 / (K ν²)` so that the same basis describes a chromatic
//! (radio-frequency-dependent) process.
//!
//! Key behaviors
//! -------------
//! - [`fourier_design_red`]: pure function of times, mode count, and span;
//!   returns a `n_toas x 2·nmodes` matrix with alternating sine/cosine
//!   columns.
//! - [`fourier_design_dm`]: the red basis with per-TOA dispersion weights.
//! - All invalid inputs are typed errors; no NaN/Inf column is ever
//!   produced.
//!
//! Conventions
//! -----------
//! - Column `2k` is `sin(2π (k+1) t / Tspan)`, column `2k+1` the matching
//!   cosine.
//! - Observing frequencies are in MHz; the dispersion constant [`DM_K`] is
//!   expressed accordingly.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the column count, the exact sin/cos values at chosen
//!   harmonics, the DM weight scaling, and every rejection branch.
use crate::pulsar::errors::{PsrError, PsrResult};
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

/// Dispersion constant for observing frequencies in MHz: a delay of
/// `DM / (DM_K ν²)` seconds per unit dispersion measure (pc cm⁻³).
pub const DM_K: f64 = 2.41e-4;

/// Build the red-noise Fourier design matrix.
///
/// Parameters
/// ----------
/// - `toas`: TOA times in seconds.
/// - `nmodes`: number of harmonics; the output has `2 * nmodes` columns.
/// - `tspan`: total span the harmonics are anchored to, in seconds.
///
/// Errors
/// ------
/// - `PsrError::InvalidSpan` when `tspan` is non-positive or non-finite.
/// - `PsrError::InvalidModeCount` when `nmodes == 0`.
pub fn fourier_design_red(
    toas: &Array1<f64>, nmodes: usize, tspan: f64,
) -> PsrResult<Array2<f64>> {
    if !tspan.is_finite() || tspan <= 0.0 {
        return Err(PsrError::InvalidSpan { tspan });
    }
    if nmodes == 0 {
        return Err(PsrError::InvalidModeCount);
    }
    let n = toas.len();
    let mut f = Array2::<f64>::zeros((n, 2 * nmodes));
    for k in 0..nmodes {
        let freq = (k + 1) as f64 / tspan;
        for (i, &t) in toas.iter().enumerate() {
            let phase = 2.0 * PI * freq * t;
            f[[i, 2 * k]] = phase.sin();
            f[[i, 2 * k + 1]] = phase.cos();
        }
    }
    Ok(f)
}

/// Build the DM-noise Fourier design matrix: the red basis with each row
/// scaled by `1 / (DM_K ν²)` for that TOA's observing frequency `ν` (MHz).
///
/// Errors
/// ------
/// - Everything [`fourier_design_red`] rejects.
/// - `PsrError::ShapeMismatch` when `obs_freqs` is not aligned with `toas`.
/// - `PsrError::NonFiniteValue` when an observing frequency is non-positive
///   or non-finite (the weight would be NaN/Inf).
pub fn fourier_design_dm(
    toas: &Array1<f64>, nmodes: usize, obs_freqs: &Array1<f64>, tspan: f64,
) -> PsrResult<Array2<f64>> {
    if obs_freqs.len() != toas.len() {
        return Err(PsrError::ShapeMismatch {
            field: "obs_freqs",
            expected: toas.len(),
            actual: obs_freqs.len(),
        });
    }
    for (i, &nu) in obs_freqs.iter().enumerate() {
        if !nu.is_finite() || nu <= 0.0 {
            return Err(PsrError::NonFiniteValue { field: "obs_freqs", index: i, value: nu });
        }
    }
    let mut f = fourier_design_red(toas, nmodes, tspan)?;
    for (i, mut row) in f.rows_mut().into_iter().enumerate() {
        let weight = 1.0 / (DM_K * obs_freqs[i] * obs_freqs[i]);
        row.mapv_inplace(|v| v * weight);
    }
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Column count 2m and exact sin/cos values at each harmonic.
    // - DM row weights relative to the red basis.
    // - Rejection of non-positive/non-finite spans, zero mode counts,
    //   misaligned frequency arrays, and non-positive frequencies.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-12;

    #[test]
    // Purpose
    // -------
    // The red basis has exactly 2m columns and each pair evaluates to
    // sin/cos(2π n t / Tspan).
    //
    // Given
    // -----
    // - Times [0, 2.5, 5] over a span of 10 with 3 modes.
    //
    // Expect
    // ------
    // - Shape (3, 6); every entry matches the closed form.
    fn red_basis_matches_closed_form() {
        // Arrange
        let toas = array![0.0, 2.5, 5.0];
        let tspan = 10.0;
        let nmodes = 3;

        // Act
        let f = fourier_design_red(&toas, nmodes, tspan).unwrap();

        // Assert
        assert_eq!(f.dim(), (3, 6));
        for k in 0..nmodes {
            let freq = (k + 1) as f64 / tspan;
            for (i, &t) in toas.iter().enumerate() {
                let phase = 2.0 * PI * freq * t;
                assert_abs_diff_eq!(f[[i, 2 * k]], phase.sin(), epsilon = TOL);
                assert_abs_diff_eq!(f[[i, 2 * k + 1]], phase.cos(), epsilon = TOL);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The DM basis equals the red basis scaled per row by 1/(K ν²).
    fn dm_basis_applies_dispersion_weights() {
        // Arrange
        let toas = array![1.0, 2.0];
        let freqs = array![1400.0, 700.0];
        let tspan = 10.0;

        // Act
        let red = fourier_design_red(&toas, 2, tspan).unwrap();
        let dm = fourier_design_dm(&toas, 2, &freqs, tspan).unwrap();

        // Assert
        for i in 0..2 {
            let weight = 1.0 / (DM_K * freqs[i] * freqs[i]);
            for j in 0..4 {
                assert_abs_diff_eq!(dm[[i, j]], red[[i, j]] * weight, epsilon = TOL);
            }
        }
        // The lower frequency carries the larger DM weight (factor 4 here).
        assert_abs_diff_eq!(dm[[1, 0]] / red[[1, 0]], 4.0 * dm[[0, 0]] / red[[0, 0]], epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive and non-finite spans are rejected with InvalidSpan.
    fn red_basis_rejects_bad_span() {
        // Arrange
        let toas = array![1.0, 2.0];

        // Act / Assert
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            match fourier_design_red(&toas, 2, bad) {
                Err(PsrError::InvalidSpan { .. }) => (),
                other => panic!("expected InvalidSpan for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A zero mode count is rejected rather than producing a 0-column basis.
    fn red_basis_rejects_zero_modes() {
        // Arrange
        let toas = array![1.0];

        // Act / Assert
        match fourier_design_red(&toas, 0, 10.0) {
            Err(PsrError::InvalidModeCount) => (),
            other => panic!("expected InvalidModeCount, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Misaligned or non-positive observing frequencies are typed errors,
    // never NaN columns.
    fn dm_basis_rejects_bad_frequencies() {
        // Arrange
        let toas = array![1.0, 2.0];

        // Act / Assert
        match fourier_design_dm(&toas, 1, &array![1400.0], 10.0) {
            Err(PsrError::ShapeMismatch { field: "obs_freqs", .. }) => (),
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
        match fourier_design_dm(&toas, 1, &array![1400.0, 0.0], 10.0) {
            Err(PsrError::NonFiniteValue { field: "obs_freqs", index: 1, .. }) => (),
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }
    }
}
