//! Validated per-pulsar TOA record container.
//!
//! Purpose
//! -------
//! Provide the aligned-array container at the bottom of the data-preparation
//! pipeline: TOA times, uncertainties, timing residuals, observing
//! frequencies, and the timing-model design matrix, all indexed by the same
//! TOA order. This module centralizes the alignment invariant and the single
//! atomic reorder operation that every downstream stage relies on.
//!
//! Key behaviors
//! -------------
//! - [`ToaRecord::new`] enforces non-emptiness and equal lengths across all
//!   per-TOA arrays (design-matrix rows included) at construction time.
//! - [`ToaRecord::apply_permutation`] reorders *every* aligned array and the
//!   design-matrix rows in one step, after validating that the permutation is
//!   a bijection on the TOA index set. Partial application is impossible by
//!   construction.
//!
//! Invariants & assumptions
//! ------------------------
//! - `toas.len() == toaerrs.len() == residuals.len() == obs_freqs.len()
//!   == design.nrows()` at all times.
//! - The record is non-empty.
//! - TOA times are **not** required to be sorted at construction; sorting is
//!   the ordering stage's job and is verified there.
//!
//! Conventions
//! -----------
//! - TOA times, uncertainties, and residuals are in **seconds**; observing
//!   frequencies in **MHz**; sky location in **degrees**.
//! - Indexing is 0-based and refers to the record's current order.
//!
//! Downstream usage
//! ----------------
//! - The ordering stage computes a permutation from times and flags, then
//!   calls [`ToaRecord::apply_permutation`] exactly once.
//! - Basis builders read `toas`/`obs_freqs`; the stabilizer consumes a view
//!   of `design` without mutating it.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction (happy path, empty record, each length
//!   mismatch), permutation bijection validation, and atomic reordering of
//!   all arrays including design rows.
use crate::pulsar::errors::{PsrError, PsrResult};
use ndarray::{Array1, Array2, Axis};

/// Validated per-pulsar record: identity, sky location, aligned per-TOA
/// arrays, and the timing-model design matrix.
///
/// Invariants
/// ----------
/// - All per-TOA arrays share one length `n > 0`, and `design.nrows() == n`.
/// - Any reorder goes through [`ToaRecord::apply_permutation`], which applies
///   the same permutation to every array atomically.
///
/// Notes
/// -----
/// - The design matrix is owned exclusively by the record; downstream stages
///   consume it by view and never mutate it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ToaRecord {
    /// Pulsar name (e.g. "J1909-3744").
    pub name: String,
    /// Right ascension in degrees.
    pub ra_deg: f64,
    /// Declination in degrees.
    pub dec_deg: f64,
    /// TOA times in seconds.
    pub toas: Array1<f64>,
    /// TOA uncertainties in seconds.
    pub toaerrs: Array1<f64>,
    /// Timing residuals in seconds.
    pub residuals: Array1<f64>,
    /// Observing frequencies in MHz.
    pub obs_freqs: Array1<f64>,
    /// Timing-model design matrix, rows = TOAs, columns = model parameters.
    pub design: Array2<f64>,
}

impl ToaRecord {
    /// Construct a validated record from raw arrays.
    ///
    /// Parameters
    /// ----------
    /// - `name`: pulsar identity.
    /// - `ra_deg`, `dec_deg`: sky location in degrees.
    /// - `toas`, `toaerrs`, `residuals`, `obs_freqs`: aligned per-TOA arrays.
    /// - `design`: design matrix with one row per TOA.
    ///
    /// Errors
    /// ------
    /// - `PsrError::EmptyRecord` when `toas` is empty.
    /// - `PsrError::ShapeMismatch` naming the first offending array when any
    ///   aligned array (or `design.nrows()`) disagrees with `toas.len()`.
    pub fn new(
        name: impl Into<String>, ra_deg: f64, dec_deg: f64, toas: Array1<f64>,
        toaerrs: Array1<f64>, residuals: Array1<f64>, obs_freqs: Array1<f64>,
        design: Array2<f64>,
    ) -> PsrResult<Self> {
        let n = toas.len();
        if n == 0 {
            return Err(PsrError::EmptyRecord);
        }
        check_len("toaerrs", toaerrs.len(), n)?;
        check_len("residuals", residuals.len(), n)?;
        check_len("obs_freqs", obs_freqs.len(), n)?;
        check_len("design", design.nrows(), n)?;
        Ok(ToaRecord { name: name.into(), ra_deg, dec_deg, toas, toaerrs, residuals, obs_freqs, design })
    }

    /// Number of TOAs in the record.
    pub fn len(&self) -> usize {
        self.toas.len()
    }

    /// Whether the record is empty. Always `false` for a constructed record;
    /// present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.toas.is_empty()
    }

    /// Total observation span `max(t) - min(t)` in seconds.
    pub fn tspan(&self) -> f64 {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &t in self.toas.iter() {
            min = min.min(t);
            max = max.max(t);
        }
        max - min
    }

    /// Whether TOA times are currently in non-decreasing order.
    pub fn is_time_sorted(&self) -> bool {
        self.toas.windows(2).into_iter().all(|w| w[0] <= w[1])
    }

    /// Reorder the whole record by `perm` in one atomic step.
    ///
    /// Entry `i` of every output array is entry `perm[i]` of the input, and
    /// row `i` of the output design matrix is row `perm[i]` of the input.
    /// The permutation is validated as a bijection on `0..len` first, so the
    /// record is either fully reordered or untouched.
    ///
    /// Errors
    /// ------
    /// - `PsrError::InvalidPermutation` when `perm` has the wrong length or
    ///   repeats/omits an index.
    pub fn apply_permutation(&mut self, perm: &[usize]) -> PsrResult<()> {
        let n = self.len();
        validate_permutation(perm, n)?;
        self.toas = permute_vec(&self.toas, perm);
        self.toaerrs = permute_vec(&self.toaerrs, perm);
        self.residuals = permute_vec(&self.residuals, perm);
        self.obs_freqs = permute_vec(&self.obs_freqs, perm);
        self.design = self.design.select(Axis(0), perm);
        Ok(())
    }
}

/// Validate that `perm` is a bijection on `0..n`.
pub(crate) fn validate_permutation(perm: &[usize], n: usize) -> PsrResult<()> {
    if perm.len() != n {
        return Err(PsrError::InvalidPermutation { len: perm.len(), expected: n });
    }
    let mut seen = vec![false; n];
    for &p in perm {
        if p >= n || seen[p] {
            return Err(PsrError::InvalidPermutation { len: perm.len(), expected: n });
        }
        seen[p] = true;
    }
    Ok(())
}

/// Gather `arr[perm[i]]` into position `i`.
fn permute_vec(arr: &Array1<f64>, perm: &[usize]) -> Array1<f64> {
    Array1::from_iter(perm.iter().map(|&p| arr[p]))
}

/// Report a `ShapeMismatch` for `field` unless `actual == expected`.
fn check_len(field: &'static str, actual: usize, expected: usize) -> PsrResult<()> {
    if actual != expected {
        return Err(PsrError::ShapeMismatch { field, expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulsar::errors::PsrError;
    use ndarray::{array, Array1, Array2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Successful construction of a well-formed record.
    // - Each shape-mismatch branch in `ToaRecord::new` plus the empty case.
    // - Bijection validation in `apply_permutation` (wrong length,
    //   duplicated index).
    // - Atomicity of the reorder: every array and the design rows move
    //   together under the same permutation.
    //
    // They intentionally DO NOT cover:
    // - Ordering-policy questions (which permutation to apply); those live
    //   in `core::ordering`.
    // -------------------------------------------------------------------------

    fn small_record() -> ToaRecord {
        ToaRecord::new(
            "J0000+0000",
            12.0,
            -34.0,
            array![3.0, 1.0, 2.0],
            array![0.3, 0.1, 0.2],
            array![-3.0, -1.0, -2.0],
            array![1400.0, 800.0, 3100.0],
            array![[3.0, 30.0], [1.0, 10.0], [2.0, 20.0]],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that a consistent set of arrays constructs successfully and
    // reports the right length and span.
    fn new_valid_arrays_succeeds() {
        // Arrange / Act
        let rec = small_record();

        // Assert
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.tspan(), 2.0);
        assert!(!rec.is_time_sorted());
    }

    #[test]
    // Purpose
    // -------
    // Ensure an empty TOA array is rejected with `EmptyRecord`.
    fn new_empty_toas_returns_empty_record() {
        // Arrange / Act
        let result = ToaRecord::new(
            "J0000+0000",
            0.0,
            0.0,
            Array1::zeros(0),
            Array1::zeros(0),
            Array1::zeros(0),
            Array1::zeros(0),
            Array2::zeros((0, 2)),
        );

        // Assert
        match result {
            Err(PsrError::EmptyRecord) => (),
            other => panic!("expected EmptyRecord, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a misaligned array is rejected with a `ShapeMismatch` naming
    // the offending field.
    fn new_misaligned_errors_returns_shape_mismatch() {
        // Arrange / Act
        let result = ToaRecord::new(
            "J0000+0000",
            0.0,
            0.0,
            array![1.0, 2.0],
            array![0.1],
            array![-1.0, -2.0],
            array![1400.0, 1400.0],
            Array2::zeros((2, 1)),
        );

        // Assert
        match result {
            Err(PsrError::ShapeMismatch { field: "toaerrs", expected: 2, actual: 1 }) => (),
            other => panic!("expected ShapeMismatch on toaerrs, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure a design matrix with the wrong row count is rejected.
    fn new_design_row_mismatch_returns_shape_mismatch() {
        // Arrange / Act
        let result = ToaRecord::new(
            "J0000+0000",
            0.0,
            0.0,
            array![1.0, 2.0],
            array![0.1, 0.2],
            array![-1.0, -2.0],
            array![1400.0, 1400.0],
            Array2::zeros((3, 1)),
        );

        // Assert
        match result {
            Err(PsrError::ShapeMismatch { field: "design", .. }) => (),
            other => panic!("expected ShapeMismatch on design, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the reorder is applied to every aligned array and the design
    // rows together, leaving the record time-sorted.
    //
    // Given
    // -----
    // - A record whose arrays are in the order [3, 1, 2] (by time).
    // - The sorting permutation [1, 2, 0].
    //
    // Expect
    // ------
    // - Times, uncertainties, residuals, frequencies, and design rows all
    //   appear in time order afterwards.
    fn apply_permutation_reorders_all_arrays_atomically() {
        // Arrange
        let mut rec = small_record();

        // Act
        rec.apply_permutation(&[1, 2, 0]).unwrap();

        // Assert
        assert_eq!(rec.toas, array![1.0, 2.0, 3.0]);
        assert_eq!(rec.toaerrs, array![0.1, 0.2, 0.3]);
        assert_eq!(rec.residuals, array![-1.0, -2.0, -3.0]);
        assert_eq!(rec.obs_freqs, array![800.0, 3100.0, 1400.0]);
        assert_eq!(rec.design, array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]);
        assert!(rec.is_time_sorted());
    }

    #[test]
    // Purpose
    // -------
    // Ensure a permutation with a repeated index leaves the record untouched
    // and reports `InvalidPermutation`.
    fn apply_permutation_rejects_duplicate_index() {
        // Arrange
        let mut rec = small_record();
        let before = rec.clone();

        // Act
        let result = rec.apply_permutation(&[0, 0, 2]);

        // Assert
        match result {
            Err(PsrError::InvalidPermutation { .. }) => (),
            other => panic!("expected InvalidPermutation, got {other:?}"),
        }
        assert_eq!(rec, before);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a permutation of the wrong length is rejected.
    fn apply_permutation_rejects_wrong_length() {
        // Arrange
        let mut rec = small_record();

        // Act
        let result = rec.apply_permutation(&[0, 1]);

        // Assert
        match result {
            Err(PsrError::InvalidPermutation { len: 2, expected: 3 }) => (),
            other => panic!("expected InvalidPermutation, got {other:?}"),
        }
    }
}
