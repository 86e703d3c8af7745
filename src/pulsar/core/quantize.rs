//! Epoch quantization of TOAs for jitter/ECORR noise modeling.
//!
//! Purpose
//! -------
//! Turn a time-sorted TOA stream plus per-TOA flag labels into observing
//! epochs: groups of TOAs close enough in time (and of equal flag) that
//! their jitter noise is fully correlated. Produces the representative epoch
//! times, per-epoch member lists, and the binary incidence matrix `U`
//! (rows = TOAs, columns = epochs) used by the likelihood machinery.
//!
//! Key behaviors
//! -------------
//! - [`quantize`] scans TOAs in order and opens a new epoch whenever the
//!   time since the epoch's *first* member exceeds the bin width or the
//!   flag value changes. Epoch representative times are member means.
//! - [`QuantizedEpochs::reduce`] removes singleton epochs (no jitter
//!   correlation is meaningful for one TOA) while the full epoch set stays
//!   available for detection-statistic averaging.
//! - [`QuantizedEpochs::index_ranges`] converts contiguous epoch membership
//!   into `[start, end)` row ranges of `U`.
//! - [`QuantizedEpochs::check`] re-validates the partition and
//!   flag-coherence invariants after the fact.
//! - [`QuantizedEpochs::from_incidence`] rebuilds an epoch set from a
//!   persisted `U`, validating the partition rather than re-scanning.
//!
//! Invariants & assumptions
//! ------------------------
//! - Input TOAs are sorted and flag-aligned (the ordering stage's job);
//!   quantization itself never reorders anything.
//! - Full epoch set: membership partitions the TOA index set (each row of
//!   `U` sums to 1); column sums equal epoch sizes.
//! - Reduced epoch set: every epoch has >= 2 members; the union of members
//!   is a subset of the TOA index set.
//!
//! Conventions
//! -----------
//! - `dt` is the jitter bin width in the unit of `toas` (seconds).
//! - Zero TOAs produce empty structures, not an error.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the scan's split conditions (time gap, flag change),
//!   partition and column-sum invariants, singleton reduction, index-range
//!   extraction, the self-check, and the empty input.
use crate::pulsar::errors::{PsrError, PsrResult};
use ndarray::{Array1, Array2};

/// An epoch set produced by [`quantize`]: representative times, member index
/// lists, originating flags, and the binary incidence matrix.
///
/// Two instances are typically alive per pulsar: the full set (detection
/// statistics need the complete averaging structure) and the reduced set
/// (only epochs that actually need jitter/ECORR modeling).
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedEpochs {
    /// Representative time per epoch: the mean of its members' TOAs.
    pub avetoas: Array1<f64>,
    /// Binary incidence matrix, rows = TOAs, columns = epochs.
    pub u: Array2<f64>,
    /// Ascending TOA indices per epoch.
    pub members: Vec<Vec<usize>>,
    /// Flag value of each epoch (taken from its first member).
    pub flags: Vec<String>,
}

impl QuantizedEpochs {
    /// Rebuild a full epoch set from a stored incidence matrix.
    ///
    /// Archive loaders persist `U` between runs; membership is read off its
    /// columns while representative times and per-epoch flags are
    /// recomputed from the current arrays.
    ///
    /// Errors
    /// ------
    /// - `PsrError::ShapeMismatch` when the row count disagrees with
    ///   `toas`.
    /// - `PsrError::FlagLengthMismatch` on misaligned flags.
    /// - `PsrError::QuantizationCheck` when an entry is not 0/1, a column
    ///   is empty, or a TOA belongs to more or fewer than one epoch.
    pub fn from_incidence(
        u: &Array2<f64>, toas: &Array1<f64>, flags: &[String],
    ) -> PsrResult<QuantizedEpochs> {
        let n = toas.len();
        if u.nrows() != n {
            return Err(PsrError::ShapeMismatch { field: "umat", expected: n, actual: u.nrows() });
        }
        if flags.len() != n {
            return Err(PsrError::FlagLengthMismatch { flags: flags.len(), toas: n });
        }
        let n_epochs = u.ncols();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_epochs];
        let mut hits = vec![0usize; n];
        for ((i, e), &v) in u.indexed_iter() {
            if v == 1.0 {
                members[e].push(i);
                hits[i] += 1;
            } else if v != 0.0 {
                return Err(PsrError::QuantizationCheck {
                    reason: format!("stored incidence entry ({i}, {e}) is {v}, expected 0 or 1"),
                });
            }
        }
        if let Some(i) = hits.iter().position(|&c| c != 1) {
            return Err(PsrError::QuantizationCheck {
                reason: format!("TOA {i} belongs to {} stored epochs, expected 1", hits[i]),
            });
        }
        if let Some(e) = members.iter().position(Vec::is_empty) {
            return Err(PsrError::QuantizationCheck {
                reason: format!("stored incidence column {e} is empty"),
            });
        }

        let mut avetoas = Array1::<f64>::zeros(n_epochs);
        let mut epoch_flags = Vec::with_capacity(n_epochs);
        for (e, m) in members.iter().enumerate() {
            avetoas[e] = m.iter().map(|&i| toas[i]).sum::<f64>() / m.len() as f64;
            epoch_flags.push(flags[m[0]].clone());
        }
        Ok(QuantizedEpochs { avetoas, u: u.clone(), members, flags: epoch_flags })
    }

    /// Number of epochs.
    pub fn n_epochs(&self) -> usize {
        self.members.len()
    }

    /// Number of TOA rows in the incidence matrix.
    pub fn n_toas(&self) -> usize {
        self.u.nrows()
    }

    /// Drop epochs with fewer than two members.
    ///
    /// The returned incidence matrix keeps the full TOA row count; rows of
    /// dropped singletons are all-zero, which is exactly what the jitter
    /// likelihood expects.
    pub fn reduce(&self) -> QuantizedEpochs {
        let keep: Vec<usize> =
            (0..self.n_epochs()).filter(|&e| self.members[e].len() >= 2).collect();
        let n = self.n_toas();
        let mut u = Array2::<f64>::zeros((n, keep.len()));
        let mut members = Vec::with_capacity(keep.len());
        let mut flags = Vec::with_capacity(keep.len());
        let mut avetoas = Vec::with_capacity(keep.len());
        for (col, &e) in keep.iter().enumerate() {
            for &i in &self.members[e] {
                u[[i, col]] = 1.0;
            }
            members.push(self.members[e].clone());
            flags.push(self.flags[e].clone());
            avetoas.push(self.avetoas[e]);
        }
        QuantizedEpochs { avetoas: Array1::from(avetoas), u, members, flags }
    }

    /// Contiguous `[start, end)` row ranges of `U`, one per epoch.
    ///
    /// Errors
    /// ------
    /// - `PsrError::QuantizationCheck` when an epoch's members are not a
    ///   contiguous ascending run (the ordering stage was skipped or the
    ///   arrays were reordered behind our back).
    pub fn index_ranges(&self) -> PsrResult<Vec<(usize, usize)>> {
        let mut ranges = Vec::with_capacity(self.n_epochs());
        for (e, members) in self.members.iter().enumerate() {
            let start = match members.first() {
                Some(&s) => s,
                None => {
                    return Err(PsrError::QuantizationCheck {
                        reason: format!("epoch {e} has no members"),
                    })
                }
            };
            for (k, &i) in members.iter().enumerate() {
                if i != start + k {
                    return Err(PsrError::QuantizationCheck {
                        reason: format!("epoch {e} is not contiguous at index {i}"),
                    });
                }
            }
            ranges.push((start, start + members.len()));
        }
        Ok(ranges)
    }

    /// Re-validate the epoch invariants against the per-TOA flag array:
    /// every TOA in at most one epoch (exactly one for a full set), and no
    /// epoch mixing flag values.
    ///
    /// Errors
    /// ------
    /// - `PsrError::FlagLengthMismatch` on misaligned flags.
    /// - `PsrError::QuantizationCheck` describing the first violation.
    pub fn check(&self, flags: &[String]) -> PsrResult<()> {
        let n = self.n_toas();
        if flags.len() != n {
            return Err(PsrError::FlagLengthMismatch { flags: flags.len(), toas: n });
        }
        let mut hits = vec![0usize; n];
        for (e, members) in self.members.iter().enumerate() {
            for &i in members {
                hits[i] += 1;
            }
            if let Some(&first) = members.first() {
                if members.iter().any(|&i| flags[i] != flags[first]) {
                    return Err(PsrError::QuantizationCheck {
                        reason: format!("epoch {e} mixes flag values"),
                    });
                }
            }
        }
        if let Some(i) = hits.iter().position(|&c| c > 1) {
            return Err(PsrError::QuantizationCheck {
                reason: format!("TOA {i} is claimed by more than one epoch"),
            });
        }
        for (e, members) in self.members.iter().enumerate() {
            let col_sum: f64 = self.u.column(e).sum();
            if col_sum as usize != members.len() {
                return Err(PsrError::QuantizationCheck {
                    reason: format!(
                        "incidence column {e} sums to {col_sum}, expected {}",
                        members.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Quantize sorted TOAs into epochs.
///
/// A new epoch starts whenever the time since the current epoch's first
/// member exceeds `dt` or the flag value changes. Zero TOAs yield empty
/// structures.
///
/// Errors
/// ------
/// - `PsrError::FlagLengthMismatch` when `flags.len() != toas.len()`.
pub fn quantize(toas: &Array1<f64>, flags: &[String], dt: f64) -> PsrResult<QuantizedEpochs> {
    let n = toas.len();
    if flags.len() != n {
        return Err(PsrError::FlagLengthMismatch { flags: flags.len(), toas: n });
    }

    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut epoch_flags: Vec<String> = Vec::new();
    let mut epoch_start = 0.0_f64;
    for i in 0..n {
        let fresh = match members.last() {
            None => true,
            Some(current) => {
                let first = current[0];
                toas[i] - epoch_start > dt || flags[i] != flags[first]
            }
        };
        if fresh {
            members.push(Vec::new());
            epoch_flags.push(flags[i].clone());
            epoch_start = toas[i];
        }
        if let Some(current) = members.last_mut() {
            current.push(i);
        }
    }

    let n_epochs = members.len();
    let mut u = Array2::<f64>::zeros((n, n_epochs));
    let mut avetoas = Array1::<f64>::zeros(n_epochs);
    for (e, m) in members.iter().enumerate() {
        let mut sum = 0.0;
        for &i in m {
            u[[i, e]] = 1.0;
            sum += toas[i];
        }
        avetoas[e] = sum / m.len() as f64;
    }

    Ok(QuantizedEpochs { avetoas, u, members, flags: epoch_flags })
}
