//! Per-pulsar preparation container.
//!
//! Purpose
//! -------
//! Take a [`TimingSource`] and carry it through the full preparation
//! pipeline: jitter-extended TOA ordering, flag indexing, epoch
//! quantization, optional uncertainty calibration, design-matrix
//! stabilization, and on-demand Fourier bases and whitening. The result is
//! a [`Pulsar`] holding everything a sampler or post-processing step
//! consumes.
//!
//! Key behaviors
//! -------------
//! - Ordering, flag permutation, and record permutation happen atomically:
//!   every per-TOA array in the container refers to the same sorted order.
//! - Epoch quantization keeps both the full epoch set (for deterministic
//!   per-epoch signal evaluation) and the reduced set with singleton
//!   epochs dropped (for jitter modeling).
//! - Noise parameters are parsed from the source's noise-file text when
//!   present, falling back to the parameter-file text; uncertainty
//!   calibration, when requested, runs before any basis is built so the
//!   whitening step sees calibrated uncertainties.
//! - Archive sources that persist derived data (epoch incidence, epoch
//!   ranges, stabilized bases) have it validated and reused instead of
//!   recomputed, provided the jitter-extended ordering left the record
//!   untouched; a reordering invalidates stored arrays and they are
//!   recomputed with a warning.
//! - Fourier bases are built lazily by the `make_*` methods against a
//!   caller-supplied span, so a shared multi-pulsar span can be anchored.
//!
//! Invariants & assumptions
//! ------------------------
//! - After construction the record's TOAs are non-decreasing and the
//!   jitter-extended ordering self-check has passed.
//! - `ftot` is the column concatenation `[fred | fdm]` whenever a DM basis
//!   was requested, and `fred` alone otherwise.
//!
//! Conventions
//! -----------
//! - Epoch grouping prefers the `group` flag category, then `f`, then
//!   whatever informative category exists; the choice is logged.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the sorted-and-checked construction invariant, the
//!   flag fallback, uncertainty calibration on an archive source, lazy
//!   basis shapes, and whitening preconditions. End-to-end sizing is in
//!   the integration suite.
use crate::noise::params::NoiseParams;
use crate::noise::parser::{parse_noise_file, parse_par_file};
use crate::pulsar::core::flags::{FlagIndex, SYSTEM_FLAG_CATEGORIES};
use crate::pulsar::core::ordering::{argsort_by_epoch, check_ordering};
use crate::pulsar::core::quantize::{quantize, QuantizedEpochs};
use crate::pulsar::core::record::ToaRecord;
use crate::pulsar::core::stabilize::{stabilize, StabilizeMethod, StabilizedBasis};
use crate::pulsar::core::whiten::WhitenedData;
use crate::pulsar::core::{fourier, whiten};
use crate::pulsar::errors::{PsrError, PsrResult};
use crate::pulsar::models::sources::TimingSource;
use ndarray::{s, Array1, Array2};
use std::collections::BTreeMap;

/// Preparation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepOptions {
    /// Epoch bin width for jitter grouping, in seconds.
    pub jitter_bin: f64,
    /// Design-matrix stabilization strategy.
    pub stabilize: StabilizeMethod,
    /// Calibrate uncertainties with parsed EFAC/EQUAD before building
    /// bases. Skipped (with a log line) when the source carries no noise
    /// parameters.
    pub rescale_errors: bool,
    /// Flag category whose buckets define the calibration systems.
    pub rescale_category: String,
}

impl PrepOptions {
    pub fn new(
        jitter_bin: f64, stabilize: StabilizeMethod, rescale_errors: bool,
        rescale_category: &str,
    ) -> PrepOptions {
        PrepOptions {
            jitter_bin,
            stabilize,
            rescale_errors,
            rescale_category: rescale_category.to_string(),
        }
    }
}

impl Default for PrepOptions {
    fn default() -> Self {
        PrepOptions {
            jitter_bin: 10.0,
            stabilize: StabilizeMethod::Factorize { complement: true },
            rescale_errors: true,
            rescale_category: "f".to_string(),
        }
    }
}

/// A fully prepared pulsar.
#[derive(Debug, Clone, PartialEq)]
pub struct Pulsar {
    /// Sorted, validated per-TOA data.
    pub record: ToaRecord,
    /// System-flag index in sorted TOA order.
    pub flag_index: FlagIndex,
    /// Category used for jitter grouping (may be the synthesized
    /// catch-all named after the pulsar).
    pub jitter_category: String,
    /// Per-TOA values of the jitter category, sorted order.
    pub jitter_flags: Vec<String>,
    /// Full epoch set, singletons included.
    pub epochs_full: QuantizedEpochs,
    /// Reduced epoch set with singleton epochs dropped.
    pub epochs: QuantizedEpochs,
    /// Contiguous `[start, end)` TOA ranges of the full epoch set.
    pub epoch_ranges: Vec<(usize, usize)>,
    /// Stabilized timing-model basis.
    pub basis: StabilizedBasis,
    /// Residuals projected onto the complement basis, when one was built.
    pub g_res: Option<Array1<f64>>,
    /// Parsed noise parameters, when the source carried any.
    pub noise: Option<NoiseParams>,
    /// Red-noise Fourier basis.
    pub fred: Option<Array2<f64>>,
    /// DM-noise Fourier basis.
    pub fdm: Option<Array2<f64>>,
    /// Total Fourier basis, `[fred | fdm]` or `fred` alone.
    pub ftot: Option<Array2<f64>>,
    /// Extended basis `[gc | ftot]`.
    pub te: Option<Array2<f64>>,
    /// Two-component whitening output.
    pub white: Option<WhitenedData>,
}

impl Pulsar {
    /// Run the preparation pipeline over `source`.
    ///
    /// Parameters
    /// ----------
    /// - `source`: a live timing model or an archive record.
    /// - `opts`: bin width, stabilization strategy, and calibration
    ///   settings.
    ///
    /// Errors
    /// ------
    /// - `PsrError::EmptyRecord` / `ShapeMismatch` for malformed source
    ///   arrays.
    /// - `PsrError::QuantizationCheck` when the post-sort self-checks
    ///   fail.
    /// - `PsrError::MissingFlag` when calibration is requested but the
    ///   configured category is absent.
    /// - `PsrError::Noise` for malformed noise text or a system bucket
    ///   with no registered parameters.
    /// - `PsrError::DegenerateBasis` from stabilization, or from stored
    ///   bases whose column counts do not partition the record.
    /// - `PsrError::ShapeMismatch` when stored derived arrays disagree
    ///   with the record's row count.
    pub fn from_source<S: TimingSource>(source: &S, opts: &PrepOptions) -> PsrResult<Pulsar> {
        let name = source.name().to_string();
        let mut record = source.record()?;
        let n = record.len();

        // Pick the epoch-grouping category on a provisional index, then
        // permute the record and every flag category together.
        let raw_flags = source.flag_categories();
        let provisional = FlagIndex::build(&name, n, raw_flags)?;
        let jitter_category = provisional
            .first_available(&SYSTEM_FLAG_CATEGORIES)?
            .to_string();
        if jitter_category != SYSTEM_FLAG_CATEGORIES[0] {
            log::info!(
                "{name}: no '{}' flag; grouping jitter epochs by '{jitter_category}'",
                SYSTEM_FLAG_CATEGORIES[0]
            );
        }
        let unsorted_flags: Vec<String> =
            provisional.per_toa_values(&jitter_category)?.to_vec();

        let (isort, _iisort) = argsort_by_epoch(&record.toas, &unsorted_flags, opts.jitter_bin)?;
        // Stored derived arrays are aligned with the source's original TOA
        // order; once the ordering permutes anything they no longer apply.
        let in_stored_order = isort.iter().enumerate().all(|(i, &p)| i == p);
        let has_stored = source.stored_gc().is_some()
            || source.stored_g().is_some()
            || source.stored_umat().is_some()
            || source.stored_epoch_ranges().is_some();
        if has_stored && !in_stored_order {
            log::warn!(
                "{name}: stored derived data predates a different TOA order; recomputing"
            );
        }
        let use_stored = has_stored && in_stored_order;
        record.apply_permutation(&isort)?;
        let mut sorted_categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (category, values) in raw_flags {
            if values.is_empty() {
                sorted_categories.insert(category.clone(), Vec::new());
                continue;
            }
            sorted_categories
                .insert(category.clone(), isort.iter().map(|&i| values[i].clone()).collect());
        }
        let flag_index = FlagIndex::build(&name, n, &sorted_categories)?;
        let jitter_flags: Vec<String> = flag_index.per_toa_values(&jitter_category)?.to_vec();
        check_ordering(&record.toas, &jitter_flags, opts.jitter_bin)?;

        // Noise parameters come from the noise file when one is embedded,
        // otherwise from the timing-model parameter file.
        let noise = match (source.noise_text(), source.par_text()) {
            (Some(text), _) => Some(parse_noise_file(text).map_err(PsrError::from)?),
            (None, Some(text)) => Some(parse_par_file(text).map_err(PsrError::from)?),
            (None, None) => None,
        };

        // Calibrate uncertainties before any basis touches them.
        if opts.rescale_errors {
            match &noise {
                Some(params) => {
                    let systems = flag_index.category(&opts.rescale_category)?;
                    record.toaerrs = params.rescale_toaerrs(&record.toaerrs, systems)?;
                }
                None => {
                    log::debug!("{name}: no noise parameters; keeping raw uncertainties");
                }
            }
        }

        let epochs_full = match source.stored_umat().filter(|_| use_stored) {
            Some(u) => QuantizedEpochs::from_incidence(u, &record.toas, &jitter_flags)?,
            None => quantize(&record.toas, &jitter_flags, opts.jitter_bin)?,
        };
        epochs_full.check(&jitter_flags)?;
        let epoch_ranges = match source.stored_epoch_ranges().filter(|_| use_stored) {
            Some(ranges) => validated_ranges(ranges, &epochs_full)?,
            None => epochs_full.index_ranges()?,
        };
        let epochs = epochs_full.reduce();

        let basis = match stored_basis(source, n, opts.stabilize, use_stored)? {
            Some(basis) => basis,
            None => stabilize(record.design.view(), opts.stabilize)?,
        };
        let g_res = basis.g.as_ref().map(|g| g.t().dot(&record.residuals));

        log::info!(
            "{name}: {n} TOAs, {} epochs ({} retained), rank-{} timing basis",
            epochs_full.n_epochs(),
            epochs.n_epochs(),
            basis.gc.ncols()
        );

        Ok(Pulsar {
            record,
            flag_index,
            jitter_category,
            jitter_flags,
            epochs_full,
            epochs,
            epoch_ranges,
            basis,
            g_res,
            noise,
            fred: None,
            fdm: None,
            ftot: None,
            te: None,
            white: None,
        })
    }

    /// Pulsar identity.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Observing span of the sorted record, in seconds.
    pub fn tspan(&self) -> f64 {
        self.record.tspan()
    }

    /// Build the red-noise Fourier basis and refresh `ftot`.
    ///
    /// `tspan` defaults to this pulsar's span; pass a shared span when
    /// anchoring a multi-pulsar basis.
    pub fn make_fred(&mut self, nmodes: usize, tspan: Option<f64>) -> PsrResult<()> {
        let span = tspan.unwrap_or_else(|| self.tspan());
        self.fred = Some(fourier::fourier_design_red(&self.record.toas, nmodes, span)?);
        self.refresh_ftot();
        Ok(())
    }

    /// Build the DM-noise Fourier basis and refresh `ftot`.
    pub fn make_fdm(&mut self, nmodes: usize, tspan: Option<f64>) -> PsrResult<()> {
        let span = tspan.unwrap_or_else(|| self.tspan());
        self.fdm = Some(fourier::fourier_design_dm(
            &self.record.toas,
            nmodes,
            &self.record.obs_freqs,
            span,
        )?);
        self.refresh_ftot();
        Ok(())
    }

    /// Build both Fourier bases in one call. `nmodes_dm = None` skips the
    /// DM basis, leaving `ftot` equal to the red basis.
    pub fn make_ftot(
        &mut self, nmodes_red: usize, nmodes_dm: Option<usize>, tspan: Option<f64>,
    ) -> PsrResult<()> {
        self.make_fred(nmodes_red, tspan)?;
        if let Some(nmodes) = nmodes_dm {
            self.make_fdm(nmodes, tspan)?;
        } else {
            self.fdm = None;
            self.refresh_ftot();
        }
        Ok(())
    }

    /// Build the extended basis `[gc | ftot]`, building `ftot` first.
    pub fn make_te(
        &mut self, nmodes_red: usize, nmodes_dm: Option<usize>, tspan: Option<f64>,
    ) -> PsrResult<()> {
        self.make_ftot(nmodes_red, nmodes_dm, tspan)?;
        let ftot = self.ftot.as_ref().ok_or(PsrError::InvalidModeCount)?;
        self.te = Some(hstack(&self.basis.gc, ftot));
        Ok(())
    }

    /// Run the two-component whitening projection and cache the result.
    ///
    /// Uses `ftot` (falling back to `fred`) and the complement basis.
    ///
    /// Errors
    /// ------
    /// - `PsrError::DegenerateBasis` when no complement basis was built
    ///   (stabilize with the factorization strategy and `complement`
    ///   enabled) or when no Fourier basis has been built yet.
    pub fn two_component_noise(&mut self) -> PsrResult<&WhitenedData> {
        let g = self.basis.g.as_ref().ok_or_else(|| PsrError::DegenerateBasis {
            reason: "no complement basis; stabilization must request one".to_string(),
        })?;
        let ftot = self
            .ftot
            .as_ref()
            .or(self.fred.as_ref())
            .ok_or_else(|| PsrError::DegenerateBasis {
                reason: "no Fourier basis built before whitening".to_string(),
            })?;
        let white = whiten::two_component_noise(
            g.view(),
            &self.record.toaerrs,
            &self.record.residuals,
            ftot.view(),
        )?;
        Ok(&*self.white.insert(white))
    }

    fn refresh_ftot(&mut self) {
        self.ftot = match (&self.fred, &self.fdm) {
            (Some(fred), Some(fdm)) => Some(hstack(fred, fdm)),
            (Some(fred), None) => Some(fred.clone()),
            (None, _) => None,
        };
    }
}

/// Check stored epoch index ranges against the rebuilt epoch membership.
fn validated_ranges(
    stored: &[(usize, usize)], epochs: &QuantizedEpochs,
) -> PsrResult<Vec<(usize, usize)>> {
    if stored.len() != epochs.n_epochs() {
        return Err(PsrError::QuantizationCheck {
            reason: format!(
                "stored epoch ranges count {} does not match {} epochs",
                stored.len(),
                epochs.n_epochs()
            ),
        });
    }
    for (e, &(start, end)) in stored.iter().enumerate() {
        let members = &epochs.members[e];
        if start != members[0] || end != members[0] + members.len() {
            return Err(PsrError::QuantizationCheck {
                reason: format!(
                    "stored range ({start}, {end}) for epoch {e} disagrees with its membership"
                ),
            });
        }
    }
    Ok(stored.to_vec())
}

/// Assemble a basis from a source's stored factors.
///
/// Only shapes are validated; the factors themselves are trusted, having
/// been produced by an earlier factorization of the same design matrix.
/// `Ok(None)` means the caller should stabilize fresh: stored factors
/// never stand in for the norm-only strategy, whose output is the
/// normalized design rather than an orthonormal basis.
fn stored_basis<S: TimingSource>(
    source: &S, n: usize, method: StabilizeMethod, use_stored: bool,
) -> PsrResult<Option<StabilizedBasis>> {
    let complement = match method {
        StabilizeMethod::Factorize { complement } if use_stored => complement,
        _ => return Ok(None),
    };
    let gc = match source.stored_gc() {
        Some(gc) => gc,
        None => return Ok(None),
    };
    if gc.nrows() != n {
        return Err(PsrError::ShapeMismatch { field: "gc", expected: n, actual: gc.nrows() });
    }
    let g = match (complement, source.stored_g()) {
        (true, Some(g)) => {
            if g.nrows() != n {
                return Err(PsrError::ShapeMismatch { field: "g", expected: n, actual: g.nrows() });
            }
            if gc.ncols() + g.ncols() != n {
                return Err(PsrError::DegenerateBasis {
                    reason: format!(
                        "stored bases span {} + {} columns over {n} TOAs",
                        gc.ncols(),
                        g.ncols()
                    ),
                });
            }
            Some(g.clone())
        }
        // A complement is wanted but was not persisted: factorize fresh.
        (true, None) => return Ok(None),
        (false, _) => None,
    };
    Ok(Some(StabilizedBasis { gc: gc.clone(), g }))
}

/// Column concatenation of two equally-tall matrices.
fn hstack(left: &Array2<f64>, right: &Array2<f64>) -> Array2<f64> {
    let (n, lc) = left.dim();
    let rc = right.ncols();
    let mut out = Array2::<f64>::zeros((n, lc + rc));
    out.slice_mut(s![.., ..lc]).assign(left);
    out.slice_mut(s![.., lc..]).assign(right);
    out
}
