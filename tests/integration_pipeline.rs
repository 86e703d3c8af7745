//! Integration tests for the pulsar preparation pipeline and run artifacts.
//!
//! Purpose
//! -------
//! - Validate the end-to-end preparation path: from a raw timing source,
//!   through jitter-extended ordering, quantization, calibration, and
//!   stabilization, to Fourier bases and the two-component whitening
//!   projection.
//! - Exercise realistic observing cadences (multi-year spans, repeated
//!   observing days, several backends) rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `pulsar::models::pulsar::Pulsar`:
//!   - Full construction over a decade-long cadence, epoch reduction
//!     behavior, and the whitening projection's diagonalization property.
//! - `pulsar::models::batch`:
//!   - Whole-array preparation under the skip policy.
//! - `noise`:
//!   - Archive-embedded noise text driving uncertainty calibration, and
//!     the documented red-noise defaults when no configuration mentions
//!     red noise.
//! - `chain`:
//!   - Chain-table parsing with diagnostic columns and burn-in, and
//!     sky-position file resolution from a run-directory tag.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of the numerical building blocks (ordering,
//!   quantization, stabilization, whitening) — these are covered by unit
//!   tests beside each module.
//! - Exhaustive grids over mode counts and bin widths — those belong in
//!   targeted property tests.
use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use pta_timing::chain::{sky_position_file, ChainTable};
use pta_timing::noise::{DEFAULT_RED_AMP, DEFAULT_RED_INDEX};
use pta_timing::pulsar::prelude::*;

const DAY: f64 = 86_400.0;
const YEAR: f64 = 365.25 * DAY;

/// Purpose
/// -------
/// Build a live timing source with a realistic cadence: `n` TOAs spread
/// evenly over `span_years`, two alternating backends, and a three-column
/// timing model (offset, spin, spin-down).
///
/// Returns
/// -------
/// - A `TimingModel` whose arrays are deliberately unsorted-friendly:
///   callers may perturb TOAs before handing it to the container.
fn cadence_source(name: &str, n: usize, span_years: f64) -> TimingModel {
    let span = span_years * YEAR;
    let toas = Array1::from_iter((0..n).map(|i| i as f64 * span / n as f64));
    let mut design = Array2::<f64>::zeros((n, 3));
    for i in 0..n {
        let t = toas[i] / span;
        design[[i, 0]] = 1.0;
        design[[i, 1]] = t;
        design[[i, 2]] = t * t;
    }
    let backends: Vec<String> = (0..n)
        .map(|i| if i % 2 == 0 { "GUPPI".to_string() } else { "PUPPI".to_string() })
        .collect();
    TimingModel {
        name: name.to_string(),
        ra_deg: 69.3,
        dec_deg: -47.2,
        toas,
        toaerrs: Array1::from_iter((0..n).map(|i| 1e-6 * (1.0 + 0.1 * (i % 5) as f64))),
        residuals: Array1::from_iter((0..n).map(|i| 1e-7 * (i as f64 * 0.7).sin())),
        obs_freqs: Array1::from_iter(
            (0..n).map(|i| if i % 2 == 0 { 1400.0 } else { 820.0 }),
        ),
        design,
        flags: [("f".to_string(), backends)].into_iter().collect(),
    }
}

fn no_rescale() -> PrepOptions {
    PrepOptions {
        rescale_errors: false,
        ..PrepOptions::default()
    }
}

#[test]
// Purpose
// -------
// A decade of isolated observations quantizes into one singleton epoch per
// TOA, and reduction drops them all.
//
// Given
// -----
// 100 TOAs over 10 years, a 10 s bin width.
//
// Expect
// ------
// 100 full epochs, zero retained after reduction, and epoch ranges that
// tile [0, 100).
fn sparse_cadence_reduces_to_no_jitter_epochs() {
    // Arrange
    let source = cadence_source("J0437-4715", 100, 10.0);

    // Act
    let psr = Pulsar::from_source(&source, &no_rescale()).unwrap();

    // Assert
    assert_eq!(psr.epochs_full.n_epochs(), 100);
    assert_eq!(psr.epochs.n_epochs(), 0);
    assert_eq!(psr.epoch_ranges.first(), Some(&(0, 1)));
    assert_eq!(psr.epoch_ranges.last(), Some(&(99, 100)));
    let covered: usize = psr.epoch_ranges.iter().map(|&(s, e)| e - s).sum();
    assert_eq!(covered, 100);
}

#[test]
// Purpose
// -------
// A repeated observing timestamp on the same backend merges into one epoch
// that survives reduction, while the container re-sorts the perturbed
// input.
//
// Given
// -----
// 20 TOAs with one pair forced onto the same second and backend, handed
// over in scrambled time order.
//
// Expect
// ------
// A sorted record, 19 full epochs, exactly one retained epoch of size 2,
// and an incidence matrix of shape (20, 1).
fn repeated_timestamp_forms_a_retained_epoch() {
    // Arrange
    let mut source = cadence_source("J1909-3744", 20, 2.0);
    source.toas[7] = source.toas[6] + 3.0;
    source.flags.get_mut("f").unwrap()[7] = "GUPPI".to_string();
    // Scramble the input order; the permutation must carry flags along.
    source.toas.swap(0, 13);
    source.toaerrs.swap(0, 13);
    source.residuals.swap(0, 13);
    source.obs_freqs.swap(0, 13);
    for j in 0..3 {
        let tmp = source.design[[0, j]];
        source.design[[0, j]] = source.design[[13, j]];
        source.design[[13, j]] = tmp;
    }
    let flags = source.flags.get_mut("f").unwrap();
    flags.swap(0, 13);

    // Act
    let psr = Pulsar::from_source(&source, &no_rescale()).unwrap();

    // Assert
    assert!(psr.record.is_time_sorted());
    assert_eq!(psr.epochs_full.n_epochs(), 19);
    assert_eq!(psr.epochs.n_epochs(), 1);
    assert_eq!(psr.epochs.members[0].len(), 2);
    assert_eq!(psr.epochs.u.dim(), (20, 1));
    assert_eq!(psr.epochs.flags[0], "GUPPI");
}

#[test]
// Purpose
// -------
// The whitening projection diagonalizes the white-noise covariance in the
// complement space: P diag(σ²) Pᵀ has the reported levels on its diagonal.
//
// Given
// -----
// 40 TOAs over 3 years with heteroscedastic uncertainties, projecting the
// identity so the raw projector comes back.
//
// Expect
// ------
// Recovering diag_white from the projected identity basis, within
// numerical tolerance.
fn whitening_diagonalizes_the_white_covariance() {
    // Arrange
    let n = 40;
    let source = cadence_source("J1713+0747", n, 3.0);
    let psr = Pulsar::from_source(&source, &no_rescale()).unwrap();

    // Pass the identity as the basis so ftot_prime is the raw projector.
    let eye = Array2::<f64>::eye(n);
    let white = pta_timing::pulsar::core::two_component_noise(
        psr.basis.g.as_ref().unwrap().view(),
        &psr.record.toaerrs,
        &psr.record.residuals,
        eye.view(),
    )
    .unwrap();

    // Act
    let proj = &white.ftot_prime;
    let sigma2 = psr.record.toaerrs.mapv(|s| s * s);
    let weighted = proj * &sigma2; // row-wise scale by broadcasting
    let cov = weighted.dot(&proj.t());

    // Assert
    for (i, &level) in white.diag_white.iter().enumerate() {
        assert_relative_eq!(cov[[i, i]], level, max_relative = 1e-8);
        for j in 0..white.diag_white.len() {
            if i != j {
                assert_relative_eq!(cov[[i, j]], 0.0, epsilon = 1e-18);
            }
        }
    }
}

#[test]
// Purpose
// -------
// An archive with embedded configuration but no red-noise tags falls back
// to the documented defaults, while white-noise tags calibrate the
// uncertainties.
fn archive_defaults_and_calibration() {
    // Arrange
    let live = cadence_source("J1600-3053", 12, 1.0);
    let source = ArchiveRecord {
        name: live.name.clone(),
        ra_deg: live.ra_deg,
        dec_deg: live.dec_deg,
        toas: live.toas.clone(),
        toaerrs: Array1::from_elem(12, 1e-6),
        residuals: live.residuals.clone(),
        obs_freqs: live.obs_freqs.clone(),
        design: live.design.clone(),
        flags: live.flags.clone(),
        parfile_path: "J1600-3053.par".into(),
        timfile_path: "J1600-3053.tim".into(),
        noisefile_path: Some("noisefiles/J1600-3053_noise.txt".into()),
        g: None,
        gc: None,
        umat: None,
        epoch_ranges: None,
        par_text: String::new(),
        noise_text: Some(
            "efac-GUPPI 1.5\nequad-GUPPI -7.0\nefac-PUPPI 1.0\nequad-PUPPI -30.0\n".into(),
        ),
    };

    // Act
    let psr = Pulsar::from_source(&source, &PrepOptions::default()).unwrap();

    // Assert
    let noise = psr.noise.as_ref().unwrap();
    assert_relative_eq!(noise.red_amp, DEFAULT_RED_AMP);
    assert_relative_eq!(noise.red_index, DEFAULT_RED_INDEX);
    let expected_guppi = ((1.5e-6_f64).powi(2) + (1e-7_f64).powi(2)).sqrt();
    let buckets = psr.flag_index.category("f").unwrap().clone();
    for &i in &buckets["GUPPI"] {
        assert_relative_eq!(psr.record.toaerrs[i], expected_guppi, max_relative = 1e-12);
    }
    for &i in &buckets["PUPPI"] {
        assert_relative_eq!(psr.record.toaerrs[i], 1e-6, max_relative = 1e-12);
    }
}

#[test]
// Purpose
// -------
// A whole-array run under the skip policy prepares the healthy pulsars
// and names the broken one.
fn array_preparation_skips_broken_sources() {
    // Arrange
    let mut broken = cadence_source("J0613-0200", 15, 2.0);
    broken.design = Array2::<f64>::zeros((15, 3)); // degenerate timing model
    let sources = vec![
        cadence_source("J0437-4715", 30, 5.0),
        broken,
        cadence_source("J1909-3744", 25, 4.0),
    ];

    // Act
    let outcome = prepare_all(&sources, &no_rescale(), FailurePolicy::Skip).unwrap();

    // Assert
    assert_eq!(outcome.pulsars.len(), 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].0, "J0613-0200");
    assert!(matches!(outcome.skipped[0].1, PsrError::DegenerateBasis { .. }));
}

#[test]
// Purpose
// -------
// Chain artifacts round out the run: the table exposes parameters,
// diagnostics, and burn-in, and the sky-position file name follows the
// run directory's signal-strength tag.
fn chain_artifacts_read_back() {
    // Arrange
    let text = "\
# p0 p1 lnpost lnlike accept swap
0.10 1.0 -12.0 -10.0 0.5 0.0
0.20 2.0 -11.0 -9.5 0.5 0.0
0.30 3.0 -10.0 -9.0 0.6 1.0
0.40 4.0 -9.0 -8.5 0.6 0.0
";

    // Act
    let table = ChainTable::parse_str(text).unwrap();

    // Assert
    assert_eq!(table.n_samples(), 4);
    assert_eq!(table.n_params(), 2);
    assert_relative_eq!(table.log_likelihood()[2], -9.0);
    assert_relative_eq!(table.log_posterior()[0], -12.0);
    assert_eq!(table.burned(2).nrows(), 2);
    assert_eq!(
        sky_position_file("chains/nanograv_gwb_90pct_run3").as_deref(),
        Some("PsrPos_SNR_90pct.txt")
    );
}
