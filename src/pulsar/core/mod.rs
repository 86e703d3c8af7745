//! core — per-pulsar numerical building blocks.
//!
//! Purpose
//! -------
//! Collect the pieces the preparation pipeline is assembled from: the
//! validated TOA record, the system-flag index, jitter-extended ordering,
//! epoch quantization, design-matrix stabilization, Fourier noise bases,
//! and the two-component whitening projection. Everything here operates on
//! one pulsar's arrays and knows nothing about sources, files, or batches.
//!
//! Key behaviors
//! -------------
//! - [`record`] carries the aligned per-TOA arrays and permutes them
//!   atomically.
//! - [`flags`] partitions TOAs by observing system and synthesizes a
//!   catch-all when the data carry no informative flags.
//! - [`ordering`] and [`quantize`] share one epoch convention: same flag
//!   value, times within the configured bin width.
//! - [`stabilize`] turns the raw design matrix into an orthonormal (or
//!   column-normalized) basis; [`whiten`] projects residuals and Fourier
//!   bases into the complement space under per-TOA uncertainties.
//!
//! Invariants & assumptions
//! ------------------------
//! - Quantization and index-range extraction assume the jitter-extended
//!   sorted order produced by [`ordering::argsort_by_epoch`]; the
//!   self-checks catch violations instead of silently mis-grouping.
//!
//! Downstream usage
//! ----------------
//! - `models::pulsar` drives these pieces in order; external callers
//!   normally go through the container rather than calling them directly.
//!
//! Testing notes
//! -------------
//! - Each submodule carries its own unit tests; cross-module behavior is
//!   exercised by the container tests and the integration suite.

pub mod flags;
pub mod fourier;
pub mod ordering;
pub mod quantize;
pub mod record;
pub mod stabilize;
pub mod whiten;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::flags::{FlagIndex, SYSTEM_FLAG_CATEGORIES};
pub use self::fourier::{fourier_design_dm, fourier_design_red, DM_K};
pub use self::ordering::{argsort_by_epoch, check_ordering};
pub use self::quantize::{quantize, QuantizedEpochs};
pub use self::record::ToaRecord;
pub use self::stabilize::{stabilize, StabilizeMethod, StabilizedBasis, EIGEN_EPS};
pub use self::whiten::{two_component_noise, WhitenedData};
