//! Errors for the per-pulsar data-preparation pipeline (flag indexing,
//! quantization, basis construction, and noise projection).
//!
//! This module defines the pipeline error type, [`PsrError`], used across the
//! ordering, quantization, stabilization, Fourier, and whitening stages, along
//! with the crate-wide result alias [`PsrResult`].
//!
//! ## Conventions
//! - **Indices are 0-based** and always refer to positions in the *sorted*
//!   TOA arrays unless stated otherwise.
//! - A [`PsrError::ShapeMismatch`] is fatal: aligned per-TOA arrays that
//!   disagree in length indicate upstream corruption and are never silently
//!   truncated.
//! - A [`PsrError::MissingFlag`] is recoverable: callers fall back to an
//!   alternate flag category before giving up.
//! - A [`PsrError::DegenerateBasis`] is fatal for the affected pulsar but not
//!   for a batch run; the batch driver decides whether to skip or abort.
use crate::noise::errors::NoiseError;

/// Crate-wide result alias for pipeline operations that may produce
/// [`PsrError`].
pub type PsrResult<T> = Result<T, PsrError>;

/// Unified error type for per-pulsar data preparation.
///
/// Covers flag-index lookups, aligned-array consistency, quantization
/// self-checks, basis factorization failures, and Fourier-basis input
/// validation. Implements `Display`/`Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum PsrError {
    // ---- Flag indexing ----
    /// The requested flag category is absent from the record. Recoverable:
    /// callers should try the fallback category before failing.
    MissingFlag { category: String },

    /// A per-TOA flag array disagrees in length with the TOA array.
    FlagLengthMismatch { flags: usize, toas: usize },

    // ---- Aligned-array consistency ----
    /// Aligned per-TOA arrays disagree in length. Fatal: indicates upstream
    /// corruption and must never be silently truncated.
    ShapeMismatch { field: &'static str, expected: usize, actual: usize },

    /// A permutation does not index the record bijectively.
    InvalidPermutation { len: usize, expected: usize },

    // ---- Quantization ----
    /// The post-sort self-check failed: TOAs out of order or an epoch that is
    /// internally inconsistent.
    QuantizationCheck { reason: String },

    // ---- Basis construction ----
    /// Cholesky or eigendecomposition failed on the noise sandwich, or the
    /// design matrix produced a degenerate basis. Fatal per-pulsar.
    DegenerateBasis { reason: String },

    /// Fourier basis requested over a non-positive or non-finite span.
    InvalidSpan { tspan: f64 },

    /// Fourier basis requested with zero modes.
    InvalidModeCount,

    /// A per-TOA value that must be finite and strictly positive is not
    /// (e.g. an observing frequency fed to the DM basis).
    NonFiniteValue { field: &'static str, index: usize, value: f64 },

    // ---- Record construction ----
    /// Record constructed with no TOAs.
    EmptyRecord,

    // ---- Noise configuration (container boundary) ----
    /// Wrapper for noise-configuration failures surfaced while populating a
    /// pulsar from an archive.
    Noise(NoiseError),
}

impl std::error::Error for PsrError {}

impl std::fmt::Display for PsrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Flag indexing ----
            PsrError::MissingFlag { category } => {
                write!(f, "Flag category '{category}' is absent from the record.")
            }
            PsrError::FlagLengthMismatch { flags, toas } => {
                write!(f, "Flag array length ({flags}) does not match TOA count ({toas}).")
            }
            // ---- Aligned-array consistency ----
            PsrError::ShapeMismatch { field, expected, actual } => {
                write!(
                    f,
                    "Aligned array '{field}' has length {actual}, expected {expected}; \
                     refusing to truncate."
                )
            }
            PsrError::InvalidPermutation { len, expected } => {
                write!(
                    f,
                    "Permutation of length {len} is not a bijection on {expected} TOA indices."
                )
            }
            // ---- Quantization ----
            PsrError::QuantizationCheck { reason } => {
                write!(f, "Quantization self-check failed: {reason}")
            }
            // ---- Basis construction ----
            PsrError::DegenerateBasis { reason } => {
                write!(f, "Degenerate basis: {reason}")
            }
            PsrError::InvalidSpan { tspan } => {
                write!(f, "Fourier span must be finite and > 0; got: {tspan}")
            }
            PsrError::InvalidModeCount => {
                write!(f, "Fourier mode count must be >= 1.")
            }
            PsrError::NonFiniteValue { field, index, value } => {
                write!(
                    f,
                    "Value in '{field}' at index {index} must be finite and > 0; got: {value}"
                )
            }
            // ---- Record construction ----
            PsrError::EmptyRecord => {
                write!(f, "Pulsar record has no TOAs.")
            }
            // ---- Noise configuration ----
            PsrError::Noise(err) => {
                write!(f, "Noise configuration error: {err}")
            }
        }
    }
}

impl From<NoiseError> for PsrError {
    fn from(err: NoiseError) -> Self {
        PsrError::Noise(err)
    }
}
