//! pulsar — per-pulsar timing-data preparation stack.
//!
//! Purpose
//! -------
//! Bundle the numerical core, the data-source and container models, and the
//! shared error types for preparing pulsar-timing data: TOA ordering and
//! flag indexing, epoch quantization, design-matrix stabilization, Fourier
//! noise bases, and the two-component whitening projection. This is the
//! surface array-analysis drivers should depend on.
//!
//! Key behaviors
//! -------------
//! - Collect the numerical building blocks in [`core`]: the validated TOA
//!   record, flag index, jitter-extended ordering, quantization, basis
//!   stabilization, Fourier designs, and whitening.
//! - Expose the user-facing API in [`models`]: the [`TimingSource`] seam,
//!   the [`Pulsar`] container, preparation options, and the batch driver.
//! - Centralize preparation errors in [`errors`] (`PsrError` and the
//!   `PsrResult` alias) so callers see one error surface for the stack.
//! - Re-export the everyday types directly and via [`prelude`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`Pulsar`] holds time-sorted, self-checked data; every
//!   per-TOA array and flag category refers to the same order.
//! - Epoch membership means same flag value and times within the
//!   configured bin width, everywhere in the stack.
//!
//! Conventions
//! -----------
//! - Times and uncertainties are in seconds, observing frequencies in MHz,
//!   sky positions in degrees.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule; the end-to-end pipeline over
//!   realistic cadences is exercised in the integration suite.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------
//
// The everyday types. Lower-level routines (ordering, quantization,
// stabilization, whitening) remain importable from `core`.

pub use self::core::{
    FlagIndex, QuantizedEpochs, StabilizeMethod, StabilizedBasis, ToaRecord, WhitenedData,
};

pub use self::errors::{PsrError, PsrResult};

pub use self::models::{
    ArchiveRecord, BatchOutcome, FailurePolicy, PrepOptions, Pulsar, TimingModel, TimingSource,
    prepare_all, prepare_all_parallel,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::{
        ArchiveRecord, BatchOutcome, FailurePolicy, FlagIndex, PrepOptions, PsrError, PsrResult,
        Pulsar, QuantizedEpochs, StabilizeMethod, StabilizedBasis, TimingModel, TimingSource,
        ToaRecord, WhitenedData, prepare_all, prepare_all_parallel,
    };
}
