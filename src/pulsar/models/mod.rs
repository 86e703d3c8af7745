//! models — source abstraction, the pulsar container, and batch driving.
//!
//! Purpose
//! -------
//! Put a user-facing API on top of the `core` numerics: a capability trait
//! for where timing data comes from, a [`Pulsar`] container that runs the
//! whole preparation pipeline, and a batch driver for whole-array runs.
//!
//! Key behaviors
//! -------------
//! - [`sources`] defines [`TimingSource`] with two implementations, a live
//!   [`TimingModel`] and a serialized [`ArchiveRecord`] carrying file
//!   provenance and embedded configuration text.
//! - [`pulsar`] orders, indexes, quantizes, calibrates, and stabilizes in
//!   one constructor, then builds Fourier bases and the whitening
//!   projection on demand.
//! - [`batch`] prepares many sources under a skip-or-abort failure policy,
//!   serially or over the rayon pool.
//!
//! Testing notes
//! -------------
//! - The container tests pin the pipeline invariants; the batch tests pin
//!   ordering and policy behavior, including serial/parallel agreement.

pub mod batch;
pub mod pulsar;
pub mod sources;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::batch::{prepare_all, prepare_all_parallel, BatchOutcome, FailurePolicy};
pub use self::pulsar::{PrepOptions, Pulsar};
pub use self::sources::{ArchiveRecord, TimingModel, TimingSource};
