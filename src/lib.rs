//! pta_timing — pulsar-timing-array data preparation and chain post-processing.
//!
//! Purpose
//! -------
//! Serve as the crate root for the offline side of a pulsar-timing-array
//! analysis: preparing per-pulsar timing data for sampling (TOA ordering,
//! flag indexing, epoch quantization, design-matrix stabilization, Fourier
//! noise bases, two-component whitening) and reading back the artifacts an
//! MCMC run produces (chain tables and sky-position files).
//!
//! Key behaviors
//! -------------
//! - Expose the per-pulsar preparation stack under [`pulsar`], with the
//!   [`pulsar::Pulsar`] container as the main entry point.
//! - Expose noise-parameter storage and both configuration-file grammars
//!   under [`noise`].
//! - Expose chain-file and sky-position readers under [`chain`].
//! - Keep `ndarray`/`nalgebra` conversion helpers in [`utils`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Times and uncertainties are in seconds, observing frequencies in MHz,
//!   sky positions in degrees; containers validate alignment on
//!   construction rather than at use sites.
//!
//! Conventions
//! -----------
//! - Errors are hand-written enums per stack (`PsrError`, `NoiseError`,
//!   `ChainError`) with `Result` aliases; fallible functions propagate with
//!   `?` and never panic on malformed data.
//! - Progress and fallback decisions are reported through the `log` facade;
//!   the binary or test harness chooses the logger.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each module; `tests/integration_pipeline.rs`
//!   drives realistic multi-year cadences end to end.

pub mod chain;
pub mod noise;
pub mod pulsar;
pub mod utils;
