//! noise — calibrated noise parameters and their file grammars.
//!
//! Purpose
//! -------
//! Hold per-system white-noise calibration (EFAC, EQUAD, ECORR) and
//! power-law red-noise parameters for one pulsar, and parse them out of the
//! two text grammars they arrive in: timing-model parameter files and
//! dedicated noise files.
//!
//! Key behaviors
//! -------------
//! - [`params`] defines [`NoiseParams`] with documented red-noise defaults
//!   and the EFAC/EQUAD uncertainty rescale.
//! - [`parser`] reads both grammars, converting microsecond and log10
//!   conventions to linear seconds on the way in.
//! - Errors are centralized in [`errors`] (`NoiseError` / `NoiseResult`).
//!
//! Conventions
//! -----------
//! - EQUAD and ECORR are stored in seconds regardless of the source
//!   grammar's units.
//!
//! Testing notes
//! -------------
//! - Parser tests pin both grammars, including tags that embed the keyword
//!   without matching it; params tests pin the rescale formula and the
//!   missing-system rejection.

pub mod errors;
pub mod params;
pub mod parser;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{NoiseError, NoiseResult};
pub use self::params::{NoiseParams, DEFAULT_RED_AMP, DEFAULT_RED_INDEX};
pub use self::parser::{parse_noise_file, parse_par_file};
