//! chain — MCMC chain tables and run-directory artifacts.
//!
//! Purpose
//! -------
//! Read the flat-text artifacts an MCMC run leaves behind: the sample
//! chain itself (parameter columns plus trailing sampler diagnostics) and
//! the per-run sky-position files, keyed by the run directory's
//! signal-strength tag.
//!
//! Key behaviors
//! -------------
//! - [`table`] parses whitespace-delimited chain files into a dense array
//!   with burn-in trimming and named access to the diagnostic columns.
//! - [`skypos`] parses sky-position tables and resolves which
//!   `PsrPos_SNR_*.txt` file belongs to a run directory.
//! - Errors are centralized in [`errors`] (`ChainError` / `ChainResult`),
//!   wrapping I/O failures alongside format violations.
//!
//! Conventions
//! -----------
//! - Chain rows end with four diagnostic columns; the log-likelihood is
//!   the second-to-last-but-one, matching the sampler's layout.
//!
//! Testing notes
//! -------------
//! - Table tests pin parsing, ragged and short rows, burn-in saturation,
//!   and the diagnostic-column accessors; skypos tests pin the tag
//!   resolution.

pub mod errors;
pub mod skypos;
pub mod table;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{ChainError, ChainResult};
pub use self::skypos::{
    parse_sky_positions, read_sky_positions, sky_position_file, snr_tag, SkyPosition,
};
pub use self::table::{ChainTable, N_DIAGNOSTIC_COLUMNS};
