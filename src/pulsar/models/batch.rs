//! Array-wide preparation driver.
//!
//! Purpose
//! -------
//! Prepare every pulsar of an array in one call, with a configurable
//! policy for sources that fail preparation and an optional parallel path
//! for large arrays.
//!
//! Key behaviors
//! -------------
//! - [`FailurePolicy::Skip`] logs each failure with the pulsar's identity
//!   and keeps going; the outcome carries the skipped names and errors.
//! - [`FailurePolicy::Abort`] returns the first failure in source order.
//! - [`prepare_all_parallel`] runs the same pipeline over a rayon pool;
//!   results come back in source order either way.
//!
//! Testing notes
//! -------------
//! - Tests drive a mixed batch of valid and malformed sources through both
//!   policies and check that the parallel path agrees with the serial one.
use crate::pulsar::errors::{PsrError, PsrResult};
use crate::pulsar::models::pulsar::{PrepOptions, Pulsar};
use crate::pulsar::models::sources::TimingSource;
use rayon::prelude::*;

/// What to do when one source fails preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and drop the failing pulsar, keep the rest.
    Skip,
    /// Fail the whole batch on the first error.
    Abort,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Prepared pulsars, in source order.
    pub pulsars: Vec<Pulsar>,
    /// Sources skipped under [`FailurePolicy::Skip`], with their errors.
    pub skipped: Vec<(String, PsrError)>,
}

/// Prepare every source serially.
///
/// Errors
/// ------
/// - Under [`FailurePolicy::Abort`], the first preparation error.
pub fn prepare_all<S: TimingSource>(
    sources: &[S], opts: &PrepOptions, policy: FailurePolicy,
) -> PsrResult<BatchOutcome> {
    let results: Vec<(String, PsrResult<Pulsar>)> = sources
        .iter()
        .map(|s| (s.name().to_string(), Pulsar::from_source(s, opts)))
        .collect();
    collect_outcome(results, policy)
}

/// Prepare every source over the rayon thread pool.
///
/// Errors
/// ------
/// - Under [`FailurePolicy::Abort`], the first preparation error in
///   source order (not completion order).
pub fn prepare_all_parallel<S: TimingSource + Sync>(
    sources: &[S], opts: &PrepOptions, policy: FailurePolicy,
) -> PsrResult<BatchOutcome> {
    let results: Vec<(String, PsrResult<Pulsar>)> = sources
        .par_iter()
        .map(|s| (s.name().to_string(), Pulsar::from_source(s, opts)))
        .collect();
    collect_outcome(results, policy)
}

fn collect_outcome(
    results: Vec<(String, PsrResult<Pulsar>)>, policy: FailurePolicy,
) -> PsrResult<BatchOutcome> {
    let mut pulsars = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (name, result) in results {
        match result {
            Ok(psr) => pulsars.push(psr),
            Err(err) => match policy {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Skip => {
                    log::warn!("{name}: preparation failed, skipping ({err})");
                    skipped.push((name, err));
                }
            },
        }
    }
    Ok(BatchOutcome { pulsars, skipped })
}
