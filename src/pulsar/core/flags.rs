//! System-flag indexer: partition TOA indices by observing-system flag.
//!
//! Purpose
//! -------
//! Build and query the mapping from flag *category* (observing system group,
//! backend, frequency band, ...) to flag *value* to the set of TOA indices
//! carrying that value. The index drives epoch quantization (same-flag TOAs
//! can share a jitter epoch) and per-system noise-parameter application.
//!
//! Key behaviors
//! -------------
//! - [`FlagIndex::build`] validates per-category flag arrays against the TOA
//!   count and buckets indices by value.
//! - When no informative category exists at all, a single fallback bucket
//!   covering every index is synthesized under the pulsar's own name, so the
//!   "one overall system" case needs no special handling downstream.
//! - [`FlagIndex::category`] distinguishes *absent* (an error, recoverable by
//!   falling back to an alternate category) from *present but empty* (an
//!   empty bucket map), so callers never have to guess which case occurred.
//!
//! Invariants & assumptions
//! ------------------------
//! - For every non-empty category, each TOA index appears in exactly one
//!   value bucket (guaranteed by construction: buckets are computed from a
//!   single per-TOA value array).
//! - Bucket index lists are ascending.
//! - Flag values are opaque strings; no normalization is applied.
//!
//! Conventions
//! -----------
//! - The conventional PTA categories are listed in
//!   [`SYSTEM_FLAG_CATEGORIES`]; callers typically try `"group"` first and
//!   fall back to `"f"` (frequency band) for jitter grouping.
//! - Categories and values iterate in sorted order (deterministic across
//!   runs).
//!
//! Testing notes
//! -------------
//! - Unit tests cover bucket construction, the exactly-one-bucket partition
//!   property, length validation, absent-category errors, the
//!   present-but-empty distinction, and fallback-bucket synthesis.
use crate::pulsar::errors::{PsrError, PsrResult};
use std::collections::BTreeMap;

/// Flag categories conventionally carried by PTA timing data, in fallback
/// preference order for jitter grouping.
pub const SYSTEM_FLAG_CATEGORIES: [&str; 4] = ["group", "sys", "i", "f"];

/// Per-pulsar system-flag index: category -> value -> ascending TOA indices.
///
/// Also retains the raw per-TOA value array for each category so ordering and
/// quantization can consume flags in TOA order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagIndex {
    n_toas: usize,
    per_toa: BTreeMap<String, Vec<String>>,
    buckets: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
}

impl FlagIndex {
    /// Build the index from per-category flag-value arrays.
    ///
    /// Parameters
    /// ----------
    /// - `name`: pulsar identity, used for the synthesized fallback bucket.
    /// - `n_toas`: number of TOAs every category must align with.
    /// - `categories`: map from category name to per-TOA flag values. An
    ///   **empty** value array records the category as present-but-empty
    ///   (no buckets) rather than misaligned.
    ///
    /// Errors
    /// ------
    /// - `PsrError::FlagLengthMismatch` when a non-empty value array
    ///   disagrees in length with `n_toas`.
    ///
    /// Notes
    /// -----
    /// - If every category is absent or empty, a single catch-all bucket
    ///   named after the pulsar is synthesized so that every TOA still
    ///   belongs to exactly one system.
    pub fn build(
        name: &str, n_toas: usize, categories: &BTreeMap<String, Vec<String>>,
    ) -> PsrResult<Self> {
        let mut per_toa = BTreeMap::new();
        let mut buckets: BTreeMap<String, BTreeMap<String, Vec<usize>>> = BTreeMap::new();
        for (category, values) in categories {
            if values.is_empty() {
                buckets.insert(category.clone(), BTreeMap::new());
                continue;
            }
            if values.len() != n_toas {
                return Err(PsrError::FlagLengthMismatch { flags: values.len(), toas: n_toas });
            }
            let mut by_value: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for (idx, value) in values.iter().enumerate() {
                by_value.entry(value.clone()).or_default().push(idx);
            }
            per_toa.insert(category.clone(), values.clone());
            buckets.insert(category.clone(), by_value);
        }

        let informative = buckets.values().any(|b| !b.is_empty());
        if !informative {
            let mut by_value = BTreeMap::new();
            by_value.insert(name.to_string(), (0..n_toas).collect());
            per_toa.insert(name.to_string(), vec![name.to_string(); n_toas]);
            buckets.insert(name.to_string(), by_value);
        }

        Ok(FlagIndex { n_toas, per_toa, buckets })
    }

    /// Number of TOAs the index was built against.
    pub fn n_toas(&self) -> usize {
        self.n_toas
    }

    /// Category names currently held by the index, in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Value -> index buckets for `category`.
    ///
    /// Errors
    /// ------
    /// - `PsrError::MissingFlag` when the category is absent. A category that
    ///   is present but empty returns an empty map instead; the two cases are
    ///   deliberately observable.
    pub fn category(&self, category: &str) -> PsrResult<&BTreeMap<String, Vec<usize>>> {
        self.buckets
            .get(category)
            .ok_or_else(|| PsrError::MissingFlag { category: category.to_string() })
    }

    /// Per-TOA flag values for `category`, aligned with the TOA arrays.
    ///
    /// Errors
    /// ------
    /// - `PsrError::MissingFlag` when the category is absent.
    /// - `PsrError::FlagLengthMismatch` when the category is present but
    ///   empty while the record has TOAs (no per-TOA values to hand out).
    pub fn per_toa_values(&self, category: &str) -> PsrResult<&[String]> {
        if !self.buckets.contains_key(category) {
            return Err(PsrError::MissingFlag { category: category.to_string() });
        }
        match self.per_toa.get(category) {
            Some(values) => Ok(values.as_slice()),
            None => Err(PsrError::FlagLengthMismatch { flags: 0, toas: self.n_toas }),
        }
    }

    /// The name of the synthesized or first available category holding a
    /// full partition, searching `preference` in order and falling back to
    /// any remaining category.
    ///
    /// Errors
    /// ------
    /// - `PsrError::MissingFlag` naming the last preference when no category
    ///   holds a full partition (cannot happen for a built index with
    ///   `n_toas > 0`, since a fallback bucket is synthesized).
    pub fn first_available(&self, preference: &[&str]) -> PsrResult<&str> {
        for &cat in preference {
            if let Some((key, _)) = self.per_toa.get_key_value(cat) {
                return Ok(key.as_str());
            }
        }
        self.per_toa
            .keys()
            .next()
            .map(String::as_str)
            .ok_or_else(|| PsrError::MissingFlag {
                category: preference.last().unwrap_or(&"group").to_string(),
            })
    }
}
