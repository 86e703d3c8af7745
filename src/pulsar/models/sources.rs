//! Data sources a pulsar container can be populated from.
//!
//! Purpose
//! -------
//! The container's basis-construction logic is identical no matter where the
//! raw timing data came from; only the *population step* differs. This
//! module defines that seam: the [`TimingSource`] capability trait (TOAs,
//! residuals, uncertainties, frequencies, design matrix, flag categories,
//! and optionally embedded configuration text), and its two concrete
//! implementations — a live timing-model object and a serialized archive
//! record.
//!
//! Key behaviors
//! -------------
//! - [`TimingSource::record`] snapshots the per-TOA arrays into a validated
//!   [`ToaRecord`]; sources never hand out partially aligned data.
//! - [`ArchiveRecord`] additionally carries file-path provenance, optional
//!   precomputed bases/quantization from a previous run, and the raw text
//!   of the parameter and noise configuration files for noise-parameter
//!   reconstruction.
//! - Configuration-text and stored-data accessors default to `None`, so
//!   live sources need no stub implementations; the container recomputes
//!   whatever a source does not persist.
//!
//! Conventions
//! -----------
//! - Flag categories map category name to per-TOA value arrays in the
//!   source's *unsorted* TOA order; the container permutes them together
//!   with the record.
//!
//! Testing notes
//! -------------
//! - The record snapshot is exercised through the container tests in
//!   `models::pulsar`; a unit test here pins the trait defaults.
use crate::pulsar::core::record::ToaRecord;
use crate::pulsar::errors::PsrResult;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Capability set a pulsar container needs from a data source.
pub trait TimingSource {
    /// Pulsar identity, available even when `record` fails (batch drivers
    /// log it).
    fn name(&self) -> &str;

    /// Snapshot the aligned per-TOA arrays and design matrix into a
    /// validated record.
    fn record(&self) -> PsrResult<ToaRecord>;

    /// Flag categories in unsorted TOA order.
    fn flag_categories(&self) -> &BTreeMap<String, Vec<String>>;

    /// Raw timing-model parameter-file text, when the source carries it.
    fn par_text(&self) -> Option<&str> {
        None
    }

    /// Raw noise-configuration text, when the source carries it.
    fn noise_text(&self) -> Option<&str> {
        None
    }

    /// Stored column-space basis from a previous preparation, when the
    /// source persists one.
    fn stored_gc(&self) -> Option<&Array2<f64>> {
        None
    }

    /// Stored orthogonal-complement basis from a previous preparation.
    fn stored_g(&self) -> Option<&Array2<f64>> {
        None
    }

    /// Stored quantization incidence matrix from a previous preparation.
    fn stored_umat(&self) -> Option<&Array2<f64>> {
        None
    }

    /// Stored `[start, end)` epoch index ranges from a previous
    /// preparation.
    fn stored_epoch_ranges(&self) -> Option<&[(usize, usize)]> {
        None
    }
}

/// A live timing-model object: arrays straight out of the timing fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingModel {
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub toas: Array1<f64>,
    pub toaerrs: Array1<f64>,
    pub residuals: Array1<f64>,
    pub obs_freqs: Array1<f64>,
    pub design: Array2<f64>,
    pub flags: BTreeMap<String, Vec<String>>,
}

impl TimingSource for TimingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> PsrResult<ToaRecord> {
        ToaRecord::new(
            self.name.clone(),
            self.ra_deg,
            self.dec_deg,
            self.toas.clone(),
            self.toaerrs.clone(),
            self.residuals.clone(),
            self.obs_freqs.clone(),
            self.design.clone(),
        )
    }

    fn flag_categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.flags
    }
}

/// A serialized per-pulsar archive record: the same arrays plus provenance
/// paths, optional precomputed derived data, and embedded configuration
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub toas: Array1<f64>,
    pub toaerrs: Array1<f64>,
    pub residuals: Array1<f64>,
    pub obs_freqs: Array1<f64>,
    pub design: Array2<f64>,
    pub flags: BTreeMap<String, Vec<String>>,

    /// Path of the timing-model parameter file this record was built from.
    pub parfile_path: String,
    /// Path of the observation (TOA) file.
    pub timfile_path: String,
    /// Path of the noise-configuration file, when one exists.
    pub noisefile_path: Option<String>,

    /// Precomputed complement basis from a previous run, if stored.
    pub g: Option<Array2<f64>>,
    /// Precomputed column-space basis from a previous run, if stored.
    pub gc: Option<Array2<f64>>,
    /// Precomputed quantization incidence matrix, if stored.
    pub umat: Option<Array2<f64>>,
    /// Precomputed `[start, end)` epoch index ranges, if stored.
    pub epoch_ranges: Option<Vec<(usize, usize)>>,

    /// Raw parameter-file text.
    pub par_text: String,
    /// Raw noise-file text, when a noise file exists.
    pub noise_text: Option<String>,
}

impl TimingSource for ArchiveRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> PsrResult<ToaRecord> {
        ToaRecord::new(
            self.name.clone(),
            self.ra_deg,
            self.dec_deg,
            self.toas.clone(),
            self.toaerrs.clone(),
            self.residuals.clone(),
            self.obs_freqs.clone(),
            self.design.clone(),
        )
    }

    fn flag_categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.flags
    }

    fn par_text(&self) -> Option<&str> {
        Some(&self.par_text)
    }

    fn noise_text(&self) -> Option<&str> {
        self.noise_text.as_deref()
    }

    fn stored_gc(&self) -> Option<&Array2<f64>> {
        self.gc.as_ref()
    }

    fn stored_g(&self) -> Option<&Array2<f64>> {
        self.g.as_ref()
    }

    fn stored_umat(&self) -> Option<&Array2<f64>> {
        self.umat.as_ref()
    }

    fn stored_epoch_ranges(&self) -> Option<&[(usize, usize)]> {
        self.epoch_ranges.as_deref()
    }
}
