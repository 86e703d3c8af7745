//! Read-only loader for MCMC chain tables.
//!
//! Purpose
//! -------
//! Load the whitespace-delimited numeric chain file produced by the sampler
//! (one sample per row, model parameters first, then four trailing
//! diagnostic columns) into an in-memory table with typed accessors for the
//! columns downstream summaries actually index: individual parameters,
//! contiguous parameter blocks (anisotropy coefficients), the
//! log-likelihood column, and burn-in trimmed views.
//!
//! Key behaviors
//! -------------
//! - [`ChainTable::from_path`] / [`ChainTable::parse_str`] validate
//!   rectangularity and the minimum column count on load; comment lines
//!   (`#`) and blank lines are skipped.
//! - Trailing layout is fixed at [`N_DIAGNOSTIC_COLUMNS`] columns:
//!   log-posterior, log-likelihood, acceptance rate, swap acceptance rate.
//! - All accessors hand out views; the table is never mutated after load.
//!
//! Conventions
//! -----------
//! - Row/column indices are 0-based; `n_params = n_columns - 4`.
//! - There is no write path: chain files are an external artifact consumed
//!   read-only.
//!
//! Testing notes
//! -------------
//! - Unit tests cover parsing with comments/blank lines, the column
//!   accounting, ragged and too-narrow rejections, burn-in views, and
//!   parameter-block slicing.
use crate::chain::errors::{ChainError, ChainResult};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use std::fs;
use std::path::Path;

/// Number of trailing diagnostic columns in a chain row: log-posterior,
/// log-likelihood, acceptance rate, swap acceptance rate.
pub const N_DIAGNOSTIC_COLUMNS: usize = 4;

/// An immutable, rectangular MCMC chain table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTable {
    data: Array2<f64>,
}

impl ChainTable {
    /// Load a chain table from a file.
    ///
    /// Errors
    /// ------
    /// - `ChainError::Io` on read failure; everything
    ///   [`ChainTable::parse_str`] rejects otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> ChainResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse_str(&text)
    }

    /// Parse a chain table from text.
    ///
    /// Errors
    /// ------
    /// - `ChainError::TooFewColumns` when rows carry fewer than
    ///   `N_DIAGNOSTIC_COLUMNS + 1` fields (no parameter column at all).
    /// - `ChainError::RaggedRow` when a row's width differs from the first
    ///   data row.
    /// - `ChainError::MalformedNumber` on an unparsable field.
    pub fn parse_str(text: &str) -> ChainResult<Self> {
        let mut values: Vec<f64> = Vec::new();
        let mut width: Option<usize> = None;
        let mut n_rows = 0usize;
        for (lineno, raw) in text.lines().enumerate() {
            let row = lineno + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match width {
                None => {
                    if tokens.len() < N_DIAGNOSTIC_COLUMNS + 1 {
                        return Err(ChainError::TooFewColumns {
                            columns: tokens.len(),
                            required: N_DIAGNOSTIC_COLUMNS + 1,
                        });
                    }
                    width = Some(tokens.len());
                }
                Some(w) if tokens.len() != w => {
                    return Err(ChainError::RaggedRow {
                        row,
                        expected: w,
                        actual: tokens.len(),
                    });
                }
                Some(_) => {}
            }
            for tok in &tokens {
                let value = tok.parse::<f64>().map_err(|_| ChainError::MalformedNumber {
                    row,
                    token: tok.to_string(),
                })?;
                values.push(value);
            }
            n_rows += 1;
        }
        let width = width.unwrap_or(N_DIAGNOSTIC_COLUMNS + 1);
        let data = Array2::from_shape_vec((n_rows, width), values).map_err(|_| {
            ChainError::RaggedRow { row: n_rows, expected: width, actual: 0 }
        })?;
        Ok(ChainTable { data })
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Total column count including diagnostics.
    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    /// Number of model-parameter columns (total minus diagnostics).
    pub fn n_params(&self) -> usize {
        self.n_columns() - N_DIAGNOSTIC_COLUMNS
    }

    /// Column view of model parameter `j`, or `None` when `j` indexes into
    /// the diagnostic block.
    pub fn parameter(&self, j: usize) -> Option<ArrayView1<'_, f64>> {
        (j < self.n_params()).then(|| self.data.column(j))
    }

    /// Contiguous block of parameter columns `[start, end)`, or `None` when
    /// the range leaves the parameter block.
    pub fn parameter_block(&self, start: usize, end: usize) -> Option<ArrayView2<'_, f64>> {
        (start <= end && end <= self.n_params())
            .then(|| self.data.slice(s![.., start..end]))
    }

    /// The log-likelihood diagnostic column.
    pub fn log_likelihood(&self) -> ArrayView1<'_, f64> {
        self.data.column(self.n_columns() - 3)
    }

    /// The log-posterior diagnostic column.
    pub fn log_posterior(&self) -> ArrayView1<'_, f64> {
        self.data.column(self.n_columns() - 4)
    }

    /// View with the first `burn` samples removed (empty when `burn`
    /// exceeds the sample count).
    pub fn burned(&self, burn: usize) -> ArrayView2<'_, f64> {
        let start = burn.min(self.n_samples());
        self.data.slice(s![start.., ..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing with comments and blank lines; column accounting.
    // - Parameter, block, diagnostic, and burn-in accessors.
    // - Ragged-row, too-narrow, and malformed-number rejections.
    // -------------------------------------------------------------------------

    const TEXT: &str = "\
# amp gamma | lnpost lnlike accept swap
-14.5 4.2 -10.0 -9.0 0.25 0.1

-14.1 4.4 -11.0 -9.5 0.30 0.1
-13.9 4.0 -12.0 -9.9 0.28 0.1
";

    #[test]
    // Purpose
    // -------
    // A well-formed table parses with the right sample/parameter counts and
    // diagnostic columns.
    fn parse_counts_columns_and_reads_diagnostics() {
        // Arrange / Act
        let table = ChainTable::parse_str(TEXT).unwrap();

        // Assert
        assert_eq!(table.n_samples(), 3);
        assert_eq!(table.n_columns(), 6);
        assert_eq!(table.n_params(), 2);
        assert_relative_eq!(table.parameter(0).unwrap()[1], -14.1);
        assert_relative_eq!(table.log_likelihood()[2], -9.9);
        assert_relative_eq!(table.log_posterior()[0], -10.0);
        assert!(table.parameter(2).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Burn-in views drop leading samples and saturate past the end.
    fn burned_drops_leading_samples() {
        // Arrange
        let table = ChainTable::parse_str(TEXT).unwrap();

        // Act / Assert
        assert_eq!(table.burned(1).nrows(), 2);
        assert_relative_eq!(table.burned(1)[[0, 0]], -14.1);
        assert_eq!(table.burned(10).nrows(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Parameter-block slicing stays inside the parameter columns.
    fn parameter_block_respects_parameter_boundary() {
        // Arrange
        let table = ChainTable::parse_str(TEXT).unwrap();

        // Act / Assert
        let block = table.parameter_block(0, 2).unwrap();
        assert_eq!(block.dim(), (3, 2));
        assert!(table.parameter_block(0, 3).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Ragged rows, too-narrow tables, and bad numbers are typed errors.
    fn rejects_malformed_tables() {
        // Arrange / Act / Assert
        match ChainTable::parse_str("1.0 2.0 3.0 4.0 5.0\n1.0 2.0\n") {
            Err(ChainError::RaggedRow { row: 2, expected: 5, actual: 2 }) => (),
            other => panic!("expected RaggedRow, got {other:?}"),
        }
        match ChainTable::parse_str("1.0 2.0 3.0\n") {
            Err(ChainError::TooFewColumns { columns: 3, required: 5 }) => (),
            other => panic!("expected TooFewColumns, got {other:?}"),
        }
        match ChainTable::parse_str("1.0 2.0 3.0 4.0 oops\n") {
            Err(ChainError::MalformedNumber { row: 1, token }) => assert_eq!(token, "oops"),
            other => panic!("expected MalformedNumber, got {other:?}"),
        }
    }
}
