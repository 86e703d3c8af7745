//! Sky-position auxiliary files and run-tag selection.
//!
//! The sky-map consumers need the pulsar sky locations that match the
//! signal-to-noise configuration of a given run. Positions live in
//! whitespace-delimited files named `PsrPos_SNR_<tag>.txt`, where `<tag>` is
//! the `pct`-bearing token of the underscore-separated run-directory name
//! (e.g. `nano_Gam4p33_50pct` selects `PsrPos_SNR_50pct.txt`).
use crate::chain::errors::{ChainError, ChainResult};
use std::fs;
use std::path::Path;

/// One pulsar's sky location as read from an auxiliary position file.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPosition {
    /// Pulsar identifier.
    pub name: String,
    /// Longitude-like coordinate in degrees (ecliptic or equatorial,
    /// matching the file's convention).
    pub lon_deg: f64,
    /// Latitude-like coordinate in degrees.
    pub lat_deg: f64,
}

/// Read sky positions from a file of `(identifier, longitude, latitude)`
/// rows.
pub fn read_sky_positions(path: impl AsRef<Path>) -> ChainResult<Vec<SkyPosition>> {
    let text = fs::read_to_string(path)?;
    parse_sky_positions(&text)
}

/// Parse sky positions from text; comment (`#`) and blank lines are
/// skipped.
///
/// Errors
/// ------
/// - `ChainError::MalformedRow` when a row has fewer than three fields.
/// - `ChainError::MalformedNumber` when a coordinate fails to parse.
pub fn parse_sky_positions(text: &str) -> ChainResult<Vec<SkyPosition>> {
    let mut positions = Vec::new();
    for (lineno, raw) in text.lines().enumerate() {
        let row = lineno + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(ChainError::MalformedRow {
                row,
                reason: format!("expected 'name lon lat', got {} fields", tokens.len()),
            });
        }
        let lon_deg = parse_coord(tokens[1], row)?;
        let lat_deg = parse_coord(tokens[2], row)?;
        positions.push(SkyPosition { name: tokens[0].to_string(), lon_deg, lat_deg });
    }
    Ok(positions)
}

/// Select the `pct`-bearing token from an underscore-separated run-directory
/// name; the last such token wins, matching the run-naming convention.
pub fn snr_tag(run_dir: &str) -> Option<&str> {
    run_dir.split('_').filter(|tok| tok.contains("pct")).last()
}

/// File name of the sky-position file matching a run directory, when the
/// directory carries an SNR tag.
pub fn sky_position_file(run_dir: &str) -> Option<String> {
    snr_tag(run_dir).map(|tag| format!("PsrPos_SNR_{tag}.txt"))
}

fn parse_coord(token: &str, row: usize) -> ChainResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| ChainError::MalformedNumber { row, token: token.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Position parsing with comments and extra columns.
    // - Malformed-row and malformed-number rejections.
    // - SNR-tag extraction and file-name selection.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Rows parse into (name, lon, lat); extra trailing fields are ignored.
    fn parses_position_rows() {
        // Arrange
        let text = "# name lon lat\nJ1909-3744 306.4 -3.7 extra\nJ0613-0200 93.6 -1.1\n";

        // Act
        let positions = parse_sky_positions(text).unwrap();

        // Assert
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].name, "J1909-3744");
        assert_relative_eq!(positions[0].lon_deg, 306.4);
        assert_relative_eq!(positions[1].lat_deg, -1.1);
    }

    #[test]
    // Purpose
    // -------
    // Short rows and bad coordinates are typed errors.
    fn rejects_malformed_rows() {
        // Arrange / Act / Assert
        match parse_sky_positions("J1909-3744 306.4\n") {
            Err(ChainError::MalformedRow { row: 1, .. }) => (),
            other => panic!("expected MalformedRow, got {other:?}"),
        }
        match parse_sky_positions("J1909-3744 north -3.7\n") {
            Err(ChainError::MalformedNumber { row: 1, token }) => assert_eq!(token, "north"),
            other => panic!("expected MalformedNumber, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // The `pct` token of a run-directory name selects the position file.
    fn snr_tag_selects_pct_token() {
        // Arrange / Act / Assert
        assert_eq!(snr_tag("nano_Gam4p33_50pct"), Some("50pct"));
        assert_eq!(
            sky_position_file("nano_Gam4p33_50pct").as_deref(),
            Some("PsrPos_SNR_50pct.txt")
        );
        assert_eq!(snr_tag("nano_Gam4p33"), None);
        assert_eq!(sky_position_file("nano_Gam4p33"), None);
    }
}
