//! Line-oriented parsing of timing-model and noise configuration text.
//!
//! Purpose
//! -------
//! Extract per-system noise parameters from the two text formats embedded in
//! pulsar archives: the timing-model parameter file (tempo2-style
//! `T2EFAC` / `T2EQUAD` / `ECORR` / `RNAMP` / `RNIDX` lines) and the
//! single-pulsar-analysis noise file (`efac-SYS` / `equad-SYS` /
//! `jitter_q-SYS` / `RN-Amplitude` / `RN-spectral-index` lines).
//!
//! Key behaviors
//! -------------
//! - Lines are tokenized on whitespace and matched on **exact first-token
//!   keys** (par files) or an explicit `key-selector` split of the first
//!   token (noise files). A tag embedded inside a longer token (say,
//!   `TNECORR`) never matches — substring scanning is deliberately avoided.
//! - Unrecognized lines are skipped silently; *recognized* lines that are
//!   structurally wrong (missing fields, unparsable numbers) are typed
//!   errors.
//! - A missing red-noise tag is not an error: the documented defaults
//!   (`1e-20`, `0.0`) stand.
//!
//! Conventions
//! -----------
//! - Par-file `T2EQUAD`/`ECORR` values are microseconds and converted to
//!   seconds; `RNIDX` is negated on read.
//! - Noise-file `equad-`/`jitter_q-` values are log10 seconds and decoded
//!   with `10^v`; `RN-Amplitude` likewise.
//! - Line numbers in errors are 1-based.
//!
//! Testing notes
//! -------------
//! - Unit tests cover both grammars end to end, the unit conversions, the
//!   exact-token discipline, default fallbacks, and malformed-line errors.
use crate::noise::errors::{NoiseError, NoiseResult};
use crate::noise::params::NoiseParams;

/// Parse tempo2-style parameter-file text into noise parameters.
///
/// Recognized lines (whitespace-tokenized):
/// - `T2EFAC <selector> <system> <value>`
/// - `T2EQUAD <selector> <system> <value-µs>`
/// - `ECORR <selector> <system> <value-µs>`
/// - `RNAMP <value>`
/// - `RNIDX <value>` (stored negated)
///
/// Errors
/// ------
/// - `NoiseError::MalformedLine` when a recognized key lacks its fields.
/// - `NoiseError::MalformedNumber` when a value fails to parse.
pub fn parse_par_file(text: &str) -> NoiseResult<NoiseParams> {
    let mut params = NoiseParams::default();
    for (lineno, raw) in text.lines().enumerate() {
        let line = lineno + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let Some(&key) = tokens.first() else { continue };
        match key {
            "T2EFAC" | "T2EQUAD" | "ECORR" => {
                let (system, value) = system_value(&tokens, line)?;
                match key {
                    "T2EFAC" => params.efacs.insert(system, value),
                    "T2EQUAD" => params.equads.insert(system, value * 1e-6),
                    _ => params.ecorrs.insert(system, value * 1e-6),
                };
            }
            "RNAMP" => params.red_amp = single_value(&tokens, line)?,
            "RNIDX" => params.red_index = -single_value(&tokens, line)?,
            _ => {}
        }
    }
    Ok(params)
}

/// Parse single-pulsar-analysis noise-file text into noise parameters.
///
/// Recognized lines, with the first token split into `key-selector` at its
/// first `-`:
/// - `efac-<system> <value>`
/// - `equad-<system> <log10-value>`
/// - `jitter_q-<system> <log10-value>`
/// - `RN-Amplitude <log10-value>`
/// - `RN-spectral-index <value>`
///
/// Errors
/// ------
/// - `NoiseError::MalformedLine` when a recognized key has no selector or
///   value.
/// - `NoiseError::MalformedNumber` when a value fails to parse.
pub fn parse_noise_file(text: &str) -> NoiseResult<NoiseParams> {
    let mut params = NoiseParams::default();
    for (lineno, raw) in text.lines().enumerate() {
        let line = lineno + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let Some(&tag) = tokens.first() else { continue };
        let Some((key, selector)) = tag.split_once('-') else { continue };
        match (key, selector) {
            ("efac", system) => {
                let value = value_token(&tokens, line)?;
                params.efacs.insert(system.to_string(), value);
            }
            ("equad", system) => {
                let value = value_token(&tokens, line)?;
                params.equads.insert(system.to_string(), 10f64.powf(value));
            }
            ("jitter_q", system) => {
                let value = value_token(&tokens, line)?;
                params.ecorrs.insert(system.to_string(), 10f64.powf(value));
            }
            ("RN", "Amplitude") => {
                params.red_amp = 10f64.powf(value_token(&tokens, line)?);
            }
            ("RN", "spectral-index") => {
                params.red_index = value_token(&tokens, line)?;
            }
            _ => {}
        }
    }
    Ok(params)
}

/// Extract `<system> <value>` from a 4-token par-file line.
fn system_value(tokens: &[&str], line: usize) -> NoiseResult<(String, f64)> {
    if tokens.len() < 4 {
        return Err(NoiseError::MalformedLine {
            line,
            reason: format!("expected 'KEY selector system value', got {} tokens", tokens.len()),
        });
    }
    Ok((tokens[2].to_string(), parse_f64(tokens[3], line)?))
}

/// Extract the value of a `KEY <value>` par-file line.
fn single_value(tokens: &[&str], line: usize) -> NoiseResult<f64> {
    match tokens.get(1) {
        Some(tok) => parse_f64(tok, line),
        None => Err(NoiseError::MalformedLine {
            line,
            reason: "expected 'KEY value'".to_string(),
        }),
    }
}

/// Extract the value of a `key-selector <value>` noise-file line.
fn value_token(tokens: &[&str], line: usize) -> NoiseResult<f64> {
    match tokens.get(1) {
        Some(tok) => parse_f64(tok, line),
        None => Err(NoiseError::MalformedLine {
            line,
            reason: "expected 'key-selector value'".to_string(),
        }),
    }
}

fn parse_f64(token: &str, line: usize) -> NoiseResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| NoiseError::MalformedNumber { line, token: token.to_string() })
}
