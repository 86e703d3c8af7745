//! Errors for noise-configuration parsing and uncertainty rescaling.
//!
//! A *missing* red-noise tag is deliberately **not** an error: the parser
//! falls back to the documented defaults (amplitude `1e-20`, spectral index
//! `0.0`). Errors here are reserved for structurally malformed configuration
//! lines and for systems that appear in the TOA data but carry no registered
//! noise parameters when a rescale is requested.

/// Result alias for noise-configuration paths that may produce
/// [`NoiseError`].
pub type NoiseResult<T> = Result<T, NoiseError>;

/// Error type for noise-configuration text and rescaling.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseError {
    /// A recognized tag was present but its line could not be tokenized into
    /// the expected (key, selector, value) shape.
    MalformedLine { line: usize, reason: String },

    /// A numeric field on a recognized line failed to parse.
    MalformedNumber { line: usize, token: String },

    /// Uncertainty rescaling was requested for a system with no registered
    /// EFAC or EQUAD. Treated as a configuration error rather than silently
    /// defaulting.
    MissingSystem { system: String },
}

impl std::error::Error for NoiseError {}

impl std::fmt::Display for NoiseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseError::MalformedLine { line, reason } => {
                write!(f, "Malformed configuration line {line}: {reason}")
            }
            NoiseError::MalformedNumber { line, token } => {
                write!(f, "Configuration line {line}: cannot parse '{token}' as a number.")
            }
            NoiseError::MissingSystem { system } => {
                write!(
                    f,
                    "System '{system}' has TOAs but no registered noise parameters; \
                     refusing to rescale with silent defaults."
                )
            }
        }
    }
}
