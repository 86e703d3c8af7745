//! Errors for read-only MCMC chain artifacts (chain tables and sky-position
//! auxiliary files).

/// Result alias for chain-artifact loading paths.
pub type ChainResult<T> = Result<T, ChainError>;

/// Error type for chain-table and sky-position file loading.
#[derive(Debug)]
pub enum ChainError {
    /// Underlying I/O failure while reading an artifact.
    Io(std::io::Error),

    /// A data row has a different column count than the first row.
    RaggedRow { row: usize, expected: usize, actual: usize },

    /// The table is too narrow to carry the trailing diagnostic columns.
    TooFewColumns { columns: usize, required: usize },

    /// A field failed to parse as a floating-point number.
    MalformedNumber { row: usize, token: String },

    /// A sky-position row is missing its identifier or coordinates.
    MalformedRow { row: usize, reason: String },
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChainError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::Io(err) => {
                write!(f, "I/O error reading chain artifact: {err}")
            }
            ChainError::RaggedRow { row, expected, actual } => {
                write!(f, "Row {row} has {actual} columns, expected {expected}.")
            }
            ChainError::TooFewColumns { columns, required } => {
                write!(f, "Chain table has {columns} columns; at least {required} required.")
            }
            ChainError::MalformedNumber { row, token } => {
                write!(f, "Row {row}: cannot parse '{token}' as a number.")
            }
            ChainError::MalformedRow { row, reason } => {
                write!(f, "Row {row} is malformed: {reason}")
            }
        }
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err)
    }
}
