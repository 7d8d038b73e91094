//! Error types for loading, configuring and scoring orientation runs.

use thiserror::Error;

/// Errors surfaced at the crate boundary.
///
/// Configuration and input errors are fatal and carry the offending token;
/// I/O errors wrap the underlying OS error. Violations of internal engine
/// invariants are programmer bugs and panic instead of appearing here.
#[derive(Debug, Error)]
pub enum OrientError {
    /// A required property is absent from the properties file.
    #[error("missing value for the `{0}` property")]
    MissingProperty(&'static str),

    /// A known property carries a value outside its accepted set.
    #[error("`{value}` is not a valid value for the `{key}` property")]
    InvalidProperty { key: &'static str, value: String },

    /// An input line does not match the expected format.
    #[error("malformed {what} in line `{line}`")]
    MalformedLine { what: &'static str, line: String },

    /// Vertex names may not contain `_`, which is reserved.
    #[error("vertex name `{0}` contains the reserved character `_`")]
    ReservedName(String),

    /// Edge weights must lie in `(0, 1]`.
    #[error("edge weight {weight} in line `{line}` is outside (0, 1]")]
    WeightOutOfRange { weight: f64, line: String },

    /// The solver solution assigns a different number of edges than expected.
    #[error("expected {expected} edge orientation assignments but found {found}")]
    SolutionLength { expected: usize, found: usize },

    /// The solver solution contains a token other than `0` or `1`.
    #[error("`{0}` is not a valid edge orientation")]
    SolutionToken(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OrientError>;
