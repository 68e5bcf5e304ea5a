use thiserror::Error;

/// Failures raised by the retention and significance computation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("user '{user_id}' has more than one signup event")]
    DuplicateSignup { user_id: String },

    #[error("row {row}: unrecognised timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A zero row or column total leaves the expected frequencies undefined.
    #[error("contingency table has a zero margin: {0:?}")]
    DegenerateTable([[u64; 2]; 2]),
}
