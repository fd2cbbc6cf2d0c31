use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundPairError {
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Mismatched series length in {context}: {left} vs {right} observations")]
    MismatchedSeriesLength {
        context: String,
        left: usize,
        right: usize,
    },

    #[error("No valid candidate: {0}")]
    NoValidCandidate(String),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FundPairError {
    fn from(e: serde_json::Error) -> Self {
        FundPairError::SerializationError(e.to_string())
    }
}
