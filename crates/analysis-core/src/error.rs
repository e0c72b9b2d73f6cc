use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Model error: {0}")]
    ModelError(String),
}
