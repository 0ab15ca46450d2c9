use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A single provider failed (network, payload, rate limit). Callers record
    /// this against the source's slot and keep going.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Malformed ticker or unrecognized timeframe. Fails the request fast
    /// instead of silently defaulting.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("API error: {0}")]
    ApiError(String),
}
