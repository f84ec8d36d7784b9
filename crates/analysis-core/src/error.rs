use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Missing market data: {0}")]
    MissingMarketData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
