use thiserror::Error;

/// Errors raised anywhere in the price lookup pipeline.
#[derive(Debug, Error)]
pub enum PriceAgentError {
    /// The inbound request was malformed (for example a missing prompt).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The filter model did not call `odata_query`, or its arguments were unusable.
    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    /// A price catalog page request failed.
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// The answer model call failed.
    #[error("Answer synthesis error: {0}")]
    AnswerSynthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PriceAgentError>;

impl PriceAgentError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
