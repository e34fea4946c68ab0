use thiserror::Error;

/// Everything a route can fail with. The kind only decides how loudly the
/// failure is logged; callers always see the route's fixed message.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed client input, detected before any upstream call.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Upstream(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
