use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("exchange error {code}: {msg}")]
    Api { code: i64, msg: String },
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("connectivity failure: {0}")]
    Connectivity(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("request signing failed: {0}")]
    Signing(String),
}

impl GatewayError {
    /// The request may or may not have reached the exchange.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            GatewayError::Connectivity(_) | GatewayError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Connectivity(e.to_string())
        }
    }
}
