//! Error taxonomy shared by every SDK operation.

use std::convert::Infallible;

pub type SdkResult<T> = Result<T, SdkError>;

/// Errors from resolving domains and operating on domain data.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// A contract identifier the operation needs was not configured.
    /// Raised before any network call is made.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),
    #[error("domain not found")]
    DomainNotFound,
    #[error("domain data not found")]
    DomainDataNotFound,
    #[error("unsupported storage value type: {0}")]
    UnsupportedValueType(String),
    /// The RPC node rejected the simulation; the message is passed through untouched.
    #[error("{0}")]
    Simulation(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid node: {0}")]
    InvalidNode(String),
    #[error("invalid storage value: {0}")]
    InvalidValue(String),
    #[error("unexpected contract response: {0}")]
    InvalidResponse(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
}

impl From<Infallible> for SdkError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<base64::DecodeError> for SdkError {
    fn from(e: base64::DecodeError) -> Self {
        SdkError::InvalidResponse(format!("base64 decode: {e}"))
    }
}
