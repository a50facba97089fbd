//! Error taxonomy for the OIDC client engine.
//!
//! One sum type covers every failure mode described by the component design;
//! the CLI layer is the only place that turns a variant into an exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("{0}")]
    Config(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no usable entropy source")]
    CryptoUnavailable,

    #[error("discovery failed: {reason}")]
    Discovery { reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpointError { status: u16, body: String },

    #[error("id token invalid: {reason}")]
    TokenInvalid { reason: String },

    #[error("state parameter mismatch")]
    StateMismatch,

    #[error("authorization response carried no code")]
    NoCode,

    #[error("connection has no refresh token")]
    NoRefreshToken,

    #[error("client secret is required for this grant type")]
    NoSecret,

    #[error("failed to bind callback port: {0}")]
    BindFailed(String),
}

impl From<reqwest::Error> for OidcError {
    fn from(err: reqwest::Error) -> Self {
        OidcError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for OidcError {
    fn from(err: std::io::Error) -> Self {
        OidcError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for OidcError {
    fn from(err: serde_json::Error) -> Self {
        OidcError::Storage(err.to_string())
    }
}

impl From<keyring::Error> for OidcError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => OidcError::NotFound("keyring entry".into()),
            other => OidcError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OidcError>;

/// Process exit codes, grounded on the one-variant-per-failure-kind scheme used
/// by the teacher's command dispatch.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Config = 10,
    Storage = 11,
    NotFound = 12,
    CryptoUnavailable = 13,
    Discovery = 14,
    Transport = 15,
    TokenEndpoint = 16,
    TokenInvalid = 17,
    StateMismatch = 18,
    NoCode = 19,
    NoRefreshToken = 20,
    NoSecret = 21,
    BindFailed = 22,
}

impl From<&OidcError> for ExitCode {
    fn from(err: &OidcError) -> Self {
        match err {
            OidcError::Config(_) => ExitCode::Config,
            OidcError::Storage(_) => ExitCode::Storage,
            OidcError::NotFound(_) => ExitCode::NotFound,
            OidcError::CryptoUnavailable => ExitCode::CryptoUnavailable,
            OidcError::Discovery { .. } => ExitCode::Discovery,
            OidcError::Transport(_) => ExitCode::Transport,
            OidcError::TokenEndpointError { .. } => ExitCode::TokenEndpoint,
            OidcError::TokenInvalid { .. } => ExitCode::TokenInvalid,
            OidcError::StateMismatch => ExitCode::StateMismatch,
            OidcError::NoCode => ExitCode::NoCode,
            OidcError::NoRefreshToken => ExitCode::NoRefreshToken,
            OidcError::NoSecret => ExitCode::NoSecret,
            OidcError::BindFailed(_) => ExitCode::BindFailed,
        }
    }
}
