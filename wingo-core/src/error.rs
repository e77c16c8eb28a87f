use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Errors raised by a single call against the game service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_) => FailureKind::Transport,
            ApiError::UnexpectedStatus { .. } => FailureKind::Setup,
            ApiError::Malformed(_) => FailureKind::Malformed,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Malformed(_) => None,
        }
    }
}

/// Classification of a failed harness step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The service answered with a status other than 200.
    Setup,
    /// The service answered 200 but the body could not be used.
    Malformed,
    /// No response (connection refused, timeout, TLS).
    Transport,
    /// No successful trials, or a win rate outside the acceptance band.
    Statistical,
    /// Balance did not grow by the approved deposit amount.
    BalanceMismatch,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Setup => "setup",
            FailureKind::Malformed => "malformed response",
            FailureKind::Transport => "transport",
            FailureKind::Statistical => "statistical",
            FailureKind::BalanceMismatch => "balance mismatch",
        };
        f.write_str(s)
    }
}
