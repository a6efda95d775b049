//! Error taxonomy for embed resolution.
//!
//! Every variant except [`ResolveError::Cancelled`] is absorbed at the
//! coordinator's task boundary and turns into "this embed contributed
//! nothing". Cancellation is the only error that crosses it.

use std::time::Duration;

use thiserror::Error;

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no Location header in response from {0}")]
    MissingRedirect(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("no strategy registered for {0}")]
    UnsupportedHost(String),

    #[error("redelegation depth {depth} exceeded at {url}")]
    DepthExceeded { url: String, depth: usize },

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// `true` for failures that degrade to an empty result for one embed.
    pub fn is_absorbed(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
