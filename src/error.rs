// error.rs
use std::{path::PathBuf, time::Duration};

use serde_json::Value;
use thiserror::Error;

/// Why target discovery did not yield exactly one channel address.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("debug port not accessible at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("debug port not accessible: discovery endpoint answered HTTP {0}")]
    Status(u16),

    #[error("discovery endpoint returned an unexpected body: {0}")]
    Malformed(String),

    #[error("no windows found")]
    NoTargets,

    /// Refuse rather than guess which window was meant.
    #[error("multiple windows found ({0}); close the extra windows and retry")]
    MultipleTargets(usize),
}

/// Every failure the injector can surface.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InjectError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("failed to connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    /// The remote side answered with an `error` payload.
    #[error("remote error: {payload}")]
    Remote { payload: Value },

    /// The injection procedure answered our request but did not confirm dispatch.
    #[error("injection not confirmed: {result}")]
    Rejected { result: Value },

    #[error("'{method}' timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    #[error("invalid input event: {detail}")]
    Validation { detail: String },

    #[error("protocol error: {detail}")]
    Protocol { detail: String },

    #[error("failed to read injector script {path:?}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A macro step failed; `index` is zero-based into the flattened stream.
    #[error("event {} of {total} ({event}) failed: {source}", index + 1)]
    Step {
        index: usize,
        total: usize,
        event: String,
        #[source]
        source: Box<InjectError>,
    },
}

impl InjectError {
    pub(crate) fn protocol(detail: impl Into<String>) -> Self {
        Self::Protocol {
            detail: detail.into(),
        }
    }

    pub(crate) fn validation(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
        }
    }

    /// Unwraps `Step` to the failure that caused it.
    pub fn root(&self) -> &InjectError {
        match self {
            InjectError::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, InjectError>;
