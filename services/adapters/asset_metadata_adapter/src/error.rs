//! Error types for asset metadata resolution
//!
//! A plain "not found" is never an error: resolver operations return
//! `Ok(None)` for it. These types cover remote failures (downgraded and
//! logged by the resolver), persistence failures and caller mistakes.

use metadata_config::ChainId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors the resolver surfaces to its callers
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Chain id has no entry in the network registry
    #[error("Unknown network: chain id {0} has no registry entry")]
    UnknownNetwork(ChainId),

    /// No factory information stored for the dex on this network
    #[error("No dex info for {dex} on {network}")]
    UnknownDex {
        /// Dex name as requested
        dex: String,
        /// Canonical network name
        network: String,
    },

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures writing a persisted store
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system failure for a specific store path
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Store file involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document could not be serialized
    #[error("Failed to serialize store document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures of a remote source call
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP or RPC transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Attempt exceeded the configured timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Per-attempt timeout
        timeout_ms: u64,
    },

    /// Remote refused the request (authentication, quota, bad request)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Value is not a 20-byte hex address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Interface description missing or unusable
    #[error("Missing interface: {0}")]
    MissingInterface(String),

    /// No RPC endpoint configured for the network
    #[error("No RPC endpoint configured for chain id {0}")]
    NoEndpoint(ChainId),

    /// Contract call reverted or returned undecodable data
    #[error("Contract call failed: {0}")]
    Contract(String),
}

impl QueryError {
    /// Whether retrying the same request can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transport(_) | QueryError::Timeout { .. })
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            QueryError::Malformed(err.to_string())
        } else {
            QueryError::Transport(err.to_string())
        }
    }
}

impl From<web3::contract::Error> for QueryError {
    fn from(err: web3::contract::Error) -> Self {
        match err {
            web3::contract::Error::Api(api) => QueryError::Transport(api.to_string()),
            web3::contract::Error::Abi(abi) => QueryError::MissingInterface(abi.to_string()),
            other => QueryError::Contract(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(QueryError::Transport("reset".into()).is_retryable());
        assert!(QueryError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!QueryError::Malformed("bad".into()).is_retryable());
        assert!(!QueryError::Rejected("HTTP 401".into()).is_retryable());
        assert!(!QueryError::NoEndpoint(137).is_retryable());
    }
}
