// SPDX-License-Identifier: MIT

use thiserror::Error;

pub const JSONRPC_METHOD_NOT_FOUND: i64 = -32601;

/// Errors surfaced by the chain gateway.
///
/// `UnsupportedMethod` is a named classification for the JSON-RPC
/// "method not found" code (-32601). Injected wallet providers do not all
/// implement every method the controller touches; that case is a
/// compatibility shim, not a failure, and must stay distinguishable from
/// real errors whose message happens to mention the same code.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("method not supported by provider")]
    UnsupportedMethod,

    #[error("execution reverted: {0}")]
    Revert(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl GatewayError {
    pub fn from_rpc(code: Option<i64>, message: impl Into<String>) -> Self {
        match code {
            Some(JSONRPC_METHOD_NOT_FOUND) => GatewayError::UnsupportedMethod,
            _ => GatewayError::Rpc(message.into()),
        }
    }

    /// Human-readable rejection reason, preferring a structured revert
    /// reason over the raw transport message.
    pub fn reason(&self) -> String {
        match self {
            GatewayError::Revert(reason) => reason.clone(),
            GatewayError::Rpc(message) => message.clone(),
            GatewayError::UnsupportedMethod => "method not supported".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Transaction failed: {hash:?}, reason: {reason}")]
    Transaction {
        hash: Option<String>,
        reason: String,
    },

    #[error("Indexer query failed: {0}")]
    Subgraph(String),

    #[error("Address {0} is invalid")]
    InvalidAddress(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
