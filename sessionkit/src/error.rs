//! Error types surfaced to callers.
//!
//! Every failure of [`SessionProvider::request`](crate::SessionProvider::request)
//! is a [`ProviderError`]. Errors that correspond to a standard EIP-1193 /
//! JSON-RPC condition carry its numeric code; protocol and state errors are
//! uncoded and only take a code when forced into the wire shape by
//! [`ProviderError::to_rpc_error`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wallet::{RequestId, WalletError};

/// Standard provider error codes.
pub mod codes {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested method or account has not been authorized.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider is disconnected from all chains.
    pub const DISCONNECTED: i64 = 4900;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// The provider-standard error object `{code, message, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Short description.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Failures of the relayer and node transports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The request did not complete.
    #[error("Request failed: {0}")]
    Network(String),
    /// The response body could not be decoded.
    #[error("Response decode error: {0}")]
    Decode(String),
    /// The node answered with a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional error data.
        data: Option<Value>,
    },
    /// The endpoint URL could not be resolved for the chain.
    #[error("Cannot resolve endpoint: {0}")]
    Template(String),
}

/// Errors returned by the EIP-1193 provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The user (or the fee handler on their behalf) declined.
    #[error("User rejected the request: {0}")]
    UserRejected(String),
    /// An operation needs an active session and there is none.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The session client shut down while a response was pending.
    #[error("Disconnected: {0}")]
    Disconnected(String),
    /// Request parameters are malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    /// A transport failed while serving the request.
    #[error("Internal JSON-RPC error: {0}")]
    Internal(String),
    /// A node returned a JSON-RPC error, passed through verbatim.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// Node-supplied code.
        code: i64,
        /// Node-supplied message.
        message: String,
        /// Node-supplied data.
        data: Option<Value>,
    },
    /// The remote wallet reported an error.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
    /// A fee confirmation answered a different request.
    #[error("Fee confirmation id mismatch: expected {expected}, received {received}")]
    FeeConfirmationMismatch {
        /// Id that was issued.
        expected: RequestId,
        /// Id that came back.
        received: RequestId,
    },
    /// A confirmed fee option was not among the offered options.
    #[error("Confirmed fee option was not offered by the relayer")]
    UnknownFeeOption,
    /// No handler is registered and the relayer offered no native-asset option.
    #[error("No native fee option available and no fee handler registered")]
    NoNativeFeeOption,
    /// The explicit session ended up with no permissions.
    #[error("Explicit session has no permissions")]
    EmptySessionPermissions,
    /// The node URL template could not be resolved.
    #[error("Cannot resolve node URL: {0}")]
    NodeUrl(String),
}

impl ProviderError {
    /// The standard error code, or `None` for protocol/state errors.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected(_) => Some(codes::USER_REJECTED),
            Self::Unauthorized(_) => Some(codes::UNAUTHORIZED),
            Self::Disconnected(_) => Some(codes::DISCONNECTED),
            Self::InvalidParams(_) => Some(codes::INVALID_PARAMS),
            Self::Internal(_) => Some(codes::INTERNAL_ERROR),
            Self::Rpc { code, .. } => Some(*code),
            Self::Wallet(e) => match e.code {
                Some(code) => Some(code),
                None => Some(codes::INTERNAL_ERROR),
            },
            Self::FeeConfirmationMismatch { .. }
            | Self::UnknownFeeOption
            | Self::NoNativeFeeOption
            | Self::EmptySessionPermissions
            | Self::NodeUrl(_) => None,
        }
    }

    /// Whether this is a user-rejection error (code 4001).
    #[must_use]
    pub const fn is_user_rejection(&self) -> bool {
        matches!(self.code(), Some(codes::USER_REJECTED))
    }

    /// Converts into the provider-standard error object.
    ///
    /// Uncoded errors are reported as internal errors.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcErrorObject {
        let data = match self {
            Self::Rpc { data, .. } => data.clone(),
            _ => None,
        };
        RpcErrorObject {
            code: self.code().unwrap_or(codes::INTERNAL_ERROR),
            message: self.to_string(),
            data,
        }
    }

    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }
}

impl From<TransportError> for ProviderError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Rpc {
                code,
                message,
                data,
            } => Self::Rpc {
                code,
                message,
                data,
            },
            TransportError::Template(msg) => Self::NodeUrl(msg),
            other @ (TransportError::Http { .. }
            | TransportError::Network(_)
            | TransportError::Decode(_)) => Self::Internal(other.to_string()),
        }
    }
}
