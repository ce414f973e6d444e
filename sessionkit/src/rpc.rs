//! Request arguments, method keys and transport seams.
//!
//! The provider reaches two HTTP collaborators besides the remote wallet: the
//! relayer, for the fee tokens it accepts, and a per-chain node, for every
//! JSON-RPC method the provider does not handle itself. Both are traits so the
//! transport can be swapped (see the `sessionkit-http` crate).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::ChainId;
use crate::error::TransportError;
use crate::fee::FeeTokens;

/// A boxed, `Send` future, used at dyn-compatible trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Arguments of an EIP-1193 `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    /// JSON-RPC method name.
    pub method: String,
    /// Positional or named parameters.
    #[serde(default)]
    pub params: Value,
}

impl RequestArguments {
    /// Creates request arguments.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Methods the provider handles itself; everything else goes to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `eth_accounts`
    Accounts,
    /// `eth_requestAccounts`
    RequestAccounts,
    /// `eth_chainId`
    ChainId,
    /// `personal_sign`
    PersonalSign,
    /// `eth_sign`
    EthSign,
    /// `eth_signTypedData` and `eth_signTypedData_v4`
    SignTypedData,
    /// `eth_sendTransaction` and `wallet_sendTransaction`
    SendTransaction,
    /// `wallet_switchEthereumChain`
    SwitchChain,
    /// Any other method, forwarded to the node.
    Other(String),
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value {
            "eth_accounts" => Self::Accounts,
            "eth_requestAccounts" => Self::RequestAccounts,
            "eth_chainId" => Self::ChainId,
            "personal_sign" => Self::PersonalSign,
            "eth_sign" => Self::EthSign,
            "eth_signTypedData" | "eth_signTypedData_v4" => Self::SignTypedData,
            "eth_sendTransaction" | "wallet_sendTransaction" => Self::SendTransaction,
            "wallet_switchEthereumChain" => Self::SwitchChain,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
            Self::ChainId => "eth_chainId",
            Self::PersonalSign => "personal_sign",
            Self::EthSign => "eth_sign",
            Self::SignTypedData => "eth_signTypedData_v4",
            Self::SendTransaction => "eth_sendTransaction",
            Self::SwitchChain => "wallet_switchEthereumChain",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Source of the relayer's accepted fee tokens.
pub trait FeeTokenSource: Send + Sync {
    /// Fetches the fee tokens the relayer accepts on `chain_id`.
    fn fee_tokens(&self, chain_id: ChainId) -> BoxFuture<'_, Result<FeeTokens, TransportError>>;
}

/// JSON-RPC access to a node for a given chain.
pub trait NodeRpc: Send + Sync {
    /// Sends `method` with `params` to the node serving `chain_id`.
    fn request<'a>(
        &'a self,
        chain_id: ChainId,
        method: &'a str,
        params: &'a Value,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;
}
