//! Contract consumed from the remote wallet session service.
//!
//! The remote wallet is an external collaborator. This module fixes the shape
//! of everything exchanged with it: the requests the [`SessionClient`]
//! issues through [`WalletService`], and the push events it receives back
//! through a single shared [`WalletEvent`] channel.
//!
//! Interactive requests (message signing, typed-data signing, wallet-confirmed
//! transactions) do not return their result directly. The service acknowledges
//! the request and later pushes a [`WalletActionResponse`] carrying the same
//! [`RequestId`].
//!
//! [`SessionClient`]: crate::client::SessionClient

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, Bytes, TxHash, U256, hex};
use rand::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::chain::ChainId;
use crate::fee::FeeOption;
use crate::rpc::BoxFuture;
use crate::session::ExplicitSession;

/// Correlation id tying a request to its asynchronous response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generates a fresh random id (128 bits, hex encoded).
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rng().random();
        Self(hex::encode(bytes))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A normalized contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Call target.
    pub to: Address,
    /// Native value attached to the call.
    #[serde(default)]
    pub value: U256,
    /// Calldata.
    #[serde(default)]
    pub data: Bytes,
}

/// Identity provider used to log into the embedded wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// Email one-time code.
    Email,
    /// Google sign-in.
    Google,
    /// Apple sign-in.
    Apple,
    /// WebAuthn passkey.
    Passkey,
}

impl LoginMethod {
    /// Stable string form, used for persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Google => "google",
            Self::Apple => "apple",
            Self::Passkey => "passkey",
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            "passkey" => Ok(Self::Passkey),
            other => Err(format!("unknown login method '{other}'")),
        }
    }
}

/// Options for the interactive connect handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Identity provider to log in with.
    pub login_method: LoginMethod,
    /// Email hint; only set for [`LoginMethod::Email`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether to also request an implicit session.
    pub include_implicit_session: bool,
}

/// Outcome of asking the wallet whether calls are covered by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    /// Whether any session grant covers the calls.
    pub has_permission: bool,
    /// Whether the covering grant is implicit rather than explicit.
    pub is_implicit: bool,
}

impl PermissionCheck {
    /// Calls covered by an implicit grant.
    pub const IMPLICIT: Self = Self {
        has_permission: true,
        is_implicit: true,
    };
    /// Calls covered by the explicit session.
    pub const EXPLICIT: Self = Self {
        has_permission: true,
        is_implicit: false,
    };
    /// Calls not covered by any grant.
    pub const NONE: Self = Self {
        has_permission: false,
        is_implicit: false,
    };
}

/// Error reported by the remote wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct WalletError {
    /// Provider-style error code, when the wallet supplies one.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable message.
    pub message: String,
}

impl WalletError {
    /// Creates an uncoded error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Sets the error code.
    #[must_use]
    pub const fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

/// Asynchronous result of an interactive wallet request.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletActionResponse {
    /// Id of the request this answers.
    pub id: RequestId,
    /// Signature or transaction hash on success, the wallet's error otherwise.
    pub outcome: Result<Value, WalletError>,
}

/// Push events emitted by the remote wallet.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    /// Session availability changed; `None` means the session is gone.
    SessionsUpdated {
        /// Wallet address of the active session, if any.
        address: Option<Address>,
    },
    /// An interactive request finished.
    WalletActionResponse(WalletActionResponse),
}

/// The remote wallet session service.
///
/// Implementations bridge to whatever transport reaches the wallet (a popup,
/// an iframe channel, a backend API). All events for one client must flow
/// through the receiver returned by [`events`](Self::events).
pub trait WalletService: Send + Sync {
    /// Subscribes to the service's push events.
    fn events(&self) -> broadcast::Receiver<WalletEvent>;

    /// Runs the interactive connect handshake, returning the wallet address on success.
    fn connect<'a>(
        &'a self,
        chain_id: ChainId,
        session: Option<&'a ExplicitSession>,
        options: &'a ConnectOptions,
    ) -> BoxFuture<'a, Result<Option<Address>, WalletError>>;

    /// Requests a message signature; answered by a [`WalletActionResponse`] with `id`.
    fn sign_message<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        message: &'a Bytes,
    ) -> BoxFuture<'a, Result<(), WalletError>>;

    /// Requests an EIP-712 signature; answered by a [`WalletActionResponse`] with `id`.
    fn sign_typed_data<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        typed_data: &'a Value,
    ) -> BoxFuture<'a, Result<(), WalletError>>;

    /// Submits session-authorized calls through the relayer.
    fn send_transaction<'a>(
        &'a self,
        chain_id: ChainId,
        transactions: &'a [Transaction],
        fee_option: Option<&'a FeeOption>,
    ) -> BoxFuture<'a, Result<TxHash, WalletError>>;

    /// Asks the user to confirm a call in the wallet; answered by a [`WalletActionResponse`] with `id`.
    fn send_wallet_transaction<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), WalletError>>;

    /// Checks whether the session covers `transactions`.
    fn check_permissions<'a>(
        &'a self,
        chain_id: ChainId,
        transactions: &'a [Transaction],
    ) -> BoxFuture<'a, Result<PermissionCheck, WalletError>>;

    /// Fetches relayer fee quotes for `transactions`.
    fn fee_options<'a>(
        &'a self,
        chain_id: ChainId,
        transactions: &'a [Transaction],
    ) -> BoxFuture<'a, Result<Vec<FeeOption>, WalletError>>;

    /// Ends the session.
    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>>;
}
