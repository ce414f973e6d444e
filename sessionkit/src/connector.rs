//! Wallet-framework connector glue and persisted login state.
//!
//! [`SessionConnector`] exposes a [`SessionProvider`] through the lifecycle a
//! host wallet framework drives: connect, disconnect, accounts, chain, and the
//! `is_authorized` probe used to skip the connect UI on reload.
//!
//! The login method a session was established with is written to
//! [`ConnectorStorage`] under [`LOGIN_METHOD_STORAGE_KEY`]. A session that is
//! still active but was created under a different login method reports as not
//! authorized, which forces the user through the connect flow again.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use alloy_primitives::Address;
use serde_json::{Value, json};

use crate::chain::{ChainId, to_hex_chain_id};
use crate::error::ProviderError;
use crate::provider::SessionProvider;
use crate::rpc::RequestArguments;

/// Storage key holding the login method of the last established session.
pub const LOGIN_METHOD_STORAGE_KEY: &str = "sessionkit.loginMethod";

/// Connector id reported to the host framework.
pub const CONNECTOR_ID: &str = "sessionkit";

/// Key-value storage provided by the host framework.
pub trait ConnectorStorage: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Writes a value.
    fn set(&self, key: &str, value: String);
    /// Deletes a value.
    fn remove(&self, key: &str);
}

/// In-process [`ConnectorStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectorStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Result of [`SessionConnector::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    /// Exposed accounts.
    pub accounts: Vec<Address>,
    /// Chain the provider is on after connecting.
    pub chain_id: ChainId,
}

/// Registers a provider under the host framework's connector interface.
pub struct SessionConnector {
    provider: Arc<SessionProvider>,
    storage: Arc<dyn ConnectorStorage>,
}

impl std::fmt::Debug for SessionConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConnector")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl SessionConnector {
    /// Wraps `provider`, persisting login state to `storage`.
    pub fn new(provider: Arc<SessionProvider>, storage: Arc<dyn ConnectorStorage>) -> Self {
        Self { provider, storage }
    }

    /// Connector id.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        CONNECTOR_ID
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &Arc<SessionProvider> {
        &self.provider
    }

    /// Connects, optionally switching to `chain_id` first.
    ///
    /// # Errors
    ///
    /// Propagates the provider's `eth_requestAccounts` failure.
    pub async fn connect(&self, chain_id: Option<ChainId>) -> Result<ConnectOutcome, ProviderError> {
        if let Some(chain_id) = chain_id.filter(|c| *c != self.provider.chain_id()) {
            self.provider.switch_chain(chain_id);
        }
        let accounts = self
            .provider
            .request(RequestArguments::new("eth_requestAccounts", json!([])))
            .await?;
        self.storage.set(
            LOGIN_METHOD_STORAGE_KEY,
            self.provider.login_method().as_str().to_owned(),
        );
        Ok(ConnectOutcome {
            accounts: parse_accounts(&accounts)?,
            chain_id: self.provider.chain_id(),
        })
    }

    /// Disconnects and forgets the persisted login method.
    ///
    /// # Errors
    ///
    /// Returns the wallet's error; local state is cleared regardless.
    pub async fn disconnect(&self) -> Result<(), ProviderError> {
        self.storage.remove(LOGIN_METHOD_STORAGE_KEY);
        self.provider.disconnect().await
    }

    /// Currently exposed accounts.
    ///
    /// # Errors
    ///
    /// Fails only if the provider returns a malformed account list.
    pub async fn get_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = self
            .provider
            .request(RequestArguments::new("eth_accounts", json!([])))
            .await?;
        parse_accounts(&accounts)
    }

    /// The provider's current chain.
    #[must_use]
    pub fn get_chain_id(&self) -> ChainId {
        self.provider.chain_id()
    }

    /// Switches the provider's chain.
    ///
    /// # Errors
    ///
    /// Propagates the provider's `wallet_switchEthereumChain` failure.
    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<ChainId, ProviderError> {
        self.provider
            .request(RequestArguments::new(
                "wallet_switchEthereumChain",
                json!([{ "chainId": to_hex_chain_id(chain_id) }]),
            ))
            .await?;
        Ok(self.provider.chain_id())
    }

    /// Whether the host may skip the connect UI.
    ///
    /// True only for an active session established under the provider's
    /// configured login method.
    pub async fn is_authorized(&self) -> bool {
        let stored = self.storage.get(LOGIN_METHOD_STORAGE_KEY);
        if stored.as_deref() != Some(self.provider.login_method().as_str()) {
            #[cfg(feature = "telemetry")]
            tracing::debug!(?stored, expected = %self.provider.login_method(), "Login method drift");
            return false;
        }
        self.get_accounts()
            .await
            .is_ok_and(|accounts| !accounts.is_empty())
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ProviderError::Internal(format!("Malformed account list: {e}")))
}
