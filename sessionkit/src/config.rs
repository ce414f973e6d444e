//! Provider configuration.
//!
//! [`ProviderConfig`] is the serde-facing description of a provider: the
//! initial chain, how the user logs in, whether an explicit session is
//! requested and what to do with fee options nobody is around to confirm.
//!
//! ```toml
//! chain_id = 137
//! login_method = "google"
//! include_implicit_session = true
//! fee_policy = "prefer-native"
//!
//! [session]
//! value_limit = "0"
//! expiry = { days = 7 }
//!
//! [[session.permissions]]
//! target = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"
//! function = "function transfer(address to, uint256 value)"
//! rules = [{ param = "value", type = "uint256", operation = "LESS_THAN_OR_EQUAL", value = "1000000", cumulative = true }]
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::chain::ChainId;
use crate::fee::UnattendedFeePolicy;
use crate::networks::ETHEREUM_MAINNET;
use crate::provider::{SessionProvider, SessionProviderBuilder};
use crate::rpc::{FeeTokenSource, NodeRpc};
use crate::session::{SessionConfigError, SessionMode, SessionSpec};
use crate::timestamp::UnixTimestamp;
use crate::wallet::{LoginMethod, WalletService};

/// Serde-deserializable provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Initial chain (default: Ethereum mainnet).
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,
    /// Login method (default: `google`).
    #[serde(default = "default_login_method")]
    pub login_method: LoginMethod,
    /// Email hint, used with the `email` login method.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether an implicit session is requested (default: true).
    #[serde(default = "default_true")]
    pub include_implicit_session: bool,
    /// Behaviour when fee options exist and no handler is registered.
    #[serde(default)]
    pub fee_policy: UnattendedFeePolicy,
    /// Explicit session to request; absent means implicit-only.
    #[serde(default)]
    pub session: Option<SessionSpec>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            login_method: default_login_method(),
            email: None,
            include_implicit_session: true,
            fee_policy: UnattendedFeePolicy::default(),
            session: None,
        }
    }
}

const fn default_chain_id() -> ChainId {
    ETHEREUM_MAINNET
}

const fn default_login_method() -> LoginMethod {
    LoginMethod::Google
}

const fn default_true() -> bool {
    true
}

impl ProviderConfig {
    /// Resolves the configured session against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError`] if the session description is invalid.
    pub fn session_mode(&self, now: UnixTimestamp) -> Result<SessionMode, SessionConfigError> {
        let params = self
            .session
            .clone()
            .map(|spec| spec.into_params(self.chain_id))
            .transpose()?;
        SessionMode::from_params(params, now)
    }

    /// Applies this configuration to a provider builder.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError`] if the session description is invalid.
    pub fn builder(
        &self,
        wallet: Arc<dyn WalletService>,
        fee_tokens: Arc<dyn FeeTokenSource>,
        node: Arc<dyn NodeRpc>,
    ) -> Result<SessionProviderBuilder, SessionConfigError> {
        let mut builder = SessionProvider::builder(wallet, fee_tokens, node)
            .with_chain_id(self.chain_id)
            .with_login_method(self.login_method)
            .with_implicit_session(self.include_implicit_session)
            .with_fee_policy(self.fee_policy)
            .with_session_mode(self.session_mode(UnixTimestamp::now())?);
        if let Some(email) = &self.email {
            builder = builder.with_email(email.clone());
        }
        Ok(builder)
    }
}
