//! The EIP-1193 provider adapter.
//!
//! [`SessionProvider::request`] dispatches each JSON-RPC method either to a
//! handler of its own, to the [`SessionClient`], or to the chain's node. It is
//! the single place that decides whether a transaction is already authorized
//! by the session or needs the user.
//!
//! # Transaction authorization
//!
//! For `eth_sendTransaction` the provider asks the wallet whether the call is
//! covered by a session grant:
//!
//! - covered by an implicit grant: relayed directly, no fee negotiation;
//! - covered by the explicit session: fee options are fetched from the relayer
//!   and, if any exist, one is chosen through the registered
//!   [`FeeOptionConfirmationHandler`] (or the [`UnattendedFeePolicy`] when no
//!   handler is registered) before relaying;
//! - not covered: the user confirms the call interactively in the wallet.
//!
//! The chain id is read once when a request enters and that value is used for
//! every step of the request, so a concurrent chain switch never splits one
//! request across two chains.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use alloy_primitives::{Address, Bytes, U256};
use serde_json::{Map, Value, json};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::chain::{ChainId, parse_chain_id_value, to_hex_chain_id};
use crate::client::SessionClient;
use crate::error::{ProviderError, RpcErrorObject, codes};
use crate::events::{EventKind, EventRegistry, ListenerId, ProviderEvent};
use crate::fee::{
    FeeConfirmationRequest, FeeOption, FeeOptionConfirmationHandler, UnattendedFeePolicy,
};
use crate::permission::parse_u256;
use crate::rpc::{FeeTokenSource, Method, NodeRpc, RequestArguments};
use crate::session::{ExplicitSession, SessionConfigError, SessionMode};
use crate::wallet::{ConnectOptions, LoginMethod, RequestId, Transaction, WalletService};

/// EIP-1193 provider bound to one remote wallet session.
pub struct SessionProvider {
    chain_id: AtomicU64,
    mode: SessionMode,
    login_method: LoginMethod,
    email: RwLock<Option<String>>,
    include_implicit_session: bool,
    fee_policy: UnattendedFeePolicy,
    fee_handler: RwLock<Option<Arc<dyn FeeOptionConfirmationHandler>>>,
    client: SessionClient,
    fee_tokens: Arc<dyn FeeTokenSource>,
    node: Arc<dyn NodeRpc>,
    events: Arc<EventRegistry>,
}

impl fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProvider")
            .field("chain_id", &self.chain_id())
            .field("mode", &self.mode)
            .field("login_method", &self.login_method)
            .field("fee_policy", &self.fee_policy)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SessionProvider`].
pub struct SessionProviderBuilder {
    wallet: Arc<dyn WalletService>,
    fee_tokens: Arc<dyn FeeTokenSource>,
    node: Arc<dyn NodeRpc>,
    chain_id: ChainId,
    mode: SessionMode,
    login_method: LoginMethod,
    email: Option<String>,
    include_implicit_session: bool,
    fee_policy: UnattendedFeePolicy,
    fee_handler: Option<Arc<dyn FeeOptionConfirmationHandler>>,
}

impl fmt::Debug for SessionProviderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProviderBuilder")
            .field("chain_id", &self.chain_id)
            .field("mode", &self.mode)
            .field("login_method", &self.login_method)
            .finish_non_exhaustive()
    }
}

impl SessionProviderBuilder {
    /// Sets the initial chain (default: Ethereum mainnet).
    #[must_use]
    pub const fn with_chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets whether an explicit session is requested at connect time.
    #[must_use]
    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the login method (default: Google).
    #[must_use]
    pub const fn with_login_method(mut self, login_method: LoginMethod) -> Self {
        self.login_method = login_method;
        self
    }

    /// Sets the email hint used with [`LoginMethod::Email`].
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets whether an implicit session is requested alongside (default: true).
    #[must_use]
    pub const fn with_implicit_session(mut self, include: bool) -> Self {
        self.include_implicit_session = include;
        self
    }

    /// Sets the behaviour when fee options exist but no handler is registered.
    #[must_use]
    pub const fn with_fee_policy(mut self, policy: UnattendedFeePolicy) -> Self {
        self.fee_policy = policy;
        self
    }

    /// Registers a fee-option confirmation handler.
    #[must_use]
    pub fn with_fee_handler(mut self, handler: Arc<dyn FeeOptionConfirmationHandler>) -> Self {
        self.fee_handler = Some(handler);
        self
    }

    /// Builds the provider and starts its session client.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn build(self) -> SessionProvider {
        let events = Arc::new(EventRegistry::new());
        let client = SessionClient::new(self.wallet, Arc::clone(&events));
        SessionProvider {
            chain_id: AtomicU64::new(self.chain_id),
            mode: self.mode,
            login_method: self.login_method,
            email: RwLock::new(self.email),
            include_implicit_session: self.include_implicit_session,
            fee_policy: self.fee_policy,
            fee_handler: RwLock::new(self.fee_handler),
            client,
            fee_tokens: self.fee_tokens,
            node: self.node,
            events,
        }
    }
}

impl SessionProvider {
    /// Starts building a provider over its three collaborators.
    pub fn builder(
        wallet: Arc<dyn WalletService>,
        fee_tokens: Arc<dyn FeeTokenSource>,
        node: Arc<dyn NodeRpc>,
    ) -> SessionProviderBuilder {
        SessionProviderBuilder {
            wallet,
            fee_tokens,
            node,
            chain_id: crate::networks::ETHEREUM_MAINNET,
            mode: SessionMode::Implicit,
            login_method: LoginMethod::Google,
            email: None,
            include_implicit_session: true,
            fee_policy: UnattendedFeePolicy::default(),
            fee_handler: None,
        }
    }

    /// The current chain.
    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.chain_id.load(Ordering::Acquire)
    }

    /// The configured session mode.
    #[must_use]
    pub const fn session_mode(&self) -> &SessionMode {
        &self.mode
    }

    /// The configured login method.
    #[must_use]
    pub const fn login_method(&self) -> LoginMethod {
        self.login_method
    }

    /// The session client.
    #[must_use]
    pub const fn client(&self) -> &SessionClient {
        &self.client
    }

    /// The wallet address when a session is active.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.client.address()
    }

    /// Sets or clears the email hint for the next connect.
    pub fn set_email(&self, email: Option<String>) {
        *self.email.write().unwrap_or_else(PoisonError::into_inner) = email;
    }

    /// Replaces the fee-option confirmation handler.
    pub fn set_fee_handler(&self, handler: Option<Arc<dyn FeeOptionConfirmationHandler>>) {
        *self
            .fee_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Registers an event listener.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ProviderEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    /// Removes an event listener; returns whether it was registered.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.events.remove_listener(kind, id)
    }

    /// Switches the current chain and emits `chainChanged`. No I/O.
    pub fn switch_chain(&self, chain_id: ChainId) {
        self.chain_id.store(chain_id, Ordering::Release);
        #[cfg(feature = "telemetry")]
        tracing::info!(chain_id, "Switched chain");
        self.events
            .emit(&ProviderEvent::ChainChanged(to_hex_chain_id(chain_id)));
    }

    /// Ends the session and emits `disconnect`.
    ///
    /// # Errors
    ///
    /// Returns the wallet's error; local state is cleared regardless.
    pub async fn disconnect(&self) -> Result<(), ProviderError> {
        let result = self.client.disconnect().await;
        self.events.emit(&ProviderEvent::Disconnect(RpcErrorObject {
            code: codes::DISCONNECTED,
            message: "Disconnected".into(),
            data: None,
        }));
        result
    }

    /// Handles an EIP-1193 request.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`]; see its variants for the failure modes.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "sessionkit.provider.request", skip_all, fields(method = %args.method), err)
    )]
    pub async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        let chain_id = self.chain_id();
        match Method::from(args.method.as_str()) {
            Method::Accounts => Ok(accounts_value(self.client.address())),
            Method::RequestAccounts => self.request_accounts(chain_id).await,
            Method::ChainId => Ok(Value::String(to_hex_chain_id(chain_id))),
            Method::PersonalSign => {
                let message = sign_message_param(&args.params, 0)?;
                self.client.sign_message(chain_id, &message).await
            }
            Method::EthSign => {
                let message = sign_message_param(&args.params, 1)?;
                self.client.sign_message(chain_id, &message).await
            }
            Method::SignTypedData => {
                let typed_data = typed_data_param(&args.params)?;
                self.client.sign_typed_data(chain_id, &typed_data).await
            }
            Method::SendTransaction => {
                let transaction = transaction_param(&args.params)?;
                self.send_transaction(chain_id, transaction).await
            }
            Method::SwitchChain => {
                self.switch_chain(switch_chain_param(&args.params)?);
                Ok(Value::Null)
            }
            Method::Other(method) => Ok(self.node.request(chain_id, &method, &args.params).await?),
        }
    }

    async fn request_accounts(&self, chain_id: ChainId) -> Result<Value, ProviderError> {
        if let Some(address) = self.client.address() {
            return Ok(accounts_value(Some(address)));
        }
        let session = match &self.mode {
            SessionMode::Implicit => None,
            SessionMode::Explicit(session) => Some(self.prepare_session(session).await?),
        };
        let options = ConnectOptions {
            login_method: self.login_method,
            email: match self.login_method {
                LoginMethod::Email => self
                    .email
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
                _ => None,
            },
            include_implicit_session: self.include_implicit_session,
        };
        let address = self
            .client
            .connect(chain_id, session.as_ref(), &options)
            .await?;
        self.events.emit(&ProviderEvent::Connect {
            chain_id: to_hex_chain_id(chain_id),
        });
        self.events
            .emit(&ProviderEvent::AccountsChanged(vec![address]));
        Ok(accounts_value(Some(address)))
    }

    /// Adds fee-token transfer permissions so the session can pay its own fees.
    async fn prepare_session(
        &self,
        session: &ExplicitSession,
    ) -> Result<ExplicitSession, ProviderError> {
        let fee_tokens = self.fee_tokens.fee_tokens(session.chain_id()).await?;
        let session = session.prepare(&fee_tokens).map_err(|e| match e {
            SessionConfigError::NoPermissions => ProviderError::EmptySessionPermissions,
            other => ProviderError::invalid_params(other.to_string()),
        })?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            chain_id = session.chain_id(),
            permissions = session.permissions().len(),
            fee_required = fee_tokens.is_fee_required,
            "Prepared explicit session"
        );
        Ok(session)
    }

    async fn send_transaction(
        &self,
        chain_id: ChainId,
        transaction: Transaction,
    ) -> Result<Value, ProviderError> {
        let transactions = [transaction];
        let check = self
            .client
            .check_permissions(chain_id, &transactions)
            .await?;
        if !check.has_permission {
            #[cfg(feature = "telemetry")]
            tracing::debug!(chain_id, "Transaction not covered by session, asking wallet");
            let [transaction] = &transactions;
            return self
                .client
                .send_wallet_transaction(chain_id, transaction)
                .await;
        }
        let fee_option = if check.is_implicit {
            None
        } else {
            let options = self.client.fee_options(chain_id, &transactions).await?;
            if options.is_empty() {
                None
            } else {
                Some(
                    self.select_fee_option(chain_id, options, &transactions)
                        .await?,
                )
            }
        };
        let hash = self
            .client
            .send_transaction(chain_id, &transactions, fee_option.as_ref())
            .await?;
        Ok(Value::String(hash.to_string()))
    }

    async fn select_fee_option(
        &self,
        chain_id: ChainId,
        options: Vec<FeeOption>,
        transactions: &[Transaction],
    ) -> Result<FeeOption, ProviderError> {
        let handler = self
            .fee_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(handler) = handler else {
            return match self.fee_policy {
                UnattendedFeePolicy::PreferNative => options
                    .into_iter()
                    .find(FeeOption::is_native)
                    .ok_or(ProviderError::NoNativeFeeOption),
                UnattendedFeePolicy::Reject => Err(ProviderError::UserRejected(
                    "No fee option handler registered".into(),
                )),
            };
        };

        let id = RequestId::generate();
        let decision = handler
            .confirm_fee_option(FeeConfirmationRequest {
                id: id.clone(),
                options: options.clone(),
                transactions: transactions.to_vec(),
                chain_id,
            })
            .await;
        if decision.id != id {
            return Err(ProviderError::FeeConfirmationMismatch {
                expected: id,
                received: decision.id,
            });
        }
        if !decision.confirmed {
            return Err(ProviderError::UserRejected(
                "Fee option confirmation rejected".into(),
            ));
        }
        let chosen = decision.fee_option.ok_or(ProviderError::UnknownFeeOption)?;
        options
            .into_iter()
            .find(|offered| offered.same_token(&chosen))
            .ok_or(ProviderError::UnknownFeeOption)
    }
}

fn accounts_value(address: Option<Address>) -> Value {
    Value::Array(address.map(|a| json!(a)).into_iter().collect())
}

fn positional(params: &Value) -> Result<&[Value], ProviderError> {
    params
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ProviderError::invalid_params("Expected positional params"))
}

/// Extracts the message at `index`: `0x` hex is decoded, anything else is UTF-8 text.
fn sign_message_param(params: &Value, index: usize) -> Result<Bytes, ProviderError> {
    let message = positional(params)?
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::invalid_params("Missing message to sign"))?;
    if message.starts_with("0x") {
        if let Ok(bytes) = message.parse::<Bytes>() {
            return Ok(bytes);
        }
    }
    Ok(Bytes::copy_from_slice(message.as_bytes()))
}

/// Extracts typed data from `[address, typedData]`, parsing JSON-string input.
fn typed_data_param(params: &Value) -> Result<Value, ProviderError> {
    let raw = positional(params)?
        .get(1)
        .ok_or_else(|| ProviderError::invalid_params("Missing typed data"))?;
    let typed_data = match raw {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map_err(|e| ProviderError::invalid_params(format!("Invalid typed data JSON: {e}")))?,
        other => other.clone(),
    };
    let object = typed_data
        .as_object()
        .ok_or_else(|| ProviderError::invalid_params("Typed data must be an object"))?;
    if !object.get("types").is_some_and(Value::is_object) {
        return Err(ProviderError::invalid_params("Typed data is missing 'types'"));
    }
    if !object.get("primaryType").is_some_and(Value::is_string) {
        return Err(ProviderError::invalid_params(
            "Typed data is missing 'primaryType'",
        ));
    }
    if !object.get("message").is_some_and(Value::is_object) {
        return Err(ProviderError::invalid_params("Typed data is missing 'message'"));
    }
    Ok(typed_data)
}

/// Normalizes the first transaction object to `{to, value, data}`.
fn transaction_param(params: &Value) -> Result<Transaction, ProviderError> {
    let object: &Map<String, Value> = positional(params)?
        .first()
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::invalid_params("Missing transaction object"))?;
    let to = object
        .get("to")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::invalid_params("Transaction is missing 'to'"))?
        .parse::<Address>()
        .map_err(|e| ProviderError::invalid_params(format!("Invalid 'to' address: {e}")))?;
    let value = match object.get("value") {
        None | Some(Value::Null) => U256::ZERO,
        Some(Value::String(text)) if text == "0x" => U256::ZERO,
        Some(Value::String(text)) => parse_u256(text.trim())
            .ok_or_else(|| ProviderError::invalid_params(format!("Invalid value '{text}'")))?,
        Some(Value::Number(n)) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| ProviderError::invalid_params(format!("Invalid value '{n}'")))?,
        Some(other) => {
            return Err(ProviderError::invalid_params(format!(
                "Invalid value '{other}'"
            )));
        }
    };
    let data = match object.get("data").or_else(|| object.get("input")) {
        None | Some(Value::Null) => Bytes::new(),
        Some(Value::String(text)) => text
            .parse::<Bytes>()
            .map_err(|e| ProviderError::invalid_params(format!("Invalid calldata: {e}")))?,
        Some(other) => {
            return Err(ProviderError::invalid_params(format!(
                "Invalid calldata '{other}'"
            )));
        }
    };
    Ok(Transaction { to, value, data })
}

fn switch_chain_param(params: &Value) -> Result<ChainId, ProviderError> {
    positional(params)?
        .first()
        .and_then(|p| p.get("chainId"))
        .and_then(parse_chain_id_value)
        .ok_or_else(|| ProviderError::invalid_params("Missing or invalid 'chainId'"))
}
