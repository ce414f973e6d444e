//! Session client: lifecycle, state and response correlation.
//!
//! One [`SessionClient`] mediates all communication with the remote wallet for
//! one dApp session. Its state moves between [`SessionStatus::Uninitialized`]
//! and [`SessionStatus::Active`]; the transition to active happens on a
//! successful connect handshake, the transition back on `disconnect` or when
//! the wallet reports the session gone.
//!
//! # Response correlation
//!
//! Interactive requests are answered through the wallet's shared event stream.
//! Each request registers a oneshot sender under a fresh [`RequestId`] in a
//! correlation table before the request is issued. A router task owned by the
//! client removes the entry when the matching response arrives and fires the
//! sender, so a response resolves at most one waiter and a second response with
//! the same id finds nothing. The waiter's guard also removes the entry when it
//! is dropped, which covers failure and abandonment.
//!
//! If the router falls behind the event stream, the skipped events cannot be
//! replayed: every outstanding waiter fails with a disconnect (4900) instead of
//! waiting for a response that will never be delivered.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, TxHash};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use crate::chain::ChainId;
use crate::error::{ProviderError, RpcErrorObject, codes};
use crate::events::{EventRegistry, ProviderEvent};
use crate::fee::FeeOption;
use crate::session::ExplicitSession;
use crate::wallet::{
    ConnectOptions, PermissionCheck, RequestId, Transaction, WalletError, WalletEvent,
    WalletService,
};

type ActionOutcome = Result<Value, WalletError>;
type PendingTable = DashMap<RequestId, oneshot::Sender<ActionOutcome>>;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session; no address is known.
    #[default]
    Uninitialized,
    /// A session is established for the given wallet address.
    Active(Address),
}

impl SessionStatus {
    /// The wallet address when active.
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        match self {
            Self::Uninitialized => None,
            Self::Active(address) => Some(*address),
        }
    }
}

/// Long-lived client bound to one remote wallet session.
///
/// Must be created inside a Tokio runtime: construction spawns the event
/// router task, which is aborted when the client is dropped.
pub struct SessionClient {
    service: Arc<dyn WalletService>,
    status: Arc<watch::Sender<SessionStatus>>,
    pending: Arc<PendingTable>,
    router: JoinHandle<()>,
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("status", &*self.status.borrow())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.router.abort();
    }
}

impl SessionClient {
    /// Creates a client over `service`, forwarding session changes to `events`.
    pub fn new(service: Arc<dyn WalletService>, events: Arc<EventRegistry>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Uninitialized);
        let status = Arc::new(status);
        let pending: Arc<PendingTable> = Arc::new(DashMap::new());
        let router = tokio::spawn(route_events(
            service.events(),
            Arc::clone(&pending),
            Arc::clone(&status),
            events,
        ));
        Self {
            service,
            status,
            pending,
            router,
        }
    }

    /// Current session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.status(), SessionStatus::Active(_))
    }

    /// The active session's wallet address.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.status().address()
    }

    /// Watches status transitions.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Number of interactive requests awaiting a response.
    #[must_use]
    pub fn pending_responses(&self) -> usize {
        self.pending.len()
    }

    /// Runs the connect handshake and activates the session.
    ///
    /// # Errors
    ///
    /// Returns the wallet's error, or a user rejection if the handshake
    /// completed without yielding an address.
    pub async fn connect(
        &self,
        chain_id: ChainId,
        session: Option<&ExplicitSession>,
        options: &ConnectOptions,
    ) -> Result<Address, ProviderError> {
        let address = self
            .service
            .connect(chain_id, session, options)
            .await?
            .ok_or_else(|| ProviderError::UserRejected("No accounts returned".into()))?;
        self.status.send_replace(SessionStatus::Active(address));
        #[cfg(feature = "telemetry")]
        tracing::info!(chain_id, %address, login = %options.login_method, "Session established");
        Ok(address)
    }

    /// Ends the session.
    ///
    /// Local state is cleared even when the wallet reports an error.
    ///
    /// # Errors
    ///
    /// Returns the wallet's error.
    pub async fn disconnect(&self) -> Result<(), ProviderError> {
        let result = self.service.disconnect().await;
        self.status.send_replace(SessionStatus::Uninitialized);
        #[cfg(feature = "telemetry")]
        tracing::info!("Session disconnected");
        result.map_err(ProviderError::from)
    }

    /// Requests a message signature and waits for the wallet's response.
    ///
    /// # Errors
    ///
    /// Fails if no session is active, the wallet refuses the request, or the
    /// response carries an error (user rejection).
    pub async fn sign_message(
        &self,
        chain_id: ChainId,
        message: &Bytes,
    ) -> Result<Value, ProviderError> {
        self.require_active()?;
        let pending = self.register();
        self.service
            .sign_message(pending.id(), chain_id, message)
            .await?;
        pending.wait().await
    }

    /// Requests an EIP-712 signature and waits for the wallet's response.
    ///
    /// # Errors
    ///
    /// Same as [`sign_message`](Self::sign_message).
    pub async fn sign_typed_data(
        &self,
        chain_id: ChainId,
        typed_data: &Value,
    ) -> Result<Value, ProviderError> {
        self.require_active()?;
        let pending = self.register();
        self.service
            .sign_typed_data(pending.id(), chain_id, typed_data)
            .await?;
        pending.wait().await
    }

    /// Asks the user to confirm `transaction` in the wallet and waits for the hash.
    ///
    /// # Errors
    ///
    /// Same as [`sign_message`](Self::sign_message).
    pub async fn send_wallet_transaction(
        &self,
        chain_id: ChainId,
        transaction: &Transaction,
    ) -> Result<Value, ProviderError> {
        self.require_active()?;
        let pending = self.register();
        self.service
            .send_wallet_transaction(pending.id(), chain_id, transaction)
            .await?;
        pending.wait().await
    }

    /// Submits session-authorized calls through the relayer.
    ///
    /// # Errors
    ///
    /// Fails if no session is active or the wallet reports an error.
    pub async fn send_transaction(
        &self,
        chain_id: ChainId,
        transactions: &[Transaction],
        fee_option: Option<&FeeOption>,
    ) -> Result<TxHash, ProviderError> {
        self.require_active()?;
        Ok(self
            .service
            .send_transaction(chain_id, transactions, fee_option)
            .await?)
    }

    /// Asks whether the session covers `transactions`.
    ///
    /// # Errors
    ///
    /// Fails if no session is active or the wallet reports an error.
    pub async fn check_permissions(
        &self,
        chain_id: ChainId,
        transactions: &[Transaction],
    ) -> Result<PermissionCheck, ProviderError> {
        self.require_active()?;
        Ok(self
            .service
            .check_permissions(chain_id, transactions)
            .await?)
    }

    /// Fetches relayer fee quotes for `transactions`.
    ///
    /// # Errors
    ///
    /// Returns the wallet's error.
    pub async fn fee_options(
        &self,
        chain_id: ChainId,
        transactions: &[Transaction],
    ) -> Result<Vec<FeeOption>, ProviderError> {
        Ok(self.service.fee_options(chain_id, transactions).await?)
    }

    fn require_active(&self) -> Result<Address, ProviderError> {
        self.address()
            .ok_or_else(|| ProviderError::Unauthorized("No active wallet session".into()))
    }

    fn register(&self) -> PendingResponse {
        let id = RequestId::generate();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);
        PendingResponse {
            id,
            rx,
            table: Arc::clone(&self.pending),
        }
    }
}

/// One outstanding interactive request.
///
/// Dropping it removes the correlation entry.
struct PendingResponse {
    id: RequestId,
    rx: oneshot::Receiver<ActionOutcome>,
    table: Arc<PendingTable>,
}

impl PendingResponse {
    const fn id(&self) -> &RequestId {
        &self.id
    }

    async fn wait(mut self) -> Result<Value, ProviderError> {
        match (&mut self.rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(ProviderError::UserRejected(error.message)),
            Err(_) => Err(ProviderError::Disconnected(
                "Wallet response lost before it arrived".into(),
            )),
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}

async fn route_events(
    mut events_rx: broadcast::Receiver<WalletEvent>,
    pending: Arc<PendingTable>,
    status: Arc<watch::Sender<SessionStatus>>,
    events: Arc<EventRegistry>,
) {
    loop {
        match events_rx.recv().await {
            Ok(WalletEvent::WalletActionResponse(response)) => {
                if let Some((_, tx)) = pending.remove(&response.id) {
                    let _ = tx.send(response.outcome);
                } else {
                    #[cfg(feature = "telemetry")]
                    tracing::debug!(id = %response.id, "Ignoring response for unknown request");
                }
            }
            Ok(WalletEvent::SessionsUpdated { address }) => {
                apply_sessions_updated(address, &status, &events);
            }
            Err(RecvError::Lagged(_skipped)) => {
                // Skipped events may hold responses; no waiter can rely on its entry.
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    skipped = _skipped,
                    pending = pending.len(),
                    "Wallet event stream lagged, failing pending requests"
                );
                pending.clear();
            }
            Err(RecvError::Closed) => break,
        }
    }
    // Dropping the senders wakes every waiter with a disconnect.
    pending.clear();
}

fn apply_sessions_updated(
    address: Option<Address>,
    status: &watch::Sender<SessionStatus>,
    events: &EventRegistry,
) {
    let next = address.map_or(SessionStatus::Uninitialized, SessionStatus::Active);
    let previous = status.send_replace(next);
    if previous == next {
        return;
    }
    #[cfg(feature = "telemetry")]
    tracing::info!(?previous, ?next, "Wallet sessions updated");
    match next {
        SessionStatus::Active(address) => {
            events.emit(&ProviderEvent::AccountsChanged(vec![address]));
        }
        SessionStatus::Uninitialized => {
            events.emit(&ProviderEvent::Disconnect(RpcErrorObject {
                code: codes::DISCONNECTED,
                message: "Wallet session ended".into(),
                data: None,
            }));
        }
    }
}
