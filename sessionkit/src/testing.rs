//! Scripted collaborators for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, address, b256};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::chain::ChainId;
use crate::error::TransportError;
use crate::fee::{FeeOption, FeeToken, FeeTokenType, FeeTokens};
use crate::rpc::{BoxFuture, FeeTokenSource, NodeRpc};
use crate::session::ExplicitSession;
use crate::wallet::{
    ConnectOptions, PermissionCheck, RequestId, Transaction, WalletActionResponse, WalletError,
    WalletEvent, WalletService,
};

pub const WALLET: Address = address!("0x1111111111111111111111111111111111111111");
pub const USDC: Address = address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359");
pub const TX_HASH: TxHash =
    b256!("0xabababababababababababababababababababababababababababababababab");

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn native_token(chain_id: ChainId) -> FeeToken {
    FeeToken {
        chain_id,
        name: "Polygon".into(),
        symbol: "POL".into(),
        token_type: FeeTokenType::Unknown,
        decimals: Some(18),
        logo_url: None,
        contract_address: None,
        token_id: None,
    }
}

pub fn erc20_token(chain_id: ChainId, symbol: &str, contract: Address) -> FeeToken {
    FeeToken {
        chain_id,
        name: symbol.into(),
        symbol: symbol.into(),
        token_type: FeeTokenType::Erc20Token,
        decimals: Some(6),
        logo_url: None,
        contract_address: Some(contract),
        token_id: None,
    }
}

pub fn fee_option(token: FeeToken, value: &str) -> FeeOption {
    FeeOption {
        token,
        to: address!("0x2222222222222222222222222222222222222222"),
        value: value.into(),
        gas_limit: 100_000,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalletCall {
    Connect {
        chain_id: ChainId,
        session: Option<ExplicitSession>,
        options: ConnectOptions,
    },
    SignMessage {
        chain_id: ChainId,
        message: Bytes,
    },
    SignTypedData {
        chain_id: ChainId,
        typed_data: Value,
    },
    SendTransaction {
        chain_id: ChainId,
        transactions: Vec<Transaction>,
        fee_option: Option<FeeOption>,
    },
    SendWalletTransaction {
        chain_id: ChainId,
        transaction: Transaction,
    },
    CheckPermissions {
        chain_id: ChainId,
    },
    FeeOptions {
        chain_id: ChainId,
    },
    Disconnect,
}

struct Script {
    connect_address: Option<Address>,
    auto_respond: bool,
    action_outcome: Result<Value, WalletError>,
    interactive_error: Option<WalletError>,
    permission: PermissionCheck,
    fee_options: Vec<FeeOption>,
    pending_ids: Vec<RequestId>,
    calls: Vec<WalletCall>,
}

/// Remote wallet double that records every call and answers from a script.
///
/// Interactive requests are answered on the event stream right away unless
/// auto-respond is switched off.
pub struct MockWallet {
    events: broadcast::Sender<WalletEvent>,
    script: Mutex<Script>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            events,
            script: Mutex::new(Script {
                connect_address: Some(WALLET),
                auto_respond: true,
                action_outcome: Ok(Value::String("0xsigned".into())),
                interactive_error: None,
                permission: PermissionCheck::NONE,
                fee_options: Vec::new(),
                pending_ids: Vec::new(),
                calls: Vec::new(),
            }),
        })
    }

    pub fn set_connect_address(&self, address: Option<Address>) {
        self.script.lock().unwrap().connect_address = address;
    }

    pub fn set_auto_respond(&self, auto_respond: bool) {
        self.script.lock().unwrap().auto_respond = auto_respond;
    }

    pub fn set_action_outcome(&self, outcome: Result<Value, WalletError>) {
        self.script.lock().unwrap().action_outcome = outcome;
    }

    pub fn fail_interactive_requests(&self, error: WalletError) {
        self.script.lock().unwrap().interactive_error = Some(error);
    }

    pub fn set_permission(&self, check: PermissionCheck) {
        self.script.lock().unwrap().permission = check;
    }

    pub fn set_fee_options(&self, options: Vec<FeeOption>) {
        self.script.lock().unwrap().fee_options = options;
    }

    pub fn pending_ids(&self) -> Vec<RequestId> {
        self.script.lock().unwrap().pending_ids.clone()
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    fn record(&self, call: WalletCall) {
        self.script.lock().unwrap().calls.push(call);
    }

    fn interactive(&self, id: &RequestId, call: WalletCall) -> Result<(), WalletError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        if let Some(error) = script.interactive_error.clone() {
            return Err(error);
        }
        script.pending_ids.push(id.clone());
        if script.auto_respond {
            let outcome = script.action_outcome.clone();
            drop(script);
            self.emit(WalletEvent::WalletActionResponse(WalletActionResponse {
                id: id.clone(),
                outcome,
            }));
        }
        Ok(())
    }
}

impl WalletService for MockWallet {
    fn events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn connect<'a>(
        &'a self,
        chain_id: ChainId,
        session: Option<&'a ExplicitSession>,
        options: &'a ConnectOptions,
    ) -> BoxFuture<'a, Result<Option<Address>, WalletError>> {
        self.record(WalletCall::Connect {
            chain_id,
            session: session.cloned(),
            options: options.clone(),
        });
        let address = self.script.lock().unwrap().connect_address;
        Box::pin(async move { Ok(address) })
    }

    fn sign_message<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        message: &'a Bytes,
    ) -> BoxFuture<'a, Result<(), WalletError>> {
        let result = self.interactive(
            id,
            WalletCall::SignMessage {
                chain_id,
                message: message.clone(),
            },
        );
        Box::pin(async move { result })
    }

    fn sign_typed_data<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        typed_data: &'a Value,
    ) -> BoxFuture<'a, Result<(), WalletError>> {
        let result = self.interactive(
            id,
            WalletCall::SignTypedData {
                chain_id,
                typed_data: typed_data.clone(),
            },
        );
        Box::pin(async move { result })
    }

    fn send_transaction<'a>(
        &'a self,
        chain_id: ChainId,
        transactions: &'a [Transaction],
        fee_option: Option<&'a FeeOption>,
    ) -> BoxFuture<'a, Result<TxHash, WalletError>> {
        self.record(WalletCall::SendTransaction {
            chain_id,
            transactions: transactions.to_vec(),
            fee_option: fee_option.cloned(),
        });
        Box::pin(async move { Ok(TX_HASH) })
    }

    fn send_wallet_transaction<'a>(
        &'a self,
        id: &'a RequestId,
        chain_id: ChainId,
        transaction: &'a Transaction,
    ) -> BoxFuture<'a, Result<(), WalletError>> {
        let result = self.interactive(
            id,
            WalletCall::SendWalletTransaction {
                chain_id,
                transaction: transaction.clone(),
            },
        );
        Box::pin(async move { result })
    }

    fn check_permissions<'a>(
        &'a self,
        chain_id: ChainId,
        _transactions: &'a [Transaction],
    ) -> BoxFuture<'a, Result<PermissionCheck, WalletError>> {
        self.record(WalletCall::CheckPermissions { chain_id });
        let check = self.script.lock().unwrap().permission;
        Box::pin(async move { Ok(check) })
    }

    fn fee_options<'a>(
        &'a self,
        chain_id: ChainId,
        _transactions: &'a [Transaction],
    ) -> BoxFuture<'a, Result<Vec<FeeOption>, WalletError>> {
        self.record(WalletCall::FeeOptions { chain_id });
        let options = self.script.lock().unwrap().fee_options.clone();
        Box::pin(async move { Ok(options) })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>> {
        self.record(WalletCall::Disconnect);
        Box::pin(async { Ok(()) })
    }
}

/// Fee-token source answering with a fixed response and counting calls.
pub struct MockFeeTokens {
    response: Result<FeeTokens, TransportError>,
    calls: AtomicUsize,
}

impl MockFeeTokens {
    pub fn new(response: Result<FeeTokens, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeeTokenSource for MockFeeTokens {
    fn fee_tokens(&self, _chain_id: ChainId) -> BoxFuture<'_, Result<FeeTokens, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

/// Node double answering every method with a fixed response.
pub struct MockNode {
    response: Result<Value, TransportError>,
    calls: Mutex<Vec<(ChainId, String, Value)>>,
}

impl MockNode {
    pub fn new(response: Result<Value, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(ChainId, String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl NodeRpc for MockNode {
    fn request<'a>(
        &'a self,
        chain_id: ChainId,
        method: &'a str,
        params: &'a Value,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        self.calls
            .lock()
            .unwrap()
            .push((chain_id, method.to_owned(), params.clone()));
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}
