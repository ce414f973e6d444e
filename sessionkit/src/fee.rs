//! Relayer fee tokens, fee options and fee-option confirmation.
//!
//! Before the relayer executes an explicitly authorized transaction it may
//! quote one [`FeeOption`] per token it accepts as payment. The caller picks
//! one through a [`FeeOptionConfirmationHandler`]; the pick is only honoured
//! when it echoes the correlation id it was issued with.

use std::fmt;
use std::future::Future;

use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize};

use crate::chain::ChainId;
use crate::rpc::BoxFuture;
use crate::wallet::{RequestId, Transaction};

/// Token standard of a fee token, as reported by the relayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeTokenType {
    /// The chain's native asset, or a token the relayer could not classify.
    Unknown,
    /// An ERC-20 token.
    Erc20Token,
    /// An ERC-1155 token.
    Erc1155Token,
}

/// A token the relayer accepts as payment for network fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeToken {
    /// Chain the token lives on.
    #[serde(default)]
    pub chain_id: ChainId,
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Token standard.
    #[serde(rename = "type")]
    pub token_type: FeeTokenType,
    /// Decimals, when known.
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Logo URL, when known.
    #[serde(default, rename = "logoURL")]
    pub logo_url: Option<String>,
    /// Contract address; absent for the native asset.
    #[serde(default, deserialize_with = "deserialize_optional_address")]
    pub contract_address: Option<Address>,
    /// Token id for ERC-1155 fee tokens.
    #[serde(default, rename = "tokenID")]
    pub token_id: Option<String>,
}

impl FeeToken {
    /// Whether this token is the chain's native asset.
    ///
    /// Relayers report the native asset with a null contract address, but a
    /// zero address is treated the same way.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.contract_address.is_none_or(|a| a == Address::ZERO)
    }
}

/// Relayer response listing accepted fee tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTokens {
    /// Whether the relayer charges fees on this chain.
    pub is_fee_required: bool,
    /// Accepted tokens.
    #[serde(default)]
    pub tokens: Vec<FeeToken>,
}

impl FeeTokens {
    /// A response for fee-less chains.
    #[must_use]
    pub const fn not_required() -> Self {
        Self {
            is_fee_required: false,
            tokens: Vec::new(),
        }
    }
}

/// A relayer quote for paying one transaction's fees in one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOption {
    /// The token to pay with.
    pub token: FeeToken,
    /// Fee recipient.
    pub to: Address,
    /// Quoted amount in the token's smallest unit, as a decimal string.
    pub value: String,
    /// Gas limit the quote was computed for.
    #[serde(default)]
    pub gas_limit: u64,
}

impl FeeOption {
    /// Whether this option pays with the native asset.
    #[must_use]
    pub fn is_native(&self) -> bool {
        self.token.is_native()
    }

    /// Whether two options pay with the same token.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        match (self.is_native(), other.is_native()) {
            (true, true) => true,
            (false, false) => {
                self.token.contract_address == other.token.contract_address
                    && self.token.token_id == other.token.token_id
            }
            _ => false,
        }
    }
}

/// A pending fee decision handed to the [`FeeOptionConfirmationHandler`].
///
/// Exists only between "fee options fetched" and "decision received".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfirmationRequest {
    /// Correlation id the handler must echo.
    pub id: RequestId,
    /// Candidate fee options quoted by the relayer.
    pub options: Vec<FeeOption>,
    /// The transactions awaiting submission.
    pub transactions: Vec<Transaction>,
    /// Chain the transactions target.
    pub chain_id: ChainId,
}

/// The caller's fee decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfirmation {
    /// Echo of [`FeeConfirmationRequest::id`].
    pub id: RequestId,
    /// The chosen option, when confirmed.
    pub fee_option: Option<FeeOption>,
    /// Whether the caller approved paying the fee.
    pub confirmed: bool,
}

impl FeeConfirmation {
    /// Approves `option` for request `id`.
    #[must_use]
    pub const fn confirm(id: RequestId, option: FeeOption) -> Self {
        Self {
            id,
            fee_option: Some(option),
            confirmed: true,
        }
    }

    /// Rejects request `id`.
    #[must_use]
    pub const fn reject(id: RequestId) -> Self {
        Self {
            id,
            fee_option: None,
            confirmed: false,
        }
    }
}

/// Lets the host application choose which token pays network fees.
///
/// The provider awaits the returned future to completion before it
/// proceeds. The echoed id is the only guard against a response being
/// matched to the wrong transaction when several sends are in flight.
pub trait FeeOptionConfirmationHandler: Send + Sync {
    /// Asks the user to confirm one of `request.options`.
    fn confirm_fee_option(&self, request: FeeConfirmationRequest)
    -> BoxFuture<'_, FeeConfirmation>;
}

/// [`FeeOptionConfirmationHandler`] backed by an async closure.
pub struct CallbackFeeHandler<F> {
    callback: F,
}

impl<F> fmt::Debug for CallbackFeeHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFeeHandler").finish_non_exhaustive()
    }
}

impl<F, Fut> CallbackFeeHandler<F>
where
    F: Fn(FeeConfirmationRequest) -> Fut + Send + Sync,
    Fut: Future<Output = FeeConfirmation> + Send + 'static,
{
    /// Wraps `callback`.
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F, Fut> FeeOptionConfirmationHandler for CallbackFeeHandler<F>
where
    F: Fn(FeeConfirmationRequest) -> Fut + Send + Sync,
    Fut: Future<Output = FeeConfirmation> + Send + 'static,
{
    fn confirm_fee_option(
        &self,
        request: FeeConfirmationRequest,
    ) -> BoxFuture<'_, FeeConfirmation> {
        Box::pin((self.callback)(request))
    }
}

/// What to do when fee options exist but no handler is registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnattendedFeePolicy {
    /// Pay with the native asset without asking.
    #[default]
    PreferNative,
    /// Refuse to send; the user must register a handler.
    Reject,
}

fn deserialize_optional_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fee_tokens_from_relayer_json() {
        let tokens: FeeTokens = serde_json::from_value(json!({
            "isFeeRequired": true,
            "tokens": [
                { "chainId": 137, "name": "Polygon", "symbol": "POL", "type": "UNKNOWN",
                  "decimals": 18, "logoURL": "", "contractAddress": null },
                { "chainId": 137, "name": "USD Coin", "symbol": "USDC", "type": "ERC20_TOKEN",
                  "decimals": 6, "logoURL": "",
                  "contractAddress": "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359" }
            ]
        }))
        .unwrap();
        assert!(tokens.is_fee_required);
        assert!(tokens.tokens[0].is_native());
        assert!(!tokens.tokens[1].is_native());
        assert_eq!(tokens.tokens[1].token_type, FeeTokenType::Erc20Token);
    }

    #[test]
    fn test_zero_and_empty_addresses_are_native() {
        let token: FeeToken = serde_json::from_value(json!({
            "name": "Ether", "symbol": "ETH", "type": "UNKNOWN", "contractAddress": ""
        }))
        .unwrap();
        assert!(token.is_native());

        let token: FeeToken = serde_json::from_value(json!({
            "name": "Ether", "symbol": "ETH", "type": "UNKNOWN",
            "contractAddress": "0x0000000000000000000000000000000000000000"
        }))
        .unwrap();
        assert!(token.is_native());
    }

    #[tokio::test]
    async fn test_callback_handler_echoes_request() {
        let handler = CallbackFeeHandler::new(|req: FeeConfirmationRequest| async move {
            FeeConfirmation::reject(req.id)
        });
        let id = RequestId::from("fee-1");
        let decision = handler
            .confirm_fee_option(FeeConfirmationRequest {
                id: id.clone(),
                options: vec![],
                transactions: vec![],
                chain_id: 1,
            })
            .await;
        assert_eq!(decision.id, id);
        assert!(!decision.confirmed);
    }
}
