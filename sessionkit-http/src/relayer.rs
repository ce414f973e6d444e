//! Relayer fee-token client.
//!
//! The relayer quotes and accepts fee payment for the transactions it
//! executes. Before an explicit session is requested, the provider asks the
//! relayer which tokens it accepts so the session can be granted permission to
//! pay with each of them.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::json;
use sessionkit::chain::ChainId;
use sessionkit::error::TransportError;
use sessionkit::fee::FeeTokens;
use sessionkit::rpc::{BoxFuture, FeeTokenSource};
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::constants::{ACCESS_KEY_HEADER, FEE_TOKENS_PATH};
use crate::endpoint::RelayerEndpoint;
use crate::transport::{client_or_default, post_json};

/// HTTP client for the relayer's RPC service.
#[derive(Debug, Clone)]
pub struct HttpRelayer {
    endpoint: RelayerEndpoint,
    client: reqwest::Client,
}

impl HttpRelayer {
    /// Creates a relayer client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    pub fn new(endpoint: RelayerEndpoint) -> Result<Self, TransportError> {
        let client = client_or_default(endpoint.http_client.clone(), endpoint.timeout)?;
        Ok(Self { endpoint, client })
    }

    /// The endpoint configuration.
    #[must_use]
    pub const fn endpoint(&self) -> &RelayerEndpoint {
        &self.endpoint
    }

    /// URL of the fee-token RPC for `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Template`] if the URL cannot be resolved.
    pub fn fee_tokens_url(&self, chain_id: ChainId) -> Result<Url, TransportError> {
        let base = self.endpoint.resolve(chain_id)?;
        let url = format!("{}/{FEE_TOKENS_PATH}", base.as_str().trim_end_matches('/'));
        Url::parse(&url).map_err(|e| TransportError::Template(format!("{url}: {e}")))
    }

    /// Fetches the tokens the relayer accepts for fees on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on URL, network, status or decode failure.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "sessionkit.relayer.fee_tokens", skip(self), err)
    )]
    pub async fn fetch_fee_tokens(&self, chain_id: ChainId) -> Result<FeeTokens, TransportError> {
        let url = self.fee_tokens_url(chain_id)?;
        post_json(&self.client, url, self.headers()?, &json!({})).await
    }

    fn headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.endpoint.access_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| TransportError::Network(format!("Invalid access key: {e}")))?;
            headers.insert(HeaderName::from_static(ACCESS_KEY_HEADER), value);
        }
        Ok(headers)
    }
}

impl FeeTokenSource for HttpRelayer {
    fn fee_tokens(&self, chain_id: ChainId) -> BoxFuture<'_, Result<FeeTokens, TransportError>> {
        Box::pin(self.fetch_fee_tokens(chain_id))
    }
}
