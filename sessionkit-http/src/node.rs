//! JSON-RPC node client.
//!
//! Every method the provider does not handle itself is forwarded verbatim to
//! a node for the request's chain.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessionkit::chain::ChainId;
use sessionkit::error::{RpcErrorObject, TransportError};
use sessionkit::rpc::{BoxFuture, NodeRpc};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::endpoint::NodeEndpoint;
use crate::transport::{client_or_default, post_json};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// HTTP JSON-RPC client resolving the node URL per chain.
#[derive(Debug)]
pub struct HttpNodeRpc {
    endpoint: NodeEndpoint,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpNodeRpc {
    /// Creates a node client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the HTTP client cannot be built.
    pub fn new(endpoint: NodeEndpoint) -> Result<Self, TransportError> {
        let client = client_or_default(endpoint.http_client.clone(), endpoint.timeout)?;
        Ok(Self {
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint configuration.
    #[must_use]
    pub const fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    /// Sends one JSON-RPC call to the node serving `chain_id`.
    ///
    /// Missing params are sent as an empty array.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Rpc`] when the node answers with an error
    /// object, and other [`TransportError`] variants on URL, network, status
    /// or decode failure.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "sessionkit.node.request", skip(self, params), err)
    )]
    pub async fn call(
        &self,
        chain_id: ChainId,
        method: &str,
        params: &Value,
    ) -> Result<Value, TransportError> {
        let url = self.endpoint.resolve(chain_id)?;
        let empty = Value::Array(Vec::new());
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: if params.is_null() { &empty } else { params },
        };
        let response: JsonRpcResponse =
            post_json(&self.client, url, HeaderMap::new(), &request).await?;
        match response.error {
            Some(error) => Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }
}

impl NodeRpc for HttpNodeRpc {
    fn request<'a>(
        &'a self,
        chain_id: ChainId,
        method: &'a str,
        params: &'a Value,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(self.call(chain_id, method, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn node(server: &MockServer) -> HttpNodeRpc {
        HttpNodeRpc::new(
            NodeEndpoint::new(format!("{}/{{network}}", server.uri()))
                .with_access_key("project-key")
                .with_access_key_hosts(["127.0.0.1"]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_forwards_json_rpc_with_access_key_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/base/project-key"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": []
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x10" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = node(&server)
            .request(8453, "eth_blockNumber", &Value::Null)
            .await
            .unwrap();
        assert_eq!(result, json!("0x10"));
    }

    #[tokio::test]
    async fn test_error_object_keeps_its_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "execution reverted", "data": "0x08c379a0" }
            })))
            .mount(&server)
            .await;

        let err = node(&server)
            .request(1, "eth_call", &json!([{ "to": "0x0000000000000000000000000000000000000000" }, "latest"]))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
                data: Some(json!("0x08c379a0")),
            }
        );
    }

    #[tokio::test]
    async fn test_non_ok_status_maps_to_internal_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = node(&server)
            .request(1, "eth_blockNumber", &json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Http { status: 503, .. }));
        let provider_err = sessionkit::ProviderError::from(err);
        assert_eq!(
            provider_err.code(),
            Some(sessionkit::error::codes::INTERNAL_ERROR)
        );
    }

    #[tokio::test]
    async fn test_unknown_chain_is_template_error() {
        let server = MockServer::start().await;
        let err = node(&server)
            .request(31_337_000, "eth_blockNumber", &json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Template(_)));
    }
}
