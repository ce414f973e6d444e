#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transports for the sessionkit provider.
//!
//! Implements the provider's two HTTP seams over `reqwest`:
//! [`HttpRelayer`] answers [`FeeTokenSource`](sessionkit::rpc::FeeTokenSource)
//! from the relayer's fee-token endpoint, and [`HttpNodeRpc`] forwards
//! JSON-RPC calls to a per-chain node as
//! [`NodeRpc`](sessionkit::rpc::NodeRpc).
//!
//! Both resolve their URL per chain from a template containing `{network}`,
//! substituted with the network name from [`sessionkit::networks`].
//!
//! # Modules
//!
//! - [`constants`] - Default URL templates, header names and paths
//! - [`endpoint`] - URL template resolution
//! - [`relayer`] - Relayer fee-token client
//! - [`node`] - JSON-RPC node client
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for outgoing requests

pub mod constants;
pub mod endpoint;
pub mod node;
pub mod relayer;

mod transport;

pub use endpoint::{NodeEndpoint, RelayerEndpoint};
pub use node::HttpNodeRpc;
pub use relayer::HttpRelayer;
