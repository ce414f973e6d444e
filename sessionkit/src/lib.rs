#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types and EIP-1193 provider for session-scoped smart wallets.
//!
//! A dApp talks to a remote smart wallet through a long-lived session. The
//! session may carry an explicit, bounded delegation (a value limit, a
//! deadline and a set of contract-call permissions) and may additionally be
//! covered by an implicit grant issued by the wallet. This crate decides,
//! per request, whether an action is already authorized by the session or
//! needs an interactive round-trip with the wallet, and negotiates which
//! token pays network fees when the relayer requires it.
//!
//! # Modules
//!
//! - [`chain`] - Chain id formatting and parsing helpers
//! - [`networks`] - Registry of well-known EVM networks
//! - [`timestamp`] - Unix timestamps used for session deadlines
//! - [`permission`] - Contract-call permissions built from function signatures
//! - [`session`] - Explicit session configuration and the implicit/explicit mode switch
//! - [`fee`] - Relayer fee tokens, fee options and the confirmation handler seam
//! - [`wallet`] - Contract consumed from the remote wallet session service
//! - [`client`] - Session client: lifecycle, state and response correlation
//! - [`events`] - Per-provider EIP-1193 event registry
//! - [`rpc`] - Request arguments, method dispatch keys and transport traits
//! - [`provider`] - The EIP-1193 provider adapter
//! - [`connector`] - Wallet-framework connector glue and persisted login state
//! - [`config`] - Provider configuration
//! - [`error`] - Error types surfaced to callers
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod chain;
pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod events;
pub mod fee;
pub mod networks;
pub mod permission;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod timestamp;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use client::SessionClient;
pub use config::ProviderConfig;
pub use connector::SessionConnector;
pub use error::ProviderError;
pub use provider::SessionProvider;
