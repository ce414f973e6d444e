//! Default endpoints and header names.

/// Default relayer URL template; `{network}` is replaced by the network name.
pub const DEFAULT_RELAYER_URL_TEMPLATE: &str = "https://{network}-relayer.sequence.app";

/// Default node URL template; `{network}` is replaced by the network name.
pub const DEFAULT_NODE_URL_TEMPLATE: &str = "https://nodes.sequence.app/{network}";

/// Hosts whose node URLs take the project access key as a trailing path segment.
pub const DEFAULT_ACCESS_KEY_HOSTS: &[&str] = &["sequence.app"];

/// Placeholder substituted in URL templates.
pub const NETWORK_PLACEHOLDER: &str = "{network}";

/// Header carrying the project access key on relayer requests (`X-Access-Key`).
pub const ACCESS_KEY_HEADER: &str = "x-access-key";

/// Relayer RPC path returning the accepted fee tokens.
pub const FEE_TOKENS_PATH: &str = "rpc/Relayer/FeeTokens";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
