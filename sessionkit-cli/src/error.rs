//! CLI error type.

use sessionkit::error::TransportError;
use sessionkit::session::SessionConfigError;

/// Errors surfaced by the `sessionkit` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be read.
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`CliConfig`](crate::config::CliConfig).
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The explicit session description is invalid.
    #[error("Invalid session: {0}")]
    Session(#[from] SessionConfigError),

    /// A relayer or node request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// JSON input or output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The chain argument is neither a known network name nor a chain id.
    #[error("Unknown chain '{0}'")]
    UnknownChain(String),
}
