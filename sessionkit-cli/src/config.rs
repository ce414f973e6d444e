//! CLI configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! access_key = "$SEQUENCE_ACCESS_KEY"
//!
//! [provider]
//! chain_id = 137
//! login_method = "google"
//!
//! [provider.session]
//! value_limit = "0"
//! expiry = { days = 7 }
//!
//! [[provider.session.permissions]]
//! target = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"
//! function = "function approve(address spender, uint256 value)"
//!
//! [relayer]
//! url_template = "https://{network}-relayer.sequence.app"
//!
//! [node]
//! url_template = "https://nodes.sequence.app/{network}"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sessionkit::ProviderConfig;
use sessionkit_http::constants::{
    DEFAULT_NODE_URL_TEMPLATE, DEFAULT_RELAYER_URL_TEMPLATE, DEFAULT_TIMEOUT_SECS,
};
use sessionkit_http::{NodeEndpoint, RelayerEndpoint};

use crate::error::CliError;

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    /// Project access key shared by the relayer and node endpoints.
    #[serde(default)]
    pub access_key: Option<String>,

    /// Provider settings, including the explicit session to plan.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Relayer endpoint settings.
    #[serde(default)]
    pub relayer: EndpointConfig,

    /// Node endpoint settings.
    #[serde(default)]
    pub node: EndpointConfig,
}

/// URL template and timeout of one HTTP endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    /// URL template containing `{network}`; the built-in default when absent.
    #[serde(default)]
    pub url_template: Option<String>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Hosts that take the access key as a path segment (node only).
    #[serde(default)]
    pub access_key_hosts: Option<Vec<String>>,
}

impl EndpointConfig {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl CliConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults. All `$VAR` / `${VAR}` references
    /// are expanded from the process environment before parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            String::new()
        };
        let expanded = expand_env_vars(&content);
        Ok(toml::from_str(&expanded)?)
    }

    /// Relayer endpoint built from this configuration.
    #[must_use]
    pub fn relayer_endpoint(&self) -> RelayerEndpoint {
        let template = self
            .relayer
            .url_template
            .clone()
            .unwrap_or_else(|| DEFAULT_RELAYER_URL_TEMPLATE.to_owned());
        let mut endpoint = RelayerEndpoint::new(template).with_timeout(self.relayer.timeout());
        if let Some(key) = &self.access_key {
            endpoint = endpoint.with_access_key(key.clone());
        }
        endpoint
    }

    /// Node endpoint built from this configuration.
    #[must_use]
    pub fn node_endpoint(&self) -> NodeEndpoint {
        let template = self
            .node
            .url_template
            .clone()
            .unwrap_or_else(|| DEFAULT_NODE_URL_TEMPLATE.to_owned());
        let mut endpoint = NodeEndpoint::new(template).with_timeout(self.node.timeout());
        if let Some(key) = &self.access_key {
            endpoint = endpoint.with_access_key(key.clone());
        }
        if let Some(hosts) = &self.node.access_key_hosts {
            endpoint = endpoint.with_access_key_hosts(hosts.iter().cloned());
        }
        endpoint
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionkit::wallet::LoginMethod;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "KEY" => Some("abc123".to_owned()),
            "CHAIN" => Some("137".to_owned()),
            _ => None,
        }
    }

    #[test]
    fn test_expands_plain_and_braced_vars() {
        assert_eq!(expand_with("key = \"$KEY\"", lookup), "key = \"abc123\"");
        assert_eq!(expand_with("id = ${CHAIN}", lookup), "id = 137");
        assert_eq!(expand_with("${KEY}-suffix", lookup), "abc123-suffix");
    }

    #[test]
    fn test_unresolved_vars_are_left_as_is() {
        assert_eq!(expand_with("$MISSING and ${ALSO}", lookup), "$MISSING and ${ALSO}");
        assert_eq!(expand_with("cost: $", lookup), "cost: $");
        assert_eq!(expand_with("${UNCLOSED", lookup), "${UNCLOSED");
    }

    #[test]
    fn test_parses_full_config() {
        let config: CliConfig = toml::from_str(
            r#"
            access_key = "abc123"

            [provider]
            chain_id = 137
            login_method = "email"
            email = "user@example.com"

            [provider.session]
            value_limit = "1000"
            expiry = { days = 7 }

            [[provider.session.permissions]]
            target = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"
            function = "function approve(address spender, uint256 value)"

            [node]
            url_template = "https://rpc.example.org/{network}"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.chain_id, 137);
        assert_eq!(config.provider.login_method, LoginMethod::Email);
        assert!(config.provider.session.is_some());

        let node = config.node_endpoint();
        assert_eq!(node.template, "https://rpc.example.org/{network}");
        assert_eq!(node.timeout, Duration::from_secs(5));
        assert_eq!(node.access_key.as_deref(), Some("abc123"));

        let relayer = config.relayer_endpoint();
        assert_eq!(relayer.template, DEFAULT_RELAYER_URL_TEMPLATE);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.access_key.is_none());
        assert!(config.provider.session.is_none());
        assert_eq!(config.node_endpoint().template, DEFAULT_NODE_URL_TEMPLATE);
    }
}
