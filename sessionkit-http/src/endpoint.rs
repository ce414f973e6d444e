//! URL template resolution for relayer and node endpoints.

use std::fmt;
use std::time::Duration;

use sessionkit::chain::ChainId;
use sessionkit::error::TransportError;
use sessionkit::networks::network_name;
use url::Url;

use crate::constants::{
    DEFAULT_ACCESS_KEY_HOSTS, DEFAULT_NODE_URL_TEMPLATE, DEFAULT_RELAYER_URL_TEMPLATE,
    DEFAULT_TIMEOUT_SECS, NETWORK_PLACEHOLDER,
};

/// Substitutes the chain's network name into `template` and parses the result.
///
/// # Errors
///
/// Returns [`TransportError::Template`] if the chain is unknown or the result
/// is not a valid URL.
pub fn resolve_template(template: &str, chain_id: ChainId) -> Result<Url, TransportError> {
    let url = if template.contains(NETWORK_PLACEHOLDER) {
        let network = network_name(chain_id)
            .ok_or_else(|| TransportError::Template(format!("unknown chain {chain_id}")))?;
        template.replace(NETWORK_PLACEHOLDER, network)
    } else {
        template.to_owned()
    };
    Url::parse(&url).map_err(|e| TransportError::Template(format!("{url}: {e}")))
}

/// Relayer endpoint configuration.
#[derive(Clone)]
pub struct RelayerEndpoint {
    /// URL template containing `{network}`.
    pub template: String,
    /// Project access key, sent as the `X-Access-Key` header.
    pub access_key: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Optional pre-configured client. If `None`, one is built with `timeout`.
    pub http_client: Option<reqwest::Client>,
}

impl Default for RelayerEndpoint {
    fn default() -> Self {
        Self {
            template: DEFAULT_RELAYER_URL_TEMPLATE.to_owned(),
            access_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http_client: None,
        }
    }
}

impl fmt::Debug for RelayerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayerEndpoint")
            .field("template", &self.template)
            .field("has_access_key", &self.access_key.is_some())
            .field("timeout", &self.timeout)
            .field("has_http_client", &self.http_client.is_some())
            .finish()
    }
}

impl RelayerEndpoint {
    /// Creates a config with the given URL template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Sets the project access key.
    #[must_use]
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Relayer base URL for `chain_id`.
    ///
    /// # Errors
    ///
    /// See [`resolve_template`].
    pub fn resolve(&self, chain_id: ChainId) -> Result<Url, TransportError> {
        resolve_template(&self.template, chain_id)
    }
}

/// Node endpoint configuration.
#[derive(Clone)]
pub struct NodeEndpoint {
    /// URL template containing `{network}`.
    pub template: String,
    /// Project access key, appended as a path segment on vendor hosts.
    pub access_key: Option<String>,
    /// Hosts (and their subdomains) that take the access key in the path.
    pub access_key_hosts: Vec<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Optional pre-configured client. If `None`, one is built with `timeout`.
    pub http_client: Option<reqwest::Client>,
}

impl Default for NodeEndpoint {
    fn default() -> Self {
        Self {
            template: DEFAULT_NODE_URL_TEMPLATE.to_owned(),
            access_key: None,
            access_key_hosts: DEFAULT_ACCESS_KEY_HOSTS
                .iter()
                .map(|h| (*h).to_owned())
                .collect(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http_client: None,
        }
    }
}

impl fmt::Debug for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEndpoint")
            .field("template", &self.template)
            .field("has_access_key", &self.access_key.is_some())
            .field("access_key_hosts", &self.access_key_hosts)
            .field("timeout", &self.timeout)
            .field("has_http_client", &self.http_client.is_some())
            .finish()
    }
}

impl NodeEndpoint {
    /// Creates a config with the given URL template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    /// Sets the project access key.
    #[must_use]
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Replaces the hosts that take the access key in the path.
    #[must_use]
    pub fn with_access_key_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access_key_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Node URL for `chain_id`, with the access key appended on vendor hosts.
    ///
    /// # Errors
    ///
    /// See [`resolve_template`].
    pub fn resolve(&self, chain_id: ChainId) -> Result<Url, TransportError> {
        let mut url = resolve_template(&self.template, chain_id)?;
        let Some(access_key) = &self.access_key else {
            return Ok(url);
        };
        if !url.host_str().is_some_and(|host| self.takes_access_key(host)) {
            return Ok(url);
        }
        let rendered = url.to_string();
        url.path_segments_mut()
            .map_err(|()| TransportError::Template(format!("{rendered} cannot take a path")))?
            .pop_if_empty()
            .push(access_key);
        Ok(url)
    }

    fn takes_access_key(&self, host: &str) -> bool {
        self.access_key_hosts.iter().any(|vendor| {
            host == vendor
                || host
                    .strip_suffix(vendor.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
