//! Explicit session configuration.
//!
//! An explicit session is a bounded delegation: the remote wallet executes
//! calls matching its permission set without further user interaction, up to
//! a native-token value limit and until a deadline. Whether the dApp asks for
//! one at all is captured by [`SessionMode`]; an absent config means the dApp
//! relies on implicit grants only, which is different from a config with an
//! empty permission list.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::fee::FeeTokens;
use crate::permission::{Permission, PermissionError, PermissionParams};
use crate::timestamp::UnixTimestamp;

const SECONDS_PER_HOUR: u64 = 60 * 60;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// When an explicit session stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    /// An absolute deadline.
    At {
        /// Unix time after which the session is invalid.
        deadline: UnixTimestamp,
    },
    /// A duration counted from the moment the session is built.
    In {
        /// Whole days.
        #[serde(default)]
        days: u64,
        /// Whole hours, added to `days`.
        #[serde(default)]
        hours: u64,
    },
}

impl Expiry {
    /// Shorthand for a relative expiry of `days` days.
    #[must_use]
    pub const fn days(days: u64) -> Self {
        Self::In { days, hours: 0 }
    }

    /// Shorthand for a relative expiry of `hours` hours.
    #[must_use]
    pub const fn hours(hours: u64) -> Self {
        Self::In { days: 0, hours }
    }

    /// Resolves the expiry into an absolute deadline relative to `now`.
    #[must_use]
    pub fn resolve(self, now: UnixTimestamp) -> UnixTimestamp {
        match self {
            Self::At { deadline } => deadline,
            Self::In { days, hours } => {
                let secs = days
                    .saturating_mul(SECONDS_PER_DAY)
                    .saturating_add(hours.saturating_mul(SECONDS_PER_HOUR));
                now + secs
            }
        }
    }
}

/// Caller-supplied parameters for an explicit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitSessionParams {
    /// Chain the session is valid on.
    pub chain_id: ChainId,
    /// Maximum native-token value the session may spend.
    pub value_limit: U256,
    /// When the session expires.
    pub expiry: Expiry,
    /// Authorized contract calls.
    pub permissions: Vec<Permission>,
}

impl ExplicitSessionParams {
    /// Resolves the expiry against `now` and freezes the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError::DeadlineInPast`] if the resolved
    /// deadline is not after `now`.
    pub fn build(self, now: UnixTimestamp) -> Result<ExplicitSession, SessionConfigError> {
        let deadline = self.expiry.resolve(now);
        if deadline <= now {
            return Err(SessionConfigError::DeadlineInPast { deadline, now });
        }
        let mut permissions: Vec<Permission> = Vec::with_capacity(self.permissions.len());
        for permission in self.permissions {
            if !permissions.contains(&permission) {
                permissions.push(permission);
            }
        }
        Ok(ExplicitSession {
            chain_id: self.chain_id,
            value_limit: self.value_limit,
            deadline,
            permissions,
        })
    }
}

/// A resolved explicit session descriptor, as sent to the remote wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplicitSession {
    chain_id: ChainId,
    value_limit: U256,
    deadline: UnixTimestamp,
    permissions: Vec<Permission>,
}

impl ExplicitSession {
    /// Chain the session is valid on.
    #[must_use]
    pub const fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Native-token spend limit.
    #[must_use]
    pub const fn value_limit(&self) -> U256 {
        self.value_limit
    }

    /// Absolute deadline.
    #[must_use]
    pub const fn deadline(&self) -> UnixTimestamp {
        self.deadline
    }

    /// Authorized contract calls.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Returns a copy that can also pay relayer fees in every ERC-20 fee token.
    ///
    /// When the relayer requires fees, one unbounded `transfer` permission is
    /// added per token with a contract address. Native-asset fees are covered
    /// by the value limit. Permissions already present are not duplicated, so
    /// applying the same fee tokens twice yields the same session.
    #[must_use]
    pub fn with_fee_token_permissions(&self, fee_tokens: &FeeTokens) -> Self {
        let mut merged = self.clone();
        if !fee_tokens.is_fee_required {
            return merged;
        }
        for token in &fee_tokens.tokens {
            if token.is_native() {
                continue;
            }
            let Some(address) = token.contract_address else {
                continue;
            };
            let permission = Permission::erc20_transfer(address, U256::MAX);
            if !merged.permissions.contains(&permission) {
                merged.permissions.push(permission);
            }
        }
        merged
    }

    /// Merges fee-token permissions and checks the result authorizes something.
    ///
    /// This is the session sent on connect.
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError::NoPermissions`] if the merged session is
    /// empty.
    pub fn prepare(&self, fee_tokens: &FeeTokens) -> Result<Self, SessionConfigError> {
        let session = self.with_fee_token_permissions(fee_tokens);
        if session.permissions.is_empty() {
            return Err(SessionConfigError::NoPermissions);
        }
        Ok(session)
    }
}

/// Whether the dApp requests an explicit session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// No explicit session; rely on implicit grants only.
    #[default]
    Implicit,
    /// Request the given explicit session at connect time.
    Explicit(ExplicitSession),
}

impl SessionMode {
    /// Builds the mode from optional parameters.
    ///
    /// # Errors
    ///
    /// Propagates [`ExplicitSessionParams::build`] errors.
    pub fn from_params(
        params: Option<ExplicitSessionParams>,
        now: UnixTimestamp,
    ) -> Result<Self, SessionConfigError> {
        params.map_or(Ok(Self::Implicit), |p| p.build(now).map(Self::Explicit))
    }

    /// The explicit session, if one is requested.
    #[must_use]
    pub const fn explicit(&self) -> Option<&ExplicitSession> {
        match self {
            Self::Implicit => None,
            Self::Explicit(session) => Some(session),
        }
    }
}

/// Declarative explicit-session description, as found in configuration files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionSpec {
    /// Chain override; defaults to the provider's chain.
    #[serde(default)]
    pub chain_id: Option<ChainId>,
    /// Native spend limit in wei, decimal or `0x` hex.
    #[serde(default = "default_value_limit")]
    pub value_limit: String,
    /// Expiry specification.
    pub expiry: Expiry,
    /// Authorized contract calls.
    #[serde(default)]
    pub permissions: Vec<PermissionParams>,
}

fn default_value_limit() -> String {
    "0".to_owned()
}

impl SessionSpec {
    /// Parses the description into [`ExplicitSessionParams`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionConfigError`] on an unparsable value limit or an
    /// invalid permission.
    pub fn into_params(
        self,
        default_chain_id: ChainId,
    ) -> Result<ExplicitSessionParams, SessionConfigError> {
        let value_limit = crate::permission::parse_u256(self.value_limit.trim())
            .ok_or(SessionConfigError::InvalidValueLimit(self.value_limit))?;
        let permissions = self
            .permissions
            .iter()
            .map(PermissionParams::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExplicitSessionParams {
            chain_id: self.chain_id.unwrap_or(default_chain_id),
            value_limit,
            expiry: self.expiry,
            permissions,
        })
    }
}

/// Errors raised while assembling an explicit session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionConfigError {
    /// The resolved deadline is not in the future.
    #[error("Session deadline {deadline} is not after current time {now}")]
    DeadlineInPast {
        /// Resolved deadline.
        deadline: UnixTimestamp,
        /// Reference time.
        now: UnixTimestamp,
    },
    /// The value limit is not a non-negative integer.
    #[error("Invalid session value limit '{0}'")]
    InvalidValueLimit(String),
    /// A permission could not be built.
    #[error(transparent)]
    Permission(#[from] PermissionError),
    /// The session would authorize nothing, even with fee-token permissions.
    #[error("Explicit session has no permissions")]
    NoPermissions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::{FeeToken, FeeTokenType};
    use alloy_primitives::{Address, address};

    const NOW: UnixTimestamp = UnixTimestamp::from_secs(1_700_000_000);
    const USDC: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");
    const USDT: Address = address!("c2132D05D31c914a87C6611C10748AEb04B58e8F");

    fn token(symbol: &str, contract_address: Option<Address>) -> FeeToken {
        FeeToken {
            chain_id: 137,
            name: symbol.to_owned(),
            symbol: symbol.to_owned(),
            token_type: if contract_address.is_some() {
                FeeTokenType::Erc20Token
            } else {
                FeeTokenType::Unknown
            },
            decimals: Some(6),
            logo_url: None,
            contract_address,
            token_id: None,
        }
    }

    fn params(permissions: Vec<Permission>) -> ExplicitSessionParams {
        ExplicitSessionParams {
            chain_id: 137,
            value_limit: U256::from(10u64).pow(U256::from(18)),
            expiry: Expiry::days(7),
            permissions,
        }
    }

    #[test]
    fn test_relative_expiry_resolves_to_absolute_deadline() {
        assert_eq!(
            Expiry::In { days: 1, hours: 2 }.resolve(NOW).as_secs(),
            NOW.as_secs() + 86_400 + 7_200
        );
        let fixed = UnixTimestamp::from_secs(1_800_000_000);
        assert_eq!(Expiry::At { deadline: fixed }.resolve(NOW), fixed);
    }

    #[test]
    fn test_past_deadline_is_rejected() {
        let mut p = params(vec![]);
        p.expiry = Expiry::At {
            deadline: UnixTimestamp::from_secs(1),
        };
        assert!(matches!(
            p.build(NOW),
            Err(SessionConfigError::DeadlineInPast { .. })
        ));
        let mut p = params(vec![]);
        p.expiry = Expiry::hours(0);
        assert!(p.build(NOW).is_err());
    }

    #[test]
    fn test_absent_params_mean_implicit_mode() {
        assert_eq!(SessionMode::from_params(None, NOW).unwrap(), SessionMode::Implicit);
        let mode = SessionMode::from_params(Some(params(vec![])), NOW).unwrap();
        let session = mode.explicit().unwrap();
        assert!(session.permissions().is_empty());
    }

    #[test]
    fn test_fee_tokens_add_one_permission_per_erc20_token() {
        let base = params(vec![Permission::erc20_transfer(
            Address::repeat_byte(0x11),
            U256::from(5),
        )])
        .build(NOW)
        .unwrap();
        let fee_tokens = FeeTokens {
            is_fee_required: true,
            tokens: vec![token("POL", None), token("USDC", Some(USDC)), token("USDT", Some(USDT))],
        };

        let merged = base.with_fee_token_permissions(&fee_tokens);
        assert_eq!(merged.permissions().len(), base.permissions().len() + 2);
        assert_eq!(merged.permissions()[1], Permission::erc20_transfer(USDC, U256::MAX));

        let twice = merged.with_fee_token_permissions(&fee_tokens);
        assert_eq!(twice.permissions().len(), merged.permissions().len());
    }

    #[test]
    fn test_prepare_rejects_session_that_stays_empty() {
        let session = ExplicitSessionParams {
            chain_id: 137,
            value_limit: U256::ZERO,
            expiry: Expiry::days(1),
            permissions: vec![],
        }
        .build(NOW)
        .unwrap();

        assert_eq!(
            session.prepare(&FeeTokens::not_required()),
            Err(SessionConfigError::NoPermissions)
        );
        let native_only = FeeTokens {
            is_fee_required: true,
            tokens: vec![token("POL", None)],
        };
        assert_eq!(
            session.prepare(&native_only),
            Err(SessionConfigError::NoPermissions)
        );

        let with_usdc = FeeTokens {
            is_fee_required: true,
            tokens: vec![token("USDC", Some(USDC))],
        };
        let prepared = session.prepare(&with_usdc).unwrap();
        assert_eq!(
            prepared.permissions(),
            &[Permission::erc20_transfer(USDC, U256::MAX)]
        );
    }

    #[test]
    fn test_fee_tokens_ignored_when_not_required() {
        let base = params(vec![]).build(NOW).unwrap();
        let fee_tokens = FeeTokens {
            is_fee_required: false,
            tokens: vec![token("USDC", Some(USDC))],
        };
        assert!(base.with_fee_token_permissions(&fee_tokens).permissions().is_empty());
    }

    #[test]
    fn test_spec_from_toml_like_json() {
        let spec: SessionSpec = serde_json::from_value(serde_json::json!({
            "value_limit": "1000",
            "expiry": { "days": 3 },
            "permissions": [
                { "target": USDC, "function": "function approve(address spender, uint256 amount)" }
            ]
        }))
        .unwrap();
        let params = spec.into_params(8453).unwrap();
        assert_eq!(params.chain_id, 8453);
        assert_eq!(params.value_limit, U256::from(1000));
        assert_eq!(params.expiry, Expiry::days(3));
        assert_eq!(params.permissions.len(), 1);

        let spec: SessionSpec = serde_json::from_value(serde_json::json!({
            "expiry": { "deadline": "1800000000" }
        }))
        .unwrap();
        assert!(matches!(spec.expiry, Expiry::At { .. }));
    }

    #[test]
    fn test_wire_shape() {
        let session = params(vec![]).build(NOW).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["chainId"], 137);
        assert_eq!(json["deadline"], (NOW.as_secs() + 7 * 86_400).to_string());
        assert!(json["permissions"].as_array().unwrap().is_empty());
    }
}
