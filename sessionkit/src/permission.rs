//! Contract-call permissions.
//!
//! A [`Permission`] authorizes calls to one function of one contract, optionally
//! restricted by constraints on individual arguments. Permissions are built from
//! human-readable Solidity signatures such as
//! `"function transfer(address to, uint256 value)"`; every constraint is checked
//! against the parsed parameter list when the permission is constructed, so a
//! malformed rule can never reach the remote wallet.
//!
//! # Wire form
//!
//! The remote wallet evaluates permissions word-by-word over the calldata. Each
//! permission encodes to a target plus a list of [`EncodedRule`]s:
//!
//! - a selector rule at offset 0 that masks the first four bytes;
//! - one rule per constraint at offset `4 + 32 * index`, masking the full word.
//!
//! Only static ABI types occupy a fixed calldata word, so dynamic types
//! (`bytes`, `string`, arrays, tuples) cannot be constrained.
//!
//! Cumulative constraints are passed through untouched; the wallet tracks the
//! running total across the session.

use std::fmt;

use alloy_json_abi::Function;
use alloy_primitives::{Address, B256, FixedBytes, I256, Selector, U256, fixed_bytes};
use serde::{Deserialize, Serialize, Serializer};

/// Selector of ERC-20 `transfer(address,uint256)`.
pub const ERC20_TRANSFER_SELECTOR: Selector = fixed_bytes!("a9059cbb");

/// Canonical signature of ERC-20 `transfer`.
pub const ERC20_TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Comparison applied between a calldata word and a rule's bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterOperation {
    /// Word must equal the bound.
    Equal,
    /// Word must differ from the bound.
    NotEqual,
    /// Word must be at least the bound.
    GreaterThanOrEqual,
    /// Word must be at most the bound.
    LessThanOrEqual,
}

impl ParameterOperation {
    /// Numeric code understood by the remote wallet.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Equal => 0,
            Self::NotEqual => 1,
            Self::GreaterThanOrEqual => 2,
            Self::LessThanOrEqual => 3,
        }
    }
}

impl Serialize for ParameterOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// A typed bound for a parameter constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleValue {
    /// Unsigned integer bound, for `uintN` parameters.
    Uint(U256),
    /// Signed integer bound, for `intN` parameters.
    Int(I256),
    /// Address bound, for `address` parameters.
    Address(Address),
    /// Boolean bound, for `bool` parameters.
    Bool(bool),
    /// Left-aligned fixed bytes, for `bytesN` parameters.
    FixedBytes(B256),
}

impl RuleValue {
    /// Parses a textual bound according to the declared ABI type.
    ///
    /// Integers accept decimal or `0x` hex; `bytesN` accepts `0x` hex of at most
    /// `N` bytes, left-aligned into the word.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] if the type cannot be constrained or the text
    /// does not parse as a value of that type.
    pub fn parse(param: &str, abi_type: &str, text: &str) -> Result<Self, PermissionError> {
        let ty = canonical_type(abi_type);
        let invalid = || PermissionError::InvalidValue {
            param: param.to_owned(),
            abi_type: ty.clone(),
            value: text.to_owned(),
        };
        let text = text.trim();
        match StaticType::of(&ty) {
            Some(StaticType::Uint(_)) => parse_u256(text).map(Self::Uint).ok_or_else(invalid),
            Some(StaticType::Int(_)) => text
                .parse::<I256>()
                .map(Self::Int)
                .map_err(|_| invalid()),
            Some(StaticType::Address) => text
                .parse::<Address>()
                .map(Self::Address)
                .map_err(|_| invalid()),
            Some(StaticType::Bool) => match text {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            Some(StaticType::FixedBytes(size)) => {
                let hex = text.strip_prefix("0x").ok_or_else(invalid)?;
                let bytes = alloy_primitives::hex::decode(hex).map_err(|_| invalid())?;
                if bytes.len() > size {
                    return Err(invalid());
                }
                let mut word = [0u8; 32];
                word[..bytes.len()].copy_from_slice(&bytes);
                Ok(Self::FixedBytes(B256::from(word)))
            }
            None => Err(PermissionError::UnsupportedType {
                param: param.to_owned(),
                abi_type: ty,
            }),
        }
    }

    /// The 32-byte ABI word for this bound.
    #[must_use]
    pub fn to_word(&self) -> B256 {
        match self {
            Self::Uint(v) => B256::from(*v),
            Self::Int(v) => B256::from(v.into_raw()),
            Self::Address(a) => a.into_word(),
            Self::Bool(b) => B256::with_last_byte(u8::from(*b)),
            Self::FixedBytes(b) => *b,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::Bool(_) => "bool",
            Self::FixedBytes(_) => "bytes",
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::FixedBytes(b) => write!(f, "{b}"),
        }
    }
}

/// A caller-supplied constraint on one named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamRule {
    /// Parameter name as written in the function signature.
    pub param: String,
    /// Declared ABI type; must match the signature's type for `param`.
    pub abi_type: String,
    /// Comparison operator.
    pub operation: ParameterOperation,
    /// Bound value.
    pub value: RuleValue,
    /// Whether the bound limits the running total across the session.
    pub cumulative: bool,
}

impl ParamRule {
    /// Creates a per-call constraint.
    pub fn new(
        param: impl Into<String>,
        abi_type: impl Into<String>,
        operation: ParameterOperation,
        value: RuleValue,
    ) -> Self {
        Self {
            param: param.into(),
            abi_type: abi_type.into(),
            operation,
            value,
            cumulative: false,
        }
    }

    /// Marks the bound as cumulative across all calls in the session.
    #[must_use]
    pub const fn cumulative(mut self) -> Self {
        self.cumulative = true;
        self
    }
}

/// A constraint resolved against the function's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    /// Parameter name.
    pub param: String,
    /// Canonical ABI type of the parameter.
    pub abi_type: String,
    /// Zero-based position of the parameter in the argument list.
    pub index: usize,
    /// Comparison operator.
    pub operation: ParameterOperation,
    /// Bound value.
    pub value: RuleValue,
    /// Cumulative flag, preserved verbatim.
    pub cumulative: bool,
}

/// One word-level rule as evaluated by the remote wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedRule {
    /// Whether the bound applies to the running total.
    pub cumulative: bool,
    /// Comparison operator.
    pub operation: ParameterOperation,
    /// Bound word.
    pub value: B256,
    /// Byte offset into the calldata.
    pub offset: U256,
    /// Mask applied to the calldata word before comparison.
    pub mask: B256,
}

/// An immutable authorization rule for calls to one contract function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    target: Address,
    signature: String,
    selector: Selector,
    constraints: Vec<Constraint>,
}

impl Permission {
    /// Builds a permission from a function signature and parameter rules.
    ///
    /// An empty rule list authorizes any call to the selector.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] if the signature does not parse, a rule names
    /// an unknown parameter, a rule's declared type differs from the parameter's
    /// type, the type cannot be constrained, or the bound does not fit the type.
    pub fn new(
        target: Address,
        signature: &str,
        rules: impl IntoIterator<Item = ParamRule>,
    ) -> Result<Self, PermissionError> {
        let function =
            Function::parse(signature).map_err(|e| PermissionError::InvalidSignature {
                signature: signature.to_owned(),
                reason: e.to_string(),
            })?;

        let constraints = rules
            .into_iter()
            .map(|rule| resolve_rule(&function, rule))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target,
            signature: function.signature(),
            selector: function.selector(),
            constraints,
        })
    }

    /// ERC-20 `transfer` permission capped at `max` (cumulative).
    ///
    /// Used to let a session pay relayer fees in `token` without a second
    /// authorization step.
    #[must_use]
    pub fn erc20_transfer(token: Address, max: U256) -> Self {
        Self {
            target: token,
            signature: ERC20_TRANSFER_SIGNATURE.to_owned(),
            selector: ERC20_TRANSFER_SELECTOR,
            constraints: vec![Constraint {
                param: "value".to_owned(),
                abi_type: "uint256".to_owned(),
                index: 1,
                operation: ParameterOperation::LessThanOrEqual,
                value: RuleValue::Uint(max),
                cumulative: true,
            }],
        }
    }

    /// Target contract address.
    #[must_use]
    pub const fn target(&self) -> Address {
        self.target
    }

    /// Canonical function signature (e.g., `"transfer(address,uint256)"`).
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Four-byte function selector.
    #[must_use]
    pub const fn selector(&self) -> Selector {
        self.selector
    }

    /// Resolved parameter constraints, in the order they were supplied.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Encodes the permission into word-level rules.
    #[must_use]
    pub fn encode(&self) -> EncodedPermission {
        let mut selector_word = [0u8; 32];
        selector_word[..4].copy_from_slice(self.selector.as_slice());
        let mut selector_mask = [0u8; 32];
        selector_mask[..4].fill(0xff);

        let mut rules = Vec::with_capacity(self.constraints.len() + 1);
        rules.push(EncodedRule {
            cumulative: false,
            operation: ParameterOperation::Equal,
            value: B256::from(selector_word),
            offset: U256::ZERO,
            mask: B256::from(selector_mask),
        });
        rules.extend(self.constraints.iter().map(|c| EncodedRule {
            cumulative: c.cumulative,
            operation: c.operation,
            value: c.value.to_word(),
            offset: U256::from(4 + 32 * c.index),
            mask: FixedBytes::repeat_byte(0xff),
        }));

        EncodedPermission {
            target: self.target,
            rules,
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

/// Wire form of a [`Permission`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedPermission {
    /// Target contract address.
    pub target: Address,
    /// Selector rule followed by one rule per constraint.
    pub rules: Vec<EncodedRule>,
}

/// Declarative permission description, as found in configuration files.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionParams {
    /// Target contract address.
    pub target: Address,
    /// Human-readable function signature.
    pub function: String,
    /// Parameter rules; values are parsed according to their declared type.
    #[serde(default)]
    pub rules: Vec<ParamRuleParams>,
}

/// Declarative parameter rule with a textual bound.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamRuleParams {
    /// Parameter name.
    pub param: String,
    /// Declared ABI type.
    #[serde(rename = "type")]
    pub abi_type: String,
    /// Comparison operator.
    pub operation: ParameterOperation,
    /// Bound, parsed according to `abi_type`.
    pub value: String,
    /// Cumulative flag.
    #[serde(default)]
    pub cumulative: bool,
}

impl PermissionParams {
    /// Parses the rule values and builds the [`Permission`].
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError`] for any invalid rule or signature.
    pub fn build(&self) -> Result<Permission, PermissionError> {
        let rules = self
            .rules
            .iter()
            .map(|r| {
                let value = RuleValue::parse(&r.param, &r.abi_type, &r.value)?;
                Ok(ParamRule {
                    param: r.param.clone(),
                    abi_type: r.abi_type.clone(),
                    operation: r.operation,
                    value,
                    cumulative: r.cumulative,
                })
            })
            .collect::<Result<Vec<_>, PermissionError>>()?;
        Permission::new(self.target, &self.function, rules)
    }
}

/// Errors raised while constructing a [`Permission`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The function signature could not be parsed.
    #[error("Invalid function signature '{signature}': {reason}")]
    InvalidSignature {
        /// The offending signature.
        signature: String,
        /// Parser message.
        reason: String,
    },
    /// A rule names a parameter the function does not have.
    #[error("Function '{signature}' has no parameter named '{param}'")]
    UnknownParameter {
        /// The rule's parameter name.
        param: String,
        /// Canonical signature of the function.
        signature: String,
    },
    /// A rule's declared type differs from the parameter's ABI type.
    #[error("Parameter '{param}' is declared as '{declared}' but the function takes '{actual}'")]
    TypeMismatch {
        /// Parameter name.
        param: String,
        /// Type declared by the rule.
        declared: String,
        /// Type in the function signature.
        actual: String,
    },
    /// The parameter's type has no fixed calldata word.
    #[error("Parameter '{param}' of type '{abi_type}' cannot be constrained")]
    UnsupportedType {
        /// Parameter name.
        param: String,
        /// Its ABI type.
        abi_type: String,
    },
    /// The bound is not a valid value of the parameter's type.
    #[error("Value '{value}' is not a valid '{abi_type}' for parameter '{param}'")]
    InvalidValue {
        /// Parameter name.
        param: String,
        /// Its ABI type.
        abi_type: String,
        /// The rejected value.
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticType {
    Uint(usize),
    Int(usize),
    Address,
    Bool,
    FixedBytes(usize),
}

impl StaticType {
    fn of(canonical: &str) -> Option<Self> {
        let bits = |s: &str| {
            s.parse::<usize>()
                .ok()
                .filter(|b| *b > 0 && *b <= 256 && b % 8 == 0)
        };
        match canonical {
            "address" => Some(Self::Address),
            "bool" => Some(Self::Bool),
            _ => {
                if let Some(n) = canonical.strip_prefix("uint") {
                    bits(n).map(Self::Uint)
                } else if let Some(n) = canonical.strip_prefix("int") {
                    bits(n).map(Self::Int)
                } else if let Some(n) = canonical.strip_prefix("bytes") {
                    n.parse::<usize>()
                        .ok()
                        .filter(|s| (1..=32).contains(s))
                        .map(Self::FixedBytes)
                } else {
                    None
                }
            }
        }
    }

    fn accepts(self, value: &RuleValue) -> bool {
        match (self, value) {
            (Self::Uint(bits), RuleValue::Uint(v)) => v.bit_len() <= bits,
            (Self::Int(bits), RuleValue::Int(v)) => {
                bits == 256 || {
                    let limit = U256::from(1) << (bits - 1);
                    if v.is_negative() {
                        v.unsigned_abs() <= limit
                    } else {
                        v.into_raw() < limit
                    }
                }
            }
            (Self::Address, RuleValue::Address(_)) | (Self::Bool, RuleValue::Bool(_)) => true,
            (Self::FixedBytes(size), RuleValue::FixedBytes(b)) => {
                b.as_slice()[size..].iter().all(|byte| *byte == 0)
            }
            _ => false,
        }
    }
}

/// Normalizes Solidity type aliases (`uint` → `uint256`, `int` → `int256`, `byte` → `bytes1`).
fn canonical_type(ty: &str) -> String {
    match ty.trim() {
        "uint" => "uint256".to_owned(),
        "int" => "int256".to_owned(),
        "byte" => "bytes1".to_owned(),
        other => other.to_owned(),
    }
}

pub(crate) fn parse_u256(text: &str) -> Option<U256> {
    if let Some(hex) = text.strip_prefix("0x") {
        U256::from_str_radix(hex, 16).ok()
    } else {
        U256::from_str_radix(text, 10).ok()
    }
}

fn resolve_rule(function: &Function, rule: ParamRule) -> Result<Constraint, PermissionError> {
    let (index, input) = function
        .inputs
        .iter()
        .enumerate()
        .find(|(_, p)| !p.name.is_empty() && p.name == rule.param)
        .ok_or_else(|| PermissionError::UnknownParameter {
            param: rule.param.clone(),
            signature: function.signature(),
        })?;

    let actual = canonical_type(&input.selector_type());
    let declared = canonical_type(&rule.abi_type);
    if actual != declared {
        return Err(PermissionError::TypeMismatch {
            param: rule.param,
            declared,
            actual,
        });
    }

    let static_type = StaticType::of(&actual).ok_or_else(|| PermissionError::UnsupportedType {
        param: rule.param.clone(),
        abi_type: actual.clone(),
    })?;
    if !static_type.accepts(&rule.value) {
        return Err(PermissionError::InvalidValue {
            param: rule.param,
            abi_type: actual,
            value: format!("{} {}", rule.value.kind(), rule.value),
        });
    }

    Ok(Constraint {
        param: rule.param,
        abi_type: actual,
        index,
        operation: rule.operation,
        value: rule.value,
        cumulative: rule.cumulative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256};

    const TOKEN: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
    const RECIPIENT: Address = address!("00000000000000000000000000000000000000aa");

    #[test]
    fn test_selector_matches_abi_selector() {
        let permission = Permission::new(
            TOKEN,
            "function transfer(address to, uint256 value)",
            [],
        )
        .unwrap();
        let expected = &keccak256("transfer(address,uint256)")[..4];
        assert_eq!(permission.selector().as_slice(), expected);
        assert_eq!(permission.selector(), ERC20_TRANSFER_SELECTOR);
        assert_eq!(permission.signature(), "transfer(address,uint256)");
    }

    #[test]
    fn test_zero_parameter_function_without_rules() {
        let permission = Permission::new(TOKEN, "function mint()", []).unwrap();
        assert!(permission.constraints().is_empty());
        let encoded = permission.encode();
        assert_eq!(encoded.rules.len(), 1);
        assert_eq!(encoded.rules[0].offset, U256::ZERO);
    }

    #[test]
    fn test_rules_resolve_to_parameter_positions() {
        let permission = Permission::new(
            TOKEN,
            "function transfer(address to, uint256 value)",
            [
                ParamRule::new(
                    "to",
                    "address",
                    ParameterOperation::Equal,
                    RuleValue::Address(RECIPIENT),
                ),
                ParamRule::new(
                    "value",
                    "uint256",
                    ParameterOperation::LessThanOrEqual,
                    RuleValue::Uint(U256::from(1_000_000u64)),
                )
                .cumulative(),
            ],
        )
        .unwrap();

        let encoded = permission.encode();
        assert_eq!(encoded.rules.len(), 3);
        assert_eq!(encoded.rules[1].offset, U256::from(4));
        assert_eq!(encoded.rules[1].value, RECIPIENT.into_word());
        assert!(!encoded.rules[1].cumulative);
        assert_eq!(encoded.rules[2].offset, U256::from(36));
        assert_eq!(encoded.rules[2].value, B256::from(U256::from(1_000_000u64)));
        assert!(encoded.rules[2].cumulative);
        assert_eq!(encoded.rules[2].mask, B256::repeat_byte(0xff));
    }

    #[test]
    fn test_selector_rule_masks_first_four_bytes() {
        let encoded = Permission::erc20_transfer(TOKEN, U256::MAX).encode();
        let selector_rule = &encoded.rules[0];
        assert_eq!(&selector_rule.mask[..4], &[0xff; 4]);
        assert!(selector_rule.mask[4..].iter().all(|b| *b == 0));
        assert_eq!(&selector_rule.value[..4], ERC20_TRANSFER_SELECTOR.as_slice());
    }

    #[test]
    fn test_erc20_transfer_equals_parsed_permission() {
        let parsed = Permission::new(
            TOKEN,
            "function transfer(address to, uint256 value)",
            [ParamRule::new(
                "value",
                "uint256",
                ParameterOperation::LessThanOrEqual,
                RuleValue::Uint(U256::MAX),
            )
            .cumulative()],
        )
        .unwrap();
        assert_eq!(parsed, Permission::erc20_transfer(TOKEN, U256::MAX));
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let err = Permission::new(
            TOKEN,
            "function transfer(address to, uint256 value)",
            [ParamRule::new(
                "amount",
                "uint256",
                ParameterOperation::Equal,
                RuleValue::Uint(U256::from(1)),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, PermissionError::UnknownParameter { .. }));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let err = Permission::new(
            TOKEN,
            "function transfer(address to, uint256 value)",
            [ParamRule::new(
                "value",
                "uint128",
                ParameterOperation::Equal,
                RuleValue::Uint(U256::from(1)),
            )],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PermissionError::TypeMismatch {
                param: "value".into(),
                declared: "uint128".into(),
                actual: "uint256".into(),
            }
        );
    }

    #[test]
    fn test_uint_alias_matches_uint256() {
        let permission = Permission::new(
            TOKEN,
            "function approve(address spender, uint amount)",
            [ParamRule::new(
                "amount",
                "uint",
                ParameterOperation::LessThanOrEqual,
                RuleValue::Uint(U256::from(5)),
            )],
        );
        assert!(permission.is_ok());
    }

    #[test]
    fn test_dynamic_types_cannot_be_constrained() {
        let err = Permission::new(
            TOKEN,
            "function setName(string name)",
            [ParamRule::new(
                "name",
                "string",
                ParameterOperation::Equal,
                RuleValue::FixedBytes(B256::ZERO),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, PermissionError::UnsupportedType { .. }));
    }

    #[test]
    fn test_value_must_fit_type() {
        let err = Permission::new(
            TOKEN,
            "function setFee(uint8 fee)",
            [ParamRule::new(
                "fee",
                "uint8",
                ParameterOperation::LessThanOrEqual,
                RuleValue::Uint(U256::from(256)),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, PermissionError::InvalidValue { .. }));

        let err = Permission::new(
            TOKEN,
            "function setFee(uint8 fee)",
            [ParamRule::new(
                "fee",
                "uint8",
                ParameterOperation::LessThanOrEqual,
                RuleValue::Address(RECIPIENT),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, PermissionError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_signature_is_rejected() {
        let err = Permission::new(TOKEN, "transfer(address to, uint256", []).unwrap_err();
        assert!(matches!(err, PermissionError::InvalidSignature { .. }));
    }

    #[test]
    fn test_negative_int_bound_encodes_twos_complement() {
        let permission = Permission::new(
            TOKEN,
            "function adjust(int256 delta)",
            [ParamRule::new(
                "delta",
                "int256",
                ParameterOperation::GreaterThanOrEqual,
                RuleValue::Int(I256::MINUS_ONE),
            )],
        )
        .unwrap();
        assert_eq!(permission.encode().rules[1].value, B256::repeat_byte(0xff));
    }

    #[test]
    fn test_params_from_config() {
        let params: PermissionParams = serde_json::from_value(serde_json::json!({
            "target": TOKEN,
            "function": "function transfer(address to, uint256 value)",
            "rules": [
                { "param": "to", "type": "address", "operation": "EQUAL", "value": RECIPIENT.to_string() },
                { "param": "value", "type": "uint256", "operation": "LESS_THAN_OR_EQUAL", "value": "0x64", "cumulative": true }
            ]
        }))
        .unwrap();
        let permission = params.build().unwrap();
        assert_eq!(permission.constraints().len(), 2);
        assert_eq!(permission.constraints()[1].value, RuleValue::Uint(U256::from(100)));
        assert!(permission.constraints()[1].cumulative);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Permission::erc20_transfer(TOKEN, U256::from(1))).unwrap();
        assert_eq!(json["rules"][0]["operation"], 0);
        assert_eq!(json["rules"][1]["operation"], 3);
        assert_eq!(json["rules"][1]["cumulative"], true);
        assert!(json["target"].is_string());
    }
}
