//! Well-known EVM networks.
//!
//! The network name is what node and relayer URL templates substitute for
//! `{network}`, so it must match the names the hosted infrastructure uses.

use crate::chain::ChainId;

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET: ChainId = 1;

/// Optimism chain ID.
pub const OPTIMISM: ChainId = 10;

/// BNB Smart Chain chain ID.
pub const BSC: ChainId = 56;

/// Gnosis chain ID.
pub const GNOSIS: ChainId = 100;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: ChainId = 137;

/// Base Mainnet chain ID.
pub const BASE_MAINNET: ChainId = 8453;

/// Arbitrum One chain ID.
pub const ARBITRUM_ONE: ChainId = 42161;

/// Arbitrum Nova chain ID.
pub const ARBITRUM_NOVA: ChainId = 42170;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: ChainId = 43114;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: ChainId = 80002;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: ChainId = 84532;

/// Arbitrum Sepolia (testnet) chain ID.
pub const ARBITRUM_SEPOLIA: ChainId = 421_614;

/// Sepolia (testnet) chain ID.
pub const SEPOLIA: ChainId = 11_155_111;

/// Static description of a known network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// EIP-155 chain ID.
    pub chain_id: ChainId,
    /// Network name used in endpoint templates (e.g., `"polygon"`).
    pub name: &'static str,
    /// Symbol of the chain's native asset.
    pub native_symbol: &'static str,
    /// Whether the network is a testnet.
    pub testnet: bool,
}

const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        chain_id: ETHEREUM_MAINNET,
        name: "mainnet",
        native_symbol: "ETH",
        testnet: false,
    },
    NetworkInfo {
        chain_id: OPTIMISM,
        name: "optimism",
        native_symbol: "ETH",
        testnet: false,
    },
    NetworkInfo {
        chain_id: BSC,
        name: "bsc",
        native_symbol: "BNB",
        testnet: false,
    },
    NetworkInfo {
        chain_id: GNOSIS,
        name: "gnosis",
        native_symbol: "XDAI",
        testnet: false,
    },
    NetworkInfo {
        chain_id: POLYGON_MAINNET,
        name: "polygon",
        native_symbol: "POL",
        testnet: false,
    },
    NetworkInfo {
        chain_id: BASE_MAINNET,
        name: "base",
        native_symbol: "ETH",
        testnet: false,
    },
    NetworkInfo {
        chain_id: ARBITRUM_ONE,
        name: "arbitrum",
        native_symbol: "ETH",
        testnet: false,
    },
    NetworkInfo {
        chain_id: ARBITRUM_NOVA,
        name: "arbitrum-nova",
        native_symbol: "ETH",
        testnet: false,
    },
    NetworkInfo {
        chain_id: AVALANCHE_MAINNET,
        name: "avalanche",
        native_symbol: "AVAX",
        testnet: false,
    },
    NetworkInfo {
        chain_id: POLYGON_AMOY,
        name: "amoy",
        native_symbol: "POL",
        testnet: true,
    },
    NetworkInfo {
        chain_id: BASE_SEPOLIA,
        name: "base-sepolia",
        native_symbol: "ETH",
        testnet: true,
    },
    NetworkInfo {
        chain_id: ARBITRUM_SEPOLIA,
        name: "arbitrum-sepolia",
        native_symbol: "ETH",
        testnet: true,
    },
    NetworkInfo {
        chain_id: SEPOLIA,
        name: "sepolia",
        native_symbol: "ETH",
        testnet: true,
    },
];

/// Returns all known networks.
#[must_use]
pub const fn known_networks() -> &'static [NetworkInfo] {
    KNOWN_NETWORKS
}

/// Looks up a known network by chain ID.
#[must_use]
pub fn network_by_chain_id(chain_id: ChainId) -> Option<&'static NetworkInfo> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Returns the endpoint network name for a chain ID, if known.
#[must_use]
pub fn network_name(chain_id: ChainId) -> Option<&'static str> {
    network_by_chain_id(chain_id).map(|n| n.name)
}

/// Reverse lookup: chain ID by endpoint network name.
#[must_use]
pub fn chain_id_by_name(name: &str) -> Option<ChainId> {
    KNOWN_NETWORKS
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(name))
        .map(|n| n.chain_id)
}
