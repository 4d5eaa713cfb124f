//! Network identifiers and their canonical names
//!
//! Every store file is scoped by the canonical network name, so a chain id
//! without a registry entry cannot be resolved at all.

use std::collections::HashMap;

/// Numeric blockchain network identifier (EIP-155 chain id where one exists)
pub type ChainId = u64;

/// Networks known out of the box, keyed by chain id
const DEFAULT_NETWORKS: &[(ChainId, &str)] = &[
    (42170, "arbitrum-nova"),
    (42161, "arbitrum-one"),
    (43114, "avalanche-c-chain"),
    (8453, "base"),
    (56, "binance-smart-chain"),
    (1, "ethereum"),
    (59144, "linea"),
    (10, "optimism"),
    (137, "polygon-pos"),
    (1101, "polygon-zkevm"),
    (1399811149, "solana"),
    (324, "zksync-era"),
];

/// Platform display names used by the address directory service.
///
/// Platforms whose identifier is not numeric (Cardano, Osmosis, Starknet...)
/// are intentionally absent: they cannot be expressed as a [`ChainId`].
const DIRECTORY_PLATFORMS: &[(&str, ChainId)] = &[
    ("Algorand", 1300),
    ("Arbitrum", 42161),
    ("Arbitrum Nova", 42170),
    ("Avalanche C-Chain", 43114),
    ("Base", 8453),
    ("BNB Beacon Chain (BEP2)", 97),
    ("BNB Smart Chain (BEP20)", 56),
    ("Cosmos", 118),
    ("Cronos", 25),
    ("Energi", 39797),
    ("Ethereum", 1),
    ("Evmos", 9001),
    ("Fantom", 250),
    ("Fusion Network", 32659),
    ("Gnosis Chain", 100),
    ("Harmony", 1666600000),
    ("HECO", 128),
    ("Hedera Hashgraph", 295),
    ("Hoo Smart Chain", 70),
    ("Linea", 59144),
    ("Mantle", 5000),
    ("Metis Andromeda", 1088),
    ("Milkomeda", 2001),
    ("Moonbeam", 1284),
    ("Moonriver", 1285),
    ("Near", 1313161554),
    ("OKExChain", 66),
    ("Optimism", 10),
    ("Polygon", 137),
    ("Polygon zkEVM", 1101),
    ("Solana", 1399811149),
    ("Telos", 41),
    ("TomoChain", 88),
    ("Zilliqa", 32769),
    ("zkSync Era", 324),
];

/// Map a directory-service platform name to its chain id
pub fn platform_chain_id(platform: &str) -> Option<ChainId> {
    DIRECTORY_PLATFORMS
        .iter()
        .find(|(name, _)| *name == platform)
        .map(|(_, id)| *id)
}

/// Static mapping from chain id to canonical network name
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    names: HashMap<ChainId, String>,
}

impl NetworkRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Add or replace a network entry
    pub fn with_network(mut self, chain_id: ChainId, name: impl Into<String>) -> Self {
        self.names.insert(chain_id, name.into());
        self
    }

    /// Canonical network name for a chain id
    pub fn network_name(&self, chain_id: ChainId) -> Option<&str> {
        self.names.get(&chain_id).map(|s| s.as_str())
    }

    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.names.contains_key(&chain_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        DEFAULT_NETWORKS
            .iter()
            .fold(Self::empty(), |registry, (id, name)| {
                registry.with_network(*id, *name)
            })
    }
}
