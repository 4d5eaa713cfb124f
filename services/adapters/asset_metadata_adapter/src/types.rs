//! Shared record types for tokens, pools and dexes

use metadata_config::service::{chain::ZERO_ADDRESS, store::POOL_SENTINEL};
use metadata_config::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pool fee tier in hundredths of a basis point (500 = 0.05%)
pub type FeeTier = u32;

/// Token addresses for one symbol across networks
pub type NetworkAddresses = BTreeMap<ChainId, String>;

/// Composite key of a pool record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub base: String,
    pub quote: String,
    pub fee_tier: FeeTier,
    pub dex: String,
    pub chain_id: ChainId,
}

impl PoolKey {
    pub fn new(
        base: impl Into<String>,
        quote: impl Into<String>,
        fee_tier: FeeTier,
        dex: impl Into<String>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
            fee_tier,
            dex: dex.into(),
            chain_id,
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{} on {} (chain {})",
            self.base, self.quote, self.fee_tier, self.dex, self.chain_id
        )
    }
}

/// Stored leaf of the pool hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    /// A deployed pool
    Address(String),
    /// The factory reported no pool at this tier
    Missing,
}

impl PoolEntry {
    /// Build an entry from an address, normalizing the zero address
    pub fn from_address(address: &str) -> Self {
        if is_zero_address(address) || address == POOL_SENTINEL {
            PoolEntry::Missing
        } else {
            PoolEntry::Address(address.to_string())
        }
    }

    /// Textual form written to the store
    pub fn as_stored(&self) -> &str {
        match self {
            PoolEntry::Address(address) => address,
            PoolEntry::Missing => POOL_SENTINEL,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            PoolEntry::Address(address) => Some(address),
            PoolEntry::Missing => None,
        }
    }

    pub fn into_address(self) -> Option<String> {
        match self {
            PoolEntry::Address(address) => Some(address),
            PoolEntry::Missing => None,
        }
    }
}

/// Fee tiers of one (base, quote) pair in store insertion order
pub type FeeTierMap = Vec<(FeeTier, PoolEntry)>;

/// Which level of the pool hierarchy a write created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Base symbol was new: base, quote and tier were created together
    CreatedBase,
    /// Quote symbol was new under an existing base
    CreatedQuote,
    /// Fee tier was new under an existing (base, quote)
    CreatedTier,
    /// Leaf already present; existing value kept
    Unchanged,
}

/// Factory and router information for a dex deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexInfo {
    pub factory_address: String,
    pub factory_abi: serde_json::Value,
    #[serde(default)]
    pub router_address: Option<String>,
    #[serde(default)]
    pub router_abi: Option<serde_json::Value>,
    #[serde(default)]
    pub quoter_address: Option<String>,
}

/// Whether an address is the chain's zero address (any hex casing)
pub fn is_zero_address(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS)
}
