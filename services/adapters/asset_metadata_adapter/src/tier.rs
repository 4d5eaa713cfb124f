//! Fee tier selection
//!
//! "Cheapest" here means the first populated tier in store order. No fee
//! or liquidity comparison happens.
//!
//! Store order is file order, preserved exactly as written. Many JSON
//! runtimes instead enumerate integer-like object keys in ascending
//! numeric order, so stores produced by such tools read back lowest fee
//! first and "first populated" there is effectively "lowest populated
//! fee". Here a file listing `10000` before `100` picks `10000`.

use crate::types::{FeeTier, FeeTierMap, PoolEntry};

/// First tier whose entry is a deployed pool
pub fn select_cheapest(tiers: &FeeTierMap) -> Option<&str> {
    tiers.iter().find_map(|(_, entry)| entry.address())
}

/// Fee tier of the entry `select_cheapest` would pick
pub fn cheapest_tier(tiers: &FeeTierMap) -> Option<FeeTier> {
    tiers
        .iter()
        .find(|(_, entry)| matches!(entry, PoolEntry::Address(_)))
        .map(|(tier, _)| *tier)
}
