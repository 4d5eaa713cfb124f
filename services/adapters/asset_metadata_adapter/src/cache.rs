//! Local metadata cache over persisted stores
//!
//! Token addresses, decimals and pool addresses are cached forever once
//! discovered, since they describe immutable on-chain facts. There is no
//! eviction and no invalidation.
//!
//! Pool stores nest base symbol → quote symbol → fee tier → address. A
//! write only ever creates missing levels; an existing leaf is never
//! overwritten.

use metadata_config::{ChainId, NetworkRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MetadataError, Result};
use crate::store::{Document, Store, StoreKey};
use crate::types::{DexInfo, FeeTier, FeeTierMap, MergeOutcome, NetworkAddresses, PoolEntry, PoolKey};

/// Read and write access to cached token, decimals and pool records
pub struct LocalCache {
    /// Backing document store
    store: Arc<dyn Store>,

    /// Chain id to network name, used to scope stores
    registry: NetworkRegistry,

    /// Sort top-level keys of token and decimals stores before writing
    sort_on_write: bool,
}

impl LocalCache {
    pub fn new(store: Arc<dyn Store>, registry: NetworkRegistry, sort_on_write: bool) -> Self {
        Self {
            store,
            registry,
            sort_on_write,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    fn network_name(&self, chain_id: ChainId) -> Result<&str> {
        self.registry
            .network_name(chain_id)
            .ok_or(MetadataError::UnknownNetwork(chain_id))
    }

    fn tokens_key(&self, chain_id: ChainId) -> Result<StoreKey> {
        Ok(StoreKey::TokenAddresses {
            network: self.network_name(chain_id)?.to_string(),
        })
    }

    fn pools_key(&self, dex: &str, chain_id: ChainId) -> Result<StoreKey> {
        Ok(StoreKey::Pools {
            network: self.network_name(chain_id)?.to_string(),
            dex: dex.to_string(),
        })
    }

    /// Cached address of a token on one network
    pub async fn get_token(&self, symbol: &str, chain_id: ChainId) -> Result<Option<String>> {
        let key = self.tokens_key(chain_id)?;
        let document = self.store.load(&key).await;

        Ok(match document.get(symbol) {
            Some(Value::String(address)) if !address.is_empty() => Some(address.clone()),
            Some(Value::String(_)) | None => None,
            Some(other) => {
                warn!("Ignoring non-string address for {} in {:?}: {}", symbol, key, other);
                None
            }
        })
    }

    /// Write a token's address on every network returned.
    ///
    /// Returns the chain ids that were skipped because the registry has no
    /// entry for them.
    pub async fn put_token_all(
        &self,
        symbol: &str,
        addresses: &NetworkAddresses,
    ) -> Result<Vec<ChainId>> {
        let mut unknown_networks = Vec::new();

        for (chain_id, address) in addresses {
            let key = match self.tokens_key(*chain_id) {
                Ok(key) => key,
                Err(_) => {
                    unknown_networks.push(*chain_id);
                    continue;
                }
            };

            let sort = self.sort_on_write;
            self.store
                .update(&key, &mut |document: &mut Document| {
                    document.insert(symbol.to_string(), Value::String(address.clone()));
                    if sort {
                        sort_keys(document);
                    }
                })
                .await?;
        }

        if !unknown_networks.is_empty() {
            debug!(
                "Skipped {} addresses for {} on unregistered networks: {:?}",
                unknown_networks.len(),
                symbol,
                unknown_networks
            );
        }

        Ok(unknown_networks)
    }

    /// Cached decimals of a token.
    ///
    /// Decimals are keyed by symbol only and shared by every network.
    pub async fn get_decimals(&self, symbol: &str) -> Result<Option<u8>> {
        let document = self.store.load(&StoreKey::TokenDecimals).await;

        Ok(match document.get(symbol) {
            Some(value) => {
                let decimals = value.as_u64().and_then(|d| u8::try_from(d).ok());
                if decimals.is_none() {
                    warn!("Ignoring invalid decimals for {}: {}", symbol, value);
                }
                decimals
            }
            None => None,
        })
    }

    /// Upsert a token's decimals
    pub async fn put_decimals(&self, symbol: &str, decimals: u8) -> Result<()> {
        let sort = self.sort_on_write;
        self.store
            .update(&StoreKey::TokenDecimals, &mut |document: &mut Document| {
                document.insert(symbol.to_string(), Value::from(decimals));
                if sort {
                    sort_keys(document);
                }
            })
            .await?;
        Ok(())
    }

    /// Cached pool entry for an exact key
    pub async fn get_pool(&self, key: &PoolKey) -> Result<Option<PoolEntry>> {
        let tiers = self
            .get_fee_tiers(&key.base, &key.quote, &key.dex, key.chain_id)
            .await?;

        Ok(tiers.and_then(|tiers| {
            tiers
                .into_iter()
                .find(|(tier, _)| *tier == key.fee_tier)
                .map(|(_, entry)| entry)
        }))
    }

    /// Every cached fee tier of a pair, in store order
    pub async fn get_fee_tiers(
        &self,
        base: &str,
        quote: &str,
        dex: &str,
        chain_id: ChainId,
    ) -> Result<Option<FeeTierMap>> {
        let key = self.pools_key(dex, chain_id)?;
        let document = self.store.load(&key).await;

        let tiers = match document.get(base).and_then(|quotes| quotes.get(quote)) {
            Some(Value::Object(tiers)) => tiers,
            Some(other) => {
                warn!("Malformed fee tier map for {}/{} in {:?}: {}", base, quote, key, other);
                return Ok(None);
            }
            None => return Ok(None),
        };

        let parsed: FeeTierMap = tiers
            .iter()
            .filter_map(|(tier, value)| {
                let tier: FeeTier = tier.parse().ok()?;
                let address = value.as_str()?;
                Some((tier, PoolEntry::from_address(address)))
            })
            .collect();

        Ok(Some(parsed))
    }

    /// Merge a pool entry into its store without overwriting a present leaf
    pub async fn put_pool(&self, key: &PoolKey, entry: &PoolEntry) -> Result<MergeOutcome> {
        let store_key = self.pools_key(&key.dex, key.chain_id)?;
        let mut outcome = MergeOutcome::Unchanged;

        self.store
            .update(&store_key, &mut |document: &mut Document| {
                outcome = merge_pool(document, key, entry);
            })
            .await?;

        debug!("Pool write for {}: {:?}", key, outcome);
        Ok(outcome)
    }

    /// Factory and router information for a dex on a network
    pub async fn get_dex_info(&self, dex: &str, chain_id: ChainId) -> Result<Option<DexInfo>> {
        let key = StoreKey::DexInfo {
            network: self.network_name(chain_id)?.to_string(),
            dex: dex.to_string(),
        };
        let document = self.store.load(&key).await;
        if document.is_empty() {
            return Ok(None);
        }

        match serde_json::from_value(Value::Object(document)) {
            Ok(info) => Ok(Some(info)),
            Err(e) => {
                warn!("Invalid dex info in {:?}: {}", key, e);
                Ok(None)
            }
        }
    }
}

/// Insert a pool leaf, creating only the hierarchy levels that are missing.
///
/// A level holding something other than an object is treated like a missing
/// level and replaced.
pub fn merge_pool(document: &mut Document, key: &PoolKey, entry: &PoolEntry) -> MergeOutcome {
    let tier = key.fee_tier.to_string();
    let leaf = Value::String(entry.as_stored().to_string());

    let quotes = match document.get_mut(&key.base) {
        Some(Value::Object(quotes)) => quotes,
        existing => {
            if let Some(other) = existing {
                warn!("Replacing malformed pool entry for base {}: {}", key.base, other);
            }
            let level = single(key.quote.clone(), single(tier, leaf));
            document.insert(key.base.clone(), level);
            return MergeOutcome::CreatedBase;
        }
    };

    let tiers = match quotes.get_mut(&key.quote) {
        Some(Value::Object(tiers)) => tiers,
        existing => {
            if let Some(other) = existing {
                warn!("Replacing malformed pool entry for {}/{}: {}", key.base, key.quote, other);
            }
            quotes.insert(key.quote.clone(), single(tier, leaf));
            return MergeOutcome::CreatedQuote;
        }
    };

    if tiers.contains_key(&tier) {
        return MergeOutcome::Unchanged;
    }

    tiers.insert(tier, leaf);
    MergeOutcome::CreatedTier
}

fn single(key: String, value: Value) -> Value {
    let mut map = Document::new();
    map.insert(key, value);
    Value::Object(map)
}

fn sort_keys(document: &mut Document) {
    let mut entries: Vec<(String, Value)> = std::mem::take(document).into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    *document = entries.into_iter().collect();
}
