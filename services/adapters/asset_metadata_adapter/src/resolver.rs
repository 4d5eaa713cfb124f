//! Asset Metadata Resolver
//!
//! Resolves token addresses, token decimals and pool addresses. Every
//! lookup reads the local cache first; only a miss reaches a remote source,
//! and a successful remote result is written back before it is returned.
//!
//! A value found in the cache is returned as-is. Cached facts are assumed
//! immutable, so nothing is ever refreshed.
//!
//! "Not found" is `Ok(None)`. Remote failures are logged and reported as
//! not found; only registry, dex-info and store failures are errors.

use anyhow::Context;
use metadata_config::ChainId;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::config::MetadataConfig;
use crate::error::{MetadataError, Result};
use crate::sources::{
    AddressSource, DecimalsSource, DirectoryClient, PoolQuery, PoolSource, RpcClient,
};
use crate::store::JsonFileStore;
use crate::tier::{cheapest_tier, select_cheapest};
use crate::types::{DexInfo, FeeTier, MergeOutcome, PoolEntry, PoolKey};

/// Resolver
///
/// The only entry point callers need: owns the cache and the three remote
/// sources and runs cache → remote → write-back for each lookup.
pub struct MetadataResolver {
    /// Local cache over persisted stores
    cache: Arc<LocalCache>,

    /// Symbol → per-network address directory
    addresses: Arc<dyn AddressSource>,

    /// On-chain decimals
    decimals: Arc<dyn DecimalsSource>,

    /// On-chain pool discovery
    pools: Arc<dyn PoolSource>,

    options: ResolverOptions,

    /// Metrics
    metrics: Arc<RwLock<Metrics>>,
}

/// Write-back switches for the token and decimals paths.
///
/// Pool results are always written back.
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    pub write_back_tokens: bool,
    pub write_back_decimals: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            write_back_tokens: true,
            write_back_decimals: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Metrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub remote_fetches: u64,
    pub remote_failures: u64,
    pub store_writes: u64,
}

impl MetadataResolver {
    pub fn new(
        cache: LocalCache,
        addresses: Arc<dyn AddressSource>,
        decimals: Arc<dyn DecimalsSource>,
        pools: Arc<dyn PoolSource>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            cache: Arc::new(cache),
            addresses,
            decimals,
            pools,
            options,
            metrics: Arc::new(RwLock::new(Metrics::default())),
        }
    }

    /// Build a resolver with file-backed stores and the production sources
    pub fn from_config(config: &MetadataConfig) -> anyhow::Result<Self> {
        let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
        let cache = LocalCache::new(store, config.registry(), config.sort_on_write);

        let retry = config.retry_policy();
        let directory = DirectoryClient::new(
            config.directory_url.clone(),
            config.directory_api_key.clone(),
            retry.clone(),
        )
        .context("Failed to create directory client")?;
        let rpc = Arc::new(RpcClient::new(&config.rpc_urls, retry));

        info!(
            "Asset Metadata Resolver initialized: data dir {:?}, {} RPC endpoints",
            config.data_dir,
            config.rpc_urls.len()
        );

        Ok(Self::new(
            cache,
            Arc::new(directory),
            rpc.clone(),
            rpc,
            ResolverOptions {
                write_back_tokens: config.write_back_tokens,
                write_back_decimals: config.write_back_decimals,
            },
        ))
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Address of a token on one network
    pub async fn resolve_token_address(
        &self,
        symbol: &str,
        chain_id: ChainId,
    ) -> Result<Option<String>> {
        // Check cache first
        if let Some(address) = self.cache.get_token(symbol, chain_id).await? {
            self.metrics.write().await.cache_hits += 1;
            debug!("Cache hit for {} on chain {}", symbol, chain_id);
            return Ok(Some(address));
        }

        self.metrics.write().await.cache_misses += 1;
        info!("Cache miss for {} on chain {}, querying directory", symbol, chain_id);

        let addresses = match self.addresses.fetch_addresses(symbol).await {
            Ok(addresses) => {
                self.metrics.write().await.remote_fetches += 1;
                addresses
            }
            Err(e) => {
                self.metrics.write().await.remote_failures += 1;
                warn!("Directory lookup failed for {}: {}", symbol, e);
                return Ok(None);
            }
        };

        if addresses.is_empty() {
            debug!("Directory has no addresses for {}", symbol);
            return Ok(None);
        }

        // Write back every network returned, not just the requested one
        if self.options.write_back_tokens {
            let skipped = self.cache.put_token_all(symbol, &addresses).await?;
            self.metrics.write().await.store_writes += (addresses.len() - skipped.len()) as u64;
        }

        let address = addresses.get(&chain_id).cloned();
        if address.is_none() {
            debug!("{} is not deployed on chain {}", symbol, chain_id);
        }
        Ok(address)
    }

    /// Decimals of a token.
    ///
    /// The token address on `chain_id` is resolved first, since decimals are
    /// read from the token contract. Cached decimals are shared by every
    /// network.
    pub async fn resolve_decimals(&self, symbol: &str, chain_id: ChainId) -> Result<Option<u8>> {
        if let Some(decimals) = self.cache.get_decimals(symbol).await? {
            self.metrics.write().await.cache_hits += 1;
            debug!("Cache hit for {} decimals", symbol);
            return Ok(Some(decimals));
        }

        self.metrics.write().await.cache_misses += 1;

        let Some(address) = self.resolve_token_address(symbol, chain_id).await? else {
            debug!("No address for {} on chain {}, decimals unknown", symbol, chain_id);
            return Ok(None);
        };

        info!("Querying decimals of {} ({}) on chain {}", symbol, address, chain_id);
        let decimals = match self.decimals.fetch_decimals(&address, chain_id).await {
            Ok(decimals) => {
                self.metrics.write().await.remote_fetches += 1;
                decimals
            }
            Err(e) => {
                self.metrics.write().await.remote_failures += 1;
                warn!("Decimals query failed for {} on chain {}: {}", symbol, chain_id, e);
                return Ok(None);
            }
        };

        if self.options.write_back_decimals {
            self.cache.put_decimals(symbol, decimals).await?;
            self.metrics.write().await.store_writes += 1;
        }

        Ok(Some(decimals))
    }

    /// Address of the pool for a pair at a fee tier.
    ///
    /// With `find_cheapest`, the first populated cached tier of the pair is
    /// returned instead when one exists; otherwise the requested tier is
    /// resolved normally.
    pub async fn resolve_pool_address(
        &self,
        base: &str,
        quote: &str,
        fee_tier: FeeTier,
        dex: &str,
        chain_id: ChainId,
        find_cheapest: bool,
    ) -> Result<Option<String>> {
        let key = PoolKey::new(base, quote, fee_tier, dex, chain_id);

        if find_cheapest {
            if let Some(tiers) = self.cache.get_fee_tiers(base, quote, dex, chain_id).await? {
                if let Some(address) = select_cheapest(&tiers) {
                    self.metrics.write().await.cache_hits += 1;
                    debug!(
                        "Cheapest cached tier for {}/{}: {} (fee tier {:?})",
                        base,
                        quote,
                        address,
                        cheapest_tier(&tiers)
                    );
                    return Ok(Some(address.to_string()));
                }
                debug!("No populated tier cached for {}/{}", base, quote);
            }
        }

        if let Some(entry) = self.cache.get_pool(&key).await? {
            self.metrics.write().await.cache_hits += 1;
            debug!("Cache hit for pool {}", key);
            return Ok(entry.into_address());
        }

        self.metrics.write().await.cache_misses += 1;
        info!("Cache miss for pool {}, discovering via factory", key);

        let Some(token0) = self.resolve_token_address(base, chain_id).await? else {
            debug!("No address for {} on chain {}, pool unknown", base, chain_id);
            return Ok(None);
        };
        let Some(token1) = self.resolve_token_address(quote, chain_id).await? else {
            debug!("No address for {} on chain {}, pool unknown", quote, chain_id);
            return Ok(None);
        };

        let dex_info = self.dex_info(dex, chain_id).await?.ok_or_else(|| {
            MetadataError::UnknownDex {
                dex: dex.to_string(),
                network: self
                    .cache
                    .registry()
                    .network_name(chain_id)
                    .unwrap_or_default()
                    .to_string(),
            }
        })?;

        let query = PoolQuery {
            token0,
            token1,
            fee_tier,
            factory_address: dex_info.factory_address,
            factory_abi: dex_info.factory_abi,
            chain_id,
        };

        let fetched = match self.pools.fetch_pool(&query).await {
            Ok(address) => {
                self.metrics.write().await.remote_fetches += 1;
                address
            }
            Err(e) => {
                self.metrics.write().await.remote_failures += 1;
                warn!("Pool discovery failed for {}: {}", key, e);
                return Ok(None);
            }
        };

        // Zero address becomes the sentinel before anything is stored
        let entry = PoolEntry::from_address(&fetched);
        let outcome = self.cache.put_pool(&key, &entry).await?;
        self.metrics.write().await.store_writes += 1;

        if outcome == MergeOutcome::Unchanged {
            // Another writer stored this tier first; the stored value wins
            return Ok(self.cache.get_pool(&key).await?.and_then(PoolEntry::into_address));
        }

        match &entry {
            PoolEntry::Address(address) => info!("Discovered pool {}: {}", key, address),
            PoolEntry::Missing => info!("No pool exists for {}", key),
        }
        Ok(entry.into_address())
    }

    /// Factory and router information of a dex on a network
    pub async fn dex_info(&self, dex: &str, chain_id: ChainId) -> Result<Option<DexInfo>> {
        self.cache.get_dex_info(dex, chain_id).await
    }

    /// Get current metrics
    pub async fn get_metrics(&self) -> Metrics {
        self.metrics.read().await.clone()
    }
}
