//! Cache Persistence Tests
//!
//! Ensures cached metadata is written to the on-disk layout and survives
//! restarts of the resolver.

use asset_metadata_adapter::{
    AddressSource, DecimalsSource, JsonFileStore, LocalCache, MetadataResolver, NetworkAddresses,
    PoolEntry, PoolKey, PoolQuery, PoolSource, QueryError, ResolverOptions, Store, StoreKey,
};
use async_trait::async_trait;
use metadata_config::{ChainId, NetworkRegistry};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const RNDR_POLYGON: &str = "0x61299774020dA444Af134c82fa83E3810b309991";
const RNDR_ETHEREUM: &str = "0x6De037ef9aD2725EB40118Bb1702EBb27e4Aeb24";
const USDC_POLYGON: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";

/// Remote stub that counts every call it receives
#[derive(Default)]
struct CountingRemote {
    calls: AtomicUsize,
}

#[async_trait]
impl AddressSource for CountingRemote {
    async fn fetch_addresses(&self, symbol: &str) -> Result<NetworkAddresses, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match symbol {
            "RNDR" => NetworkAddresses::from([
                (137, RNDR_POLYGON.to_string()),
                (1, RNDR_ETHEREUM.to_string()),
                // Fantom has no registry entry and is skipped
                (250, "0x0000000000000000000000000000000000000250".to_string()),
            ]),
            "USDC" => NetworkAddresses::from([(137, USDC_POLYGON.to_string())]),
            _ => NetworkAddresses::new(),
        })
    }
}

#[async_trait]
impl DecimalsSource for CountingRemote {
    async fn fetch_decimals(&self, _address: &str, _chain_id: ChainId) -> Result<u8, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(18)
    }
}

#[async_trait]
impl PoolSource for CountingRemote {
    async fn fetch_pool(&self, _query: &PoolQuery) -> Result<String, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("0x0000000000000000000000000000000000000000".to_string())
    }
}

fn resolver_at(dir: &Path, remote: Arc<CountingRemote>) -> MetadataResolver {
    let store = Arc::new(JsonFileStore::new(dir));
    let cache = LocalCache::new(store, NetworkRegistry::default(), true);
    MetadataResolver::new(
        cache,
        remote.clone(),
        remote.clone(),
        remote,
        ResolverOptions::default(),
    )
}

fn write_dex_info(dir: &Path) {
    let path = dir.join("network-data/polygon-pos/dexs/uniswap/uniswap_polygon-pos_info.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        r#"{
  "factoryAddress": "0x1F98431c8aD98523631AE4a59f267346ea31F984",
  "factoryAbi": [],
  "routerAddress": "0xE592427A0AEce92De3Edee1F18E0157C05861564"
}"#,
    )
    .unwrap();
}

#[tokio::test]
async fn test_cache_persistence_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write_dex_info(dir);

    // Phase 1: resolve everything remotely
    {
        let remote = Arc::new(CountingRemote::default());
        let resolver = resolver_at(dir, remote.clone());

        let address = resolver.resolve_token_address("RNDR", 137).await.unwrap();
        assert_eq!(address.as_deref(), Some(RNDR_POLYGON));

        let decimals = resolver.resolve_decimals("RNDR", 137).await.unwrap();
        assert_eq!(decimals, Some(18));

        let pool = resolver
            .resolve_pool_address("RNDR", "USDC", 100, "uniswap", 137, false)
            .await
            .unwrap();
        assert!(pool.is_none());

        // RNDR directory, decimals, USDC directory, factory
        assert_eq!(remote.calls.load(Ordering::SeqCst), 4);
    }

    // Phase 2: a fresh resolver answers from disk only
    {
        let remote = Arc::new(CountingRemote::default());
        let resolver = resolver_at(dir, remote.clone());

        assert_eq!(
            resolver.resolve_token_address("RNDR", 1).await.unwrap().as_deref(),
            Some(RNDR_ETHEREUM)
        );
        assert_eq!(resolver.resolve_decimals("RNDR", 137).await.unwrap(), Some(18));
        assert!(resolver
            .resolve_pool_address("RNDR", "USDC", 100, "uniswap", 137, false)
            .await
            .unwrap()
            .is_none());

        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    // Verify the on-disk layout
    let polygon_tokens = fs::read_to_string(
        dir.join("network-data/polygon-pos/tokens/polygon-pos_token_addresses.json"),
    )
    .unwrap();
    assert!(polygon_tokens.contains(RNDR_POLYGON));
    assert!(polygon_tokens.contains(USDC_POLYGON));
    assert!(!dir.join("network-data/fantom").exists());

    let decimals =
        fs::read_to_string(dir.join("token-standards/decimals/tokenDecimals.json")).unwrap();
    assert_eq!(decimals, "{\n  \"RNDR\": 18\n}");

    let pools = fs::read_to_string(
        dir.join("network-data/polygon-pos/dexs/uniswap/uniswap_polygon-pos_pools.json"),
    )
    .unwrap();
    assert!(pools.contains("\"100\": \"null\""));
    assert!(!pools.contains("0x0000000000000000000000000000000000000000"));
}

#[tokio::test]
async fn test_corrupt_store_recovered_on_write() {
    let temp_dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(temp_dir.path());
    let key = StoreKey::TokenAddresses {
        network: "ethereum".to_string(),
    };

    let path = store.path_for(&key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[1, 2,").unwrap();

    let cache = LocalCache::new(Arc::new(store), NetworkRegistry::default(), true);
    assert_eq!(cache.get_token("RNDR", 1).await.unwrap(), None);

    let addresses = NetworkAddresses::from([(1, RNDR_ETHEREUM.to_string())]);
    cache.put_token_all("RNDR", &addresses).await.unwrap();

    let contents: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(contents, serde_json::json!({ "RNDR": RNDR_ETHEREUM }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pool_writes_not_lost() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::new(temp_dir.path()));
    let cache = Arc::new(LocalCache::new(store.clone(), NetworkRegistry::default(), true));

    let mut handles = Vec::new();
    for fee in [100u32, 500, 3000, 10000] {
        for quote in ["USDC", "DAI", "USDT"] {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = PoolKey::new("WETH", quote, fee, "uniswap", 137);
                let entry = PoolEntry::from_address(&format!("0x{}{}", quote, fee));
                cache.put_pool(&key, &entry).await.unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let document = store
        .load(&StoreKey::Pools {
            network: "polygon-pos".to_string(),
            dex: "uniswap".to_string(),
        })
        .await;
    let quotes = document["WETH"].as_object().unwrap();
    assert_eq!(quotes.len(), 3);
    for quote in ["USDC", "DAI", "USDT"] {
        assert_eq!(quotes[quote].as_object().unwrap().len(), 4);
    }
}

#[tokio::test]
async fn test_dex_info_read_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    write_dex_info(temp_dir.path());

    let resolver = resolver_at(temp_dir.path(), Arc::new(CountingRemote::default()));
    let info = resolver.dex_info("uniswap", 137).await.unwrap().unwrap();

    assert_eq!(info.factory_address, "0x1F98431c8aD98523631AE4a59f267346ea31F984");
    assert_eq!(
        info.router_address.as_deref(),
        Some("0xE592427A0AEce92De3Edee1F18E0157C05861564")
    );
    assert!(info.quoter_address.is_none());
}
