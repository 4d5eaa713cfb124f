//! Configuration for the Asset Metadata Adapter

use metadata_config::service::{remote, store};
use metadata_config::{ChainId, NetworkRegistry, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::sources::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Root directory of the persisted stores
    pub data_dir: PathBuf,

    /// Address directory endpoint
    pub directory_url: String,

    /// Address directory API key
    pub directory_api_key: Option<String>,

    /// RPC endpoint per chain id
    pub rpc_urls: HashMap<ChainId, String>,

    /// Networks added to the default registry (chain id → name)
    pub extra_networks: HashMap<ChainId, String>,

    /// Per-attempt timeout for remote calls in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum attempts for failed remote calls
    pub max_retries: u32,

    /// Retry backoff base in milliseconds
    pub retry_backoff_ms: u64,

    /// Ceiling for a single retry backoff in milliseconds
    pub retry_max_backoff_ms: u64,

    /// Persist addresses fetched from the directory
    pub write_back_tokens: bool,

    /// Persist decimals fetched on-chain
    pub write_back_decimals: bool,

    /// Sort token and decimals stores by key before writing
    pub sort_on_write: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(store::DEFAULT_DATA_DIR),
            directory_url: remote::DIRECTORY_URL.to_string(),
            directory_api_key: None,
            rpc_urls: HashMap::new(),
            extra_networks: HashMap::new(),
            request_timeout_ms: remote::REQUEST_TIMEOUT_MS,
            max_retries: remote::MAX_RETRIES,
            retry_backoff_ms: remote::RETRY_BACKOFF_BASE_MS,
            retry_max_backoff_ms: remote::RETRY_BACKOFF_MAX_MS,
            write_back_tokens: true,
            write_back_decimals: true,
            sort_on_write: true,
        }
    }
}

impl MetadataConfig {
    /// Build from loaded service configuration, defaulting unset values
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        let defaults = Self::default();
        let resolver = &config.resolver;
        let registry = NetworkRegistry::default();

        let mut rpc_urls = HashMap::new();
        let mut extra_networks = HashMap::new();
        for (name, network) in &config.networks {
            if let Some(url) = &network.rpc_url {
                rpc_urls.insert(network.chain_id, url.clone());
            }
            if registry.network_name(network.chain_id) != Some(name.as_str()) {
                extra_networks.insert(network.chain_id, name.clone());
            }
        }

        Self {
            data_dir: config.global.data_dir.clone(),
            directory_url: resolver
                .directory_url
                .clone()
                .unwrap_or(defaults.directory_url),
            directory_api_key: resolver.directory_api_key.clone(),
            rpc_urls,
            extra_networks,
            request_timeout_ms: resolver
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
            max_retries: resolver.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_ms: resolver
                .retry_backoff_ms
                .unwrap_or(defaults.retry_backoff_ms),
            retry_max_backoff_ms: resolver
                .retry_max_backoff_ms
                .unwrap_or(defaults.retry_max_backoff_ms),
            write_back_tokens: resolver
                .write_back_tokens
                .unwrap_or(defaults.write_back_tokens),
            write_back_decimals: resolver
                .write_back_decimals
                .unwrap_or(defaults.write_back_decimals),
            sort_on_write: resolver.sort_on_write.unwrap_or(defaults.sort_on_write),
        }
    }

    /// Default registry extended with configured networks
    pub fn registry(&self) -> NetworkRegistry {
        self.extra_networks
            .iter()
            .fold(NetworkRegistry::default(), |registry, (id, name)| {
                registry.with_network(*id, name.clone())
            })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.request_timeout_ms),
            Duration::from_millis(self.retry_backoff_ms),
        )
        .with_max_backoff(Duration::from_millis(self.retry_max_backoff_ms))
    }
}
