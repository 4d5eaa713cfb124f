//! Remote sources consulted on a cache miss
//!
//! Each source is a plain request/response boundary. Caching, write-back
//! and NotFound handling belong to the resolver; timeouts and retries
//! belong here, inside each adapter.

pub mod directory;
pub mod retry;
pub mod rpc_client;

use async_trait::async_trait;
use metadata_config::ChainId;

use crate::error::QueryError;
use crate::types::{FeeTier, NetworkAddresses};

pub use directory::DirectoryClient;
pub use retry::RetryPolicy;
pub use rpc_client::RpcClient;

/// Symbol → per-network address directory
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Addresses of a symbol on every network the directory knows.
    ///
    /// An unknown symbol yields an empty map, not an error.
    async fn fetch_addresses(&self, symbol: &str) -> Result<NetworkAddresses, QueryError>;
}

/// On-chain decimals lookup
#[async_trait]
pub trait DecimalsSource: Send + Sync {
    async fn fetch_decimals(&self, address: &str, chain_id: ChainId) -> Result<u8, QueryError>;
}

/// Factory-based pool discovery request
#[derive(Debug, Clone)]
pub struct PoolQuery {
    pub token0: String,
    pub token1: String,
    pub fee_tier: FeeTier,
    pub factory_address: String,
    /// Factory interface description (JSON ABI)
    pub factory_abi: serde_json::Value,
    pub chain_id: ChainId,
}

/// On-chain pool discovery
#[async_trait]
pub trait PoolSource: Send + Sync {
    /// Pool address reported by the factory; the zero address means no pool
    async fn fetch_pool(&self, query: &PoolQuery) -> Result<String, QueryError>;
}
