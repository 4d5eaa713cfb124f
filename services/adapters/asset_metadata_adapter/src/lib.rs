//! Asset Metadata Adapter
//!
//! Resolves identifying metadata for tokens and trading venues across
//! networks: token contract addresses, token decimals and liquidity pool
//! addresses. A local persisted cache is always consulted first; remote
//! lookups only happen on a miss and their results are written back.
//!
//! Features:
//! - Per-network token address stores, a global decimals store and
//!   per-(network, dex) pool stores, persisted as JSON
//! - Address directory lookups over HTTP
//! - Decimals and pool discovery via contract reads over RPC
//! - Per-file locking around every read-modify-write
//! - Timeouts and bounded retries for remote calls

pub mod cache;
pub mod config;
pub mod error;
pub mod resolver;
pub mod sources;
pub mod store;
pub mod tier;
pub mod types;

pub use cache::LocalCache;
pub use config::MetadataConfig;
pub use error::{MetadataError, QueryError, StoreError};
pub use resolver::{MetadataResolver, Metrics, ResolverOptions};
pub use sources::{AddressSource, DecimalsSource, PoolQuery, PoolSource};
pub use store::{JsonFileStore, MemoryStore, Store, StoreKey};
pub use tier::select_cheapest;
pub use types::{DexInfo, FeeTier, MergeOutcome, NetworkAddresses, PoolEntry, PoolKey};
