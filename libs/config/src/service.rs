//! Service configuration and defaults
//!
//! This module contains default configuration values and constants
//! used across the asset metadata services for consistency.

/// Chain-level constants
pub mod chain {
    /// Zero address returned by factories when no pool exists
    pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
}

/// Local store defaults
pub mod store {
    /// Stored in place of a pool address when the factory has no pool
    pub const POOL_SENTINEL: &str = "null";

    /// Default data directory
    pub const DEFAULT_DATA_DIR: &str = "./data/asset_metadata";

    /// Directory holding per-network stores
    pub const NETWORK_DATA_DIR: &str = "network-data";

    /// Location of the global decimals store, relative to the data directory
    pub const DECIMALS_FILE: &str = "token-standards/decimals/tokenDecimals.json";
}

/// Remote source defaults
pub mod remote {
    /// Address directory endpoint
    pub const DIRECTORY_URL: &str = "https://pro-api.coinmarketcap.com/v1/cryptocurrency/info";

    /// Per-attempt timeout (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

    /// Maximum attempts per remote call
    pub const MAX_RETRIES: u32 = 3;

    /// Retry backoff base (milliseconds), doubled per attempt
    pub const RETRY_BACKOFF_BASE_MS: u64 = 500;

    /// Upper bound on a single retry backoff (milliseconds)
    pub const RETRY_BACKOFF_MAX_MS: u64 = 30_000;
}
