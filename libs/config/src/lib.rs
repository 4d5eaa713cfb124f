//! # Asset Metadata Configuration
//!
//! Centralized configuration and constants shared by the asset metadata
//! services, so that chain ids, store layout names and remote defaults are
//! defined exactly once.
//!
//! ## Features
//!
//! - **Network Registry**: chain id to canonical network name mapping
//! - **Directory Platforms**: directory-service platform names to chain ids
//! - **Service Defaults**: sentinel values, store file layout, remote timeouts
//! - **Service Configuration**: TOML files with environment overrides
//!
//! ## Usage
//!
//! ```rust
//! use metadata_config::{NetworkRegistry, service};
//!
//! let registry = NetworkRegistry::default();
//! assert_eq!(registry.network_name(137), Some("polygon-pos"));
//!
//! let sentinel = service::store::POOL_SENTINEL;
//! assert_eq!(sentinel, "null");
//! ```

pub mod networks;
pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use networks::{platform_chain_id, ChainId, NetworkRegistry};
pub use service_config::{load_config, NetworkSettings, ResolverSettings, ServiceConfig};
