//! Service Configuration Module
//!
//! Provides configuration loading for the asset metadata services.
//! Supports loading from TOML files with environment-specific overrides.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::service;

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ServiceConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Resolver behaviour and remote source settings
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Per-network settings, keyed by canonical network name
    #[serde(default)]
    pub networks: HashMap<String, NetworkSettings>,
}

/// Global configuration settings; missing fields take their defaults
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
}

/// Resolver settings; unset values fall back to service defaults
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ResolverSettings {
    pub directory_url: Option<String>,
    pub directory_api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub retry_max_backoff_ms: Option<u64>,

    // Write-back switches for the token and decimals paths
    pub write_back_tokens: Option<bool>,
    pub write_back_decimals: Option<bool>,

    /// Sort top-level keys of token and decimals stores before writing
    pub sort_on_write: Option<bool>,
}

/// Settings for one network
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NetworkSettings {
    pub chain_id: u64,
    pub rpc_url: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(service::store::DEFAULT_DATA_DIR),
            log_level: "info".to_string(),
        }
    }
}

impl GlobalConfig {
    /// Tracing filter directive applying `log_level` to `target`
    pub fn log_directive(&self, target: &str) -> String {
        format!("{}={}", target, self.log_level)
    }
}

impl ServiceConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/asset_metadata.toml"));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (ASSETDATA_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("ASSETDATA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get settings for a network by canonical name
    pub fn get_network(&self, name: &str) -> Option<&NetworkSettings> {
        self.networks.get(name)
    }

    /// Expand environment variables in paths, URLs and secrets
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let data_dir = self.global.data_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&data_dir).context("Failed to expand data directory")?;
        self.global.data_dir = PathBuf::from(expanded.as_ref());

        if let Some(url) = &self.resolver.directory_url {
            let expanded = shellexpand::env(url).context("Failed to expand directory URL")?;
            self.resolver.directory_url = Some(expanded.to_string());
        }

        if let Some(key) = &self.resolver.directory_api_key {
            let expanded = shellexpand::env(key).context("Failed to expand directory API key")?;
            self.resolver.directory_api_key = Some(expanded.to_string());
        }

        for (name, network) in &mut self.networks {
            if let Some(rpc) = &network.rpc_url {
                let expanded = shellexpand::env(rpc)
                    .with_context(|| format!("Failed to expand RPC URL for {}", name))?;
                network.rpc_url = Some(expanded.to_string());
            }
        }

        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>, environment: Option<&str>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load(path, environment)?;
    config.expand_env_vars()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("asset_metadata.toml");

        let config_content = r#"
[global]
data_dir = "/tmp/crypto-data"
log_level = "debug"

[resolver]
max_retries = 5
sort_on_write = false

[networks.polygon-pos]
chain_id = 137
rpc_url = "https://polygon.example"

[networks.fantom]
chain_id = 250
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = ServiceConfig::load(Some(&config_path), None).unwrap();

        assert_eq!(config.global.data_dir, PathBuf::from("/tmp/crypto-data"));
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.resolver.max_retries, Some(5));
        assert_eq!(config.resolver.sort_on_write, Some(false));
        assert_eq!(config.resolver.write_back_tokens, None);

        let polygon = config.get_network("polygon-pos").unwrap();
        assert_eq!(polygon.chain_id, 137);
        assert_eq!(polygon.rpc_url.as_deref(), Some("https://polygon.example"));
        assert!(config.get_network("fantom").unwrap().rpc_url.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("asset_metadata.toml");
        fs::write(&config_path, "[resolver]\n").unwrap();

        let config = ServiceConfig::load(Some(&config_path), None).unwrap();
        assert_eq!(
            config.global.data_dir,
            PathBuf::from(service::store::DEFAULT_DATA_DIR)
        );
        assert!(config.networks.is_empty());
    }

    #[test]
    fn test_partial_global_section_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("asset_metadata.toml");
        fs::write(&config_path, "[global]\nlog_level = \"warn\"\n").unwrap();

        let config = ServiceConfig::load(Some(&config_path), None).unwrap();
        assert_eq!(
            config.global.data_dir,
            PathBuf::from(service::store::DEFAULT_DATA_DIR)
        );
        assert_eq!(config.global.log_level, "warn");
        assert_eq!(
            config.global.log_directive("asset_metadata_adapter"),
            "asset_metadata_adapter=warn"
        );
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempdir().unwrap();
        let result = ServiceConfig::load(Some(&dir.path().join("absent.toml")), None);
        assert!(result.is_err());
    }
}
