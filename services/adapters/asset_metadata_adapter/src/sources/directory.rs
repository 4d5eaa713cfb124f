//! Address directory client
//!
//! Queries a CoinMarketCap-style `/cryptocurrency/info` endpoint for the
//! contract addresses of a symbol on every platform it is listed on.

use async_trait::async_trait;
use metadata_config::platform_chain_id;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{AddressSource, RetryPolicy};
use crate::error::QueryError;
use crate::types::NetworkAddresses;

/// Symbols the directory lists under a different ticker
const SYMBOL_ALIASES: &[(&str, &str)] = &[("USDC.e", "USDCE")];

/// Ticker to send to the directory for a locally used symbol
pub fn directory_symbol(symbol: &str) -> &str {
    SYMBOL_ALIASES
        .iter()
        .find(|(local, _)| *local == symbol)
        .map(|(_, remote)| *remote)
        .unwrap_or(symbol)
}

/// Top-level `/cryptocurrency/info` response
#[derive(Debug, Deserialize)]
pub struct InfoResponse {
    #[serde(default)]
    pub data: HashMap<String, TokenListing>,
}

/// Directory entry for one symbol
#[derive(Debug, Deserialize)]
pub struct TokenListing {
    /// Platform the token is native to; absent for layer-1 coins
    #[serde(default)]
    pub platform: Option<NativePlatform>,

    #[serde(default)]
    pub contract_address: Vec<ContractListing>,
}

#[derive(Debug, Deserialize)]
pub struct NativePlatform {
    pub name: String,
    pub token_address: String,
}

#[derive(Debug, Deserialize)]
pub struct ContractListing {
    pub contract_address: String,
    pub platform: ContractPlatform,
}

#[derive(Debug, Deserialize)]
pub struct ContractPlatform {
    pub name: String,
}

/// Collect per-network addresses for `symbol` from a directory response.
///
/// Platforms without a numeric chain id are skipped.
pub fn parse_listing(symbol: &str, response: &InfoResponse) -> NetworkAddresses {
    let mut addresses = NetworkAddresses::new();

    let Some(listing) = response.data.get(symbol) else {
        return addresses;
    };

    let native = listing
        .platform
        .iter()
        .map(|p| (p.name.as_str(), p.token_address.as_str()));
    let contracts = listing
        .contract_address
        .iter()
        .map(|c| (c.platform.name.as_str(), c.contract_address.as_str()));

    for (platform, address) in native.chain(contracts) {
        match platform_chain_id(platform) {
            Some(chain_id) => {
                addresses.insert(chain_id, address.to_string());
            }
            None => debug!("Skipping {} on unmapped platform {}", symbol, platform),
        }
    }

    addresses
}

/// HTTP client for the address directory
pub struct DirectoryClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl DirectoryClient {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        retry: RetryPolicy,
    ) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(retry.timeout)
            .build()
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
            api_key,
            retry,
        })
    }

    async fn request(&self, symbol: &str) -> Result<NetworkAddresses, QueryError> {
        let mut request = self.http.get(&self.url).query(&[("symbol", symbol)]);
        if let Some(key) = &self.api_key {
            request = request.header("X-CMC_PRO_API_KEY", key);
        }

        let response = request.send().await?;
        let status = response.status();

        // The directory answers 400 for symbols it has never listed
        if status == StatusCode::BAD_REQUEST {
            debug!("Directory has no listing for {}", symbol);
            return Ok(NetworkAddresses::new());
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(QueryError::Transport(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(QueryError::Rejected(format!("HTTP {}", status)));
        }

        let body: InfoResponse = response.json().await?;
        Ok(parse_listing(symbol, &body))
    }
}

#[async_trait]
impl AddressSource for DirectoryClient {
    async fn fetch_addresses(&self, symbol: &str) -> Result<NetworkAddresses, QueryError> {
        let query_symbol = directory_symbol(symbol);
        if query_symbol != symbol {
            debug!("Querying directory for {} as {}", symbol, query_symbol);
        }

        let addresses = self
            .retry
            .run("directory lookup", || self.request(query_symbol))
            .await?;

        info!("Directory returned {} networks for {}", addresses.len(), symbol);
        Ok(addresses)
    }
}
