//! RPC client for on-chain token and pool lookups
//!
//! Handles all contract reads: ERC-20 `decimals()` and factory
//! `getPool(token0, token1, fee)`. One HTTP transport per configured network.

use async_trait::async_trait;
use metadata_config::ChainId;
use std::collections::HashMap;
use tracing::{debug, warn};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::{Address, H160, U256};
use web3::Web3;

use super::{DecimalsSource, PoolQuery, PoolSource, RetryPolicy};
use crate::error::QueryError;

/// ERC20 ABI for decimals() function
const ERC20_DECIMALS_ABI: &str = r#"[{"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"type":"function"}]"#;

pub struct RpcClient {
    web3_clients: HashMap<ChainId, Web3<Http>>,
    retry: RetryPolicy,
}

impl RpcClient {
    /// Create clients for every configured endpoint.
    ///
    /// Endpoints that fail to parse are skipped; calls for their network
    /// then fail with `NoEndpoint`.
    pub fn new(rpc_urls: &HashMap<ChainId, String>, retry: RetryPolicy) -> Self {
        let mut web3_clients = HashMap::new();

        for (chain_id, url) in rpc_urls {
            match Http::new(url) {
                Ok(transport) => {
                    web3_clients.insert(*chain_id, Web3::new(transport));
                }
                Err(e) => warn!("Invalid RPC endpoint for chain {}: {}", chain_id, e),
            }
        }

        debug!("RPC client ready for {} networks", web3_clients.len());
        Self {
            web3_clients,
            retry,
        }
    }

    fn client(&self, chain_id: ChainId) -> Result<&Web3<Http>, QueryError> {
        self.web3_clients
            .get(&chain_id)
            .ok_or(QueryError::NoEndpoint(chain_id))
    }
}

#[async_trait]
impl DecimalsSource for RpcClient {
    async fn fetch_decimals(&self, address: &str, chain_id: ChainId) -> Result<u8, QueryError> {
        let web3 = self.client(chain_id)?;
        let token = parse_address(address)?;

        self.retry
            .run("decimals query", || async move {
                let contract = Contract::from_json(web3.eth(), token, ERC20_DECIMALS_ABI.as_bytes())
                    .map_err(|e| QueryError::MissingInterface(e.to_string()))?;

                let decimals: u8 = contract
                    .query("decimals", (), None, Options::default(), None)
                    .await?;

                Ok(decimals)
            })
            .await
    }
}

#[async_trait]
impl PoolSource for RpcClient {
    async fn fetch_pool(&self, query: &PoolQuery) -> Result<String, QueryError> {
        let web3 = self.client(query.chain_id)?;
        let factory = parse_address(&query.factory_address)?;
        let token0 = parse_address(&query.token0)?;
        let token1 = parse_address(&query.token1)?;
        let fee = U256::from(query.fee_tier);

        if !query.factory_abi.is_array() {
            return Err(QueryError::MissingInterface(
                "factory ABI is not a JSON array".to_string(),
            ));
        }
        let abi = serde_json::to_vec(&query.factory_abi)
            .map_err(|e| QueryError::MissingInterface(e.to_string()))?;
        let abi = abi.as_slice();

        let pool = self
            .retry
            .run("getPool query", || async move {
                let contract = Contract::from_json(web3.eth(), factory, abi)
                    .map_err(|e| QueryError::MissingInterface(e.to_string()))?;

                let pool: Address = contract
                    .query("getPool", (token0, token1, fee), None, Options::default(), None)
                    .await?;

                Ok(pool)
            })
            .await?;

        Ok(format_address(&pool))
    }
}

/// Parse a 0x-prefixed 20-byte hex address
pub fn parse_address(address: &str) -> Result<H160, QueryError> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    let bytes = hex::decode(digits).map_err(|_| QueryError::InvalidAddress(address.to_string()))?;
    if bytes.len() != 20 {
        return Err(QueryError::InvalidAddress(address.to_string()));
    }

    Ok(H160::from_slice(&bytes))
}

/// Lowercase 0x-prefixed form of an address
pub fn format_address(address: &H160) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174").unwrap();
        assert_eq!(
            format_address(&parsed),
            "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
        );
        assert!(parse_address("2791Bca1f2de4661ED88A30C99A7a9449Aa84174").is_ok());
    }

    #[test]
    fn test_parse_address_rejects_bad_input() {
        assert!(matches!(parse_address("0x1234"), Err(QueryError::InvalidAddress(_))));
        assert!(matches!(
            parse_address("rndrizKT3MK1iimdxRdWabcF7Zg7AR5T4nud4EkHBof"),
            Err(QueryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_zero_address_format() {
        assert_eq!(
            format_address(&H160::zero()),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[tokio::test]
    async fn test_missing_endpoint() {
        let client = RpcClient::new(&HashMap::new(), RetryPolicy::default());
        let result = client
            .fetch_decimals("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", 137)
            .await;
        assert!(matches!(result, Err(QueryError::NoEndpoint(137))));
    }

    #[tokio::test]
    #[ignore] // Run with --ignored flag to test with real RPC
    async fn test_real_polygon_decimals() {
        let urls = HashMap::from([(137, "https://polygon-rpc.com".to_string())]);
        let retry = RetryPolicy::new(3, Duration::from_secs(15), Duration::from_millis(500));
        let client = RpcClient::new(&urls, retry);

        let decimals = client
            .fetch_decimals("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", 137)
            .await
            .expect("USDC decimals query failed");
        assert_eq!(decimals, 6, "USDC should have 6 decimals");
    }
}
