//! Asset Metadata CLI
//!
//! Resolves token addresses, decimals and pool addresses through the local
//! cache, falling back to the directory and RPC endpoints on a miss.

use anyhow::{Context, Result};
use asset_metadata_adapter::{MetadataConfig, MetadataResolver};
use clap::{Parser, Subcommand};
use metadata_config::load_config;
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "asset_metadata")]
#[command(about = "Resolve token and pool metadata across networks")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/asset_metadata.toml")]
    config: PathBuf,

    /// Environment (development, staging, production)
    #[arg(short, long)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Token contract address on a network
    Token {
        symbol: String,
        #[arg(long, default_value_t = 137)]
        chain_id: u64,
    },

    /// Token decimals
    Decimals {
        symbol: String,
        #[arg(long, default_value_t = 137)]
        chain_id: u64,
    },

    /// Pool address for a pair at a fee tier
    Pool {
        base: String,
        quote: String,
        #[arg(long, default_value_t = 500)]
        fee_tier: u32,
        #[arg(long, default_value = "uniswap")]
        dex: String,
        #[arg(long, default_value_t = 137)]
        chain_id: u64,
        /// Return the first populated cached tier instead
        #[arg(long)]
        cheapest: bool,
    },

    /// Factory and router addresses of a dex
    Dex {
        dex: String,
        #[arg(long, default_value_t = 137)]
        chain_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let service_config = load_config(Some(args.config.as_path()), args.environment.as_deref())
        .with_context(|| format!("Failed to load {:?}", args.config))?;

    // Initialize logging at the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                service_config
                    .global
                    .log_directive("asset_metadata_adapter")
                    .parse()?,
            ),
        )
        .init();

    let config = MetadataConfig::from_service_config(&service_config);

    let resolver = MetadataResolver::from_config(&config)?;

    match args.command {
        Command::Token { symbol, chain_id } => {
            let address = resolver.resolve_token_address(&symbol, chain_id).await?;
            print_result(&format!("{} on chain {}", symbol, chain_id), address);
        }
        Command::Decimals { symbol, chain_id } => {
            let decimals = resolver.resolve_decimals(&symbol, chain_id).await?;
            print_result(&format!("{} decimals", symbol), decimals);
        }
        Command::Pool {
            base,
            quote,
            fee_tier,
            dex,
            chain_id,
            cheapest,
        } => {
            let pool = resolver
                .resolve_pool_address(&base, &quote, fee_tier, &dex, chain_id, cheapest)
                .await?;
            print_result(&format!("{}/{} @ {} on {}", base, quote, fee_tier, dex), pool);
        }
        Command::Dex { dex, chain_id } => match resolver.dex_info(&dex, chain_id).await? {
            Some(info) => {
                println!("factory: {}", info.factory_address);
                if let Some(router) = info.router_address {
                    println!("router:  {}", router);
                }
                if let Some(quoter) = info.quoter_address {
                    println!("quoter:  {}", quoter);
                }
            }
            None => println!("{} on chain {}: not found", dex, chain_id),
        },
    }

    info!("Metrics: {:?}", resolver.get_metrics().await);
    Ok(())
}

fn print_result<T: std::fmt::Display>(label: &str, value: Option<T>) {
    match value {
        Some(value) => println!("{}: {}", label, value),
        None => println!("{}: not found", label),
    }
}
