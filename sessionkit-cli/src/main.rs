//! Command-line companion for sessionkit.
//!
//! # Usage
//!
//! ```bash
//! # Print the explicit session a dApp would request, fee-token permissions included
//! sessionkit plan
//!
//! # List the tokens the relayer accepts for fees on Polygon
//! sessionkit fee-tokens --chain polygon
//!
//! # Send a raw JSON-RPC call to the node for Base
//! sessionkit rpc eth_blockNumber --chain base
//! sessionkit rpc eth_getBalance '["0x1111111111111111111111111111111111111111", "latest"]'
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `sessionkit.toml`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use sessionkit::chain::{ChainId, parse_chain_id};
use sessionkit::networks::chain_id_by_name;
use sessionkit::rpc::{FeeTokenSource, NodeRpc};
use sessionkit::session::SessionMode;
use sessionkit::timestamp::UnixTimestamp;
use sessionkit_http::{HttpNodeRpc, HttpRelayer};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "sessionkit", version, about = "Plan and inspect smart-wallet sessions")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = "sessionkit.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the configured explicit session and print its wire form.
    Plan,

    /// List the tokens the relayer accepts for fees.
    FeeTokens {
        /// Network name or chain id; defaults to the configured chain.
        #[arg(long)]
        chain: Option<String>,
    },

    /// Send a raw JSON-RPC call to the chain's node.
    Rpc {
        /// JSON-RPC method name.
        method: String,

        /// Params as a JSON array.
        #[arg(default_value = "[]")]
        params: String,

        /// Network name or chain id; defaults to the configured chain.
        #[arg(long)]
        chain: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!("sessionkit failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let config = CliConfig::load_from(&cli.config)?;
    tracing::debug!(
        path = %cli.config.display(),
        chain_id = config.provider.chain_id,
        "Loaded configuration"
    );

    let output = match cli.command {
        Command::Plan => plan(&config).await?,
        Command::FeeTokens { chain } => {
            let chain_id = resolve_chain(chain.as_deref(), &config)?;
            let relayer = HttpRelayer::new(config.relayer_endpoint())?;
            serde_json::to_value(relayer.fee_tokens(chain_id).await?)?
        }
        Command::Rpc {
            method,
            params,
            chain,
        } => {
            let chain_id = resolve_chain(chain.as_deref(), &config)?;
            let params: Value = serde_json::from_str(&params)?;
            let node = HttpNodeRpc::new(config.node_endpoint())?;
            node.request(chain_id, &method, &params).await?
        }
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn plan(config: &CliConfig) -> Result<Value, CliError> {
    let SessionMode::Explicit(session) = config.provider.session_mode(UnixTimestamp::now())?
    else {
        tracing::info!("No explicit session configured, implicit grants only");
        return Ok(json!({ "mode": "implicit" }));
    };

    let relayer = HttpRelayer::new(config.relayer_endpoint())?;
    let fee_tokens = relayer.fee_tokens(session.chain_id()).await?;
    let session = session.prepare(&fee_tokens)?;
    tracing::info!(
        chain_id = session.chain_id(),
        permissions = session.permissions().len(),
        fee_required = fee_tokens.is_fee_required,
        "Planned explicit session"
    );
    Ok(json!({ "mode": "explicit", "session": session }))
}

fn resolve_chain(arg: Option<&str>, config: &CliConfig) -> Result<ChainId, CliError> {
    match arg {
        None => Ok(config.provider.chain_id),
        Some(text) => parse_chain_id(text)
            .or_else(|| chain_id_by_name(text))
            .ok_or_else(|| CliError::UnknownChain(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_chain_accepts_names_and_ids() {
        let config = CliConfig::default();
        assert_eq!(resolve_chain(None, &config).unwrap(), 1);
        assert_eq!(resolve_chain(Some("polygon"), &config).unwrap(), 137);
        assert_eq!(resolve_chain(Some("0x2105"), &config).unwrap(), 8453);
        assert_eq!(resolve_chain(Some("42161"), &config).unwrap(), 42161);
        assert!(matches!(
            resolve_chain(Some("atlantis"), &config),
            Err(CliError::UnknownChain(_))
        ));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["sessionkit", "rpc", "eth_blockNumber", "--chain", "base"])
            .unwrap();
        match cli.command {
            Command::Rpc {
                method,
                params,
                chain,
            } => {
                assert_eq!(method, "eth_blockNumber");
                assert_eq!(params, "[]");
                assert_eq!(chain.as_deref(), Some("base"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_plan_without_session_is_implicit() {
        let output = plan(&CliConfig::default()).await.unwrap();
        assert_eq!(output, json!({ "mode": "implicit" }));
    }
}
