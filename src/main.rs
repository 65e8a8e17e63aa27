//! relay-deployer
//!
//! Deploys a contract from a pre-signed transaction through the ledger's
//! JSON-RPC relay.
//!
//! # Flow
//!
//! ```text
//!   env / --config ──▶ DeployConfig ──▶ decode signer ──▶ fund signer ──▶ read nonce
//!                                                                          │
//!   summary (stdout) ◀── follow-up read ◀── contract address ◀── submit ◀──┘
//! ```
//!
//! # Environment
//!
//! | Variable                  | Required | Default   |
//! |---------------------------|----------|-----------|
//! | `OPERATOR_ID`             | yes      |           |
//! | `OPERATOR_KEY`            | yes      |           |
//! | `SIGNED_TX`               | yes      |           |
//! | `HEDERA_NETWORK`          | no       | `testnet` |
//! | `MAX_GAS_ALLOWANCE_HBAR`  | no       | `10`      |
//! | `MIN_SIGNER_BALANCE_HBAR` | no       | `1`       |
//! | `RELAY_URL`, `MIRROR_URL` | no       | preset    |
//! | `LOG_FORMAT`              | no       | pretty    |
//!
//! Exit status is 0 on success and 1 on any fatal error.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use relay_deployer::config::{loader, DeployConfig, FileConfig};
use relay_deployer::observability::logging::{self, LogFormat};
use relay_deployer::{run, DeployError, DeploymentReport, HederaLedger};

#[derive(Parser)]
#[command(name = "relay-deployer")]
#[command(about = "Deploy a pre-signed contract-creation transaction through the JSON-RPC relay", long_about = None)]
struct Cli {
    /// TOML file with endpoint, amount and timeout overrides
    #[arg(short, long, env = "DEPLOY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(LogFormat::from_value(
        std::env::var("LOG_FORMAT").ok().as_deref(),
    ));

    tracing::info!("relay-deployer v{} starting", env!("CARGO_PKG_VERSION"));

    match deploy(&cli).await {
        Ok(report) => {
            tracing::info!(
                contract_address = %report.contract_address,
                tx_hash = %report.transaction_id,
                explorer = %report.explorer_url,
                "Deployment complete"
            );
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Deployment failed");
            ExitCode::FAILURE
        }
    }
}

async fn deploy(cli: &Cli) -> Result<DeploymentReport, DeployError> {
    let file = match &cli.config {
        Some(path) => loader::load_file(path)?,
        None => FileConfig::default(),
    };
    let config = DeployConfig::from_env(file)?;

    tracing::info!(
        network = %config.network,
        relay_url = %config.endpoints.relay_url,
        mirror_url = %config.endpoints.mirror_url,
        operator = %config.operator_id,
        operator_key_type = config.operator_key.kind().as_str(),
        max_gas_allowance = %config.max_gas_allowance,
        min_signer_balance = %config.min_signer_balance,
        "Configuration loaded"
    );

    let ledger = HederaLedger::new(&config).map_err(|source| DeployError::Ledger {
        step: "creating network clients",
        source,
    })?;
    ledger.check_chain(config.network.chain_id()).await;

    run(&config, &ledger).await
}
