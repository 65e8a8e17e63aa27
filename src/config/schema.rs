//! Configuration schema definitions.
//!
//! [`DeployConfig`] is the resolved, immutable configuration for one run.
//! [`FileConfig`] is the optional TOML overrides file; every field in it
//! has a default so a minimal (or absent) file is valid.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::blockchain::types::Tinybars;
use crate::blockchain::wallet::OperatorKey;

/// Default gas allowance, in whole HBAR.
pub const DEFAULT_MAX_GAS_ALLOWANCE_HBAR: u64 = 10;

/// Default minimum signer balance, in whole HBAR.
pub const DEFAULT_MIN_SIGNER_BALANCE_HBAR: u64 = 1;

/// Default ceiling on the node fee for a funding transfer, in whole HBAR.
pub const DEFAULT_MAX_TRANSFER_FEE_HBAR: u64 = 2;

/// Consensus node every preset submits native transactions to.
pub const DEFAULT_NODE_ACCOUNT_ID: &str = "0.0.3";

/// Block explorer host used in reported URLs.
pub const DEFAULT_EXPLORER_HOST: &str = "hashscan.io";

/// Named network presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPreset {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
}

impl NetworkPreset {
    pub fn name(self) -> &'static str {
        match self {
            NetworkPreset::Mainnet => "mainnet",
            NetworkPreset::Testnet => "testnet",
            NetworkPreset::Previewnet => "previewnet",
        }
    }

    /// Chain id the relay reports for this network.
    pub fn chain_id(self) -> u64 {
        match self {
            NetworkPreset::Mainnet => 295,
            NetworkPreset::Testnet => 296,
            NetworkPreset::Previewnet => 297,
        }
    }

    /// Public endpoints for this network.
    pub fn default_endpoints(self) -> NetworkEndpoints {
        let (mirror_url, node_url) = match self {
            NetworkPreset::Mainnet => (
                "https://mainnet-public.mirrornode.hedera.com",
                "http://35.237.200.180:50211",
            ),
            NetworkPreset::Testnet => (
                "https://testnet.mirrornode.hedera.com",
                "http://0.testnet.hedera.com:50211",
            ),
            NetworkPreset::Previewnet => (
                "https://previewnet.mirrornode.hedera.com",
                "http://0.previewnet.hedera.com:50211",
            ),
        };

        NetworkEndpoints {
            relay_url: format!("https://{}.hashio.io/api", self.name()),
            mirror_url: mirror_url.to_string(),
            node_url: node_url.to_string(),
            node_account_id: DEFAULT_NODE_ACCOUNT_ID.to_string(),
            explorer_host: DEFAULT_EXPLORER_HOST.to_string(),
        }
    }
}

impl FromStr for NetworkPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkPreset::Mainnet),
            "testnet" => Ok(NetworkPreset::Testnet),
            "previewnet" => Ok(NetworkPreset::Previewnet),
            other => Err(format!(
                "unknown network '{}', expected mainnet, testnet or previewnet",
                other
            )),
        }
    }
}

impl fmt::Display for NetworkPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved endpoints for the selected network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkEndpoints {
    /// JSON-RPC relay URL.
    pub relay_url: String,
    /// Mirror node REST base URL.
    pub mirror_url: String,
    /// Consensus node gRPC URL, used for native transfers.
    pub node_url: String,
    /// Account id of the consensus node at `node_url`.
    pub node_account_id: String,
    /// Block explorer host (no scheme).
    pub explorer_host: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout for relay and mirror calls.
    pub rpc_secs: u64,
    /// Maximum wait for a terminal receipt.
    pub receipt_secs: u64,
    /// Delay between receipt polls.
    pub receipt_poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            rpc_secs: 30,
            receipt_secs: 180,
            receipt_poll_interval_ms: 2_000,
        }
    }
}

/// Optional endpoint overrides from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointOverrides {
    pub relay_url: Option<String>,
    pub mirror_url: Option<String>,
    pub node_url: Option<String>,
    pub node_account_id: Option<String>,
    pub explorer_host: Option<String>,
}

/// Amounts, as decimal HBAR strings (`"10"`, `"0.5"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AmountOverrides {
    pub max_gas_allowance_hbar: Option<String>,
    pub min_signer_balance_hbar: Option<String>,
    pub max_transfer_fee_hbar: Option<String>,
}

/// Contents of the optional TOML configuration file.
///
/// Credentials and the signed transaction are never read from here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub network: Option<NetworkPreset>,
    pub endpoints: EndpointOverrides,
    pub amounts: AmountOverrides,
    pub timeouts: TimeoutConfig,
}

/// Resolved configuration for one deployment run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Operator account id (`shard.realm.num`).
    pub operator_id: String,
    /// Operator signing key.
    pub operator_key: OperatorKey,
    /// Selected network.
    pub network: NetworkPreset,
    /// Endpoints for `network`, after overrides.
    pub endpoints: NetworkEndpoints,
    /// Ceiling on fees the relay may cover for the signed transaction.
    pub max_gas_allowance: Tinybars,
    /// Balance the signer account must hold before submission.
    pub min_signer_balance: Tinybars,
    /// Node fee the operator is willing to pay for a funding transfer.
    pub max_transfer_fee: Tinybars,
    /// Signed transaction, `0x`-prefixed hex as supplied.
    pub signed_transaction: String,
    pub timeouts: TimeoutConfig,
}

impl DeployConfig {
    /// Explorer link for a transaction on the configured network.
    pub fn explorer_url(&self, transaction_id: &str) -> String {
        format!(
            "https://{}/{}/transaction/{}",
            self.endpoints.explorer_host, self.network, transaction_id
        )
    }
}
