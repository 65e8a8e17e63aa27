//! Configuration loading from the environment and an optional TOML file.

use std::fs;
use std::path::Path;

use crate::blockchain::types::Tinybars;
use crate::blockchain::wallet::OperatorKey;
use crate::config::schema::{
    DeployConfig, FileConfig, NetworkPreset, DEFAULT_MAX_GAS_ALLOWANCE_HBAR,
    DEFAULT_MAX_TRANSFER_FEE_HBAR, DEFAULT_MIN_SIGNER_BALANCE_HBAR,
};
use crate::config::validation::{validate_config, ValidationError};

pub const OPERATOR_ID_VAR: &str = "OPERATOR_ID";
pub const OPERATOR_KEY_VAR: &str = "OPERATOR_KEY";
pub const NETWORK_VAR: &str = "HEDERA_NETWORK";
pub const MAX_GAS_ALLOWANCE_VAR: &str = "MAX_GAS_ALLOWANCE_HBAR";
pub const MIN_SIGNER_BALANCE_VAR: &str = "MIN_SIGNER_BALANCE_HBAR";
pub const MAX_TRANSFER_FEE_VAR: &str = "MAX_TRANSFER_FEE_HBAR";
pub const SIGNED_TX_VAR: &str = "SIGNED_TX";
pub const RELAY_URL_VAR: &str = "RELAY_URL";
pub const MIRROR_URL_VAR: &str = "MIRROR_URL";
pub const NODE_URL_VAR: &str = "NODE_URL";
pub const NODE_ACCOUNT_ID_VAR: &str = "NODE_ACCOUNT_ID";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "Invalid {}: {}", key, reason),
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load the optional TOML overrides file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn hbar_amount(
    key: &'static str,
    value: Option<String>,
    default_hbar: u64,
) -> Result<Tinybars, ConfigError> {
    match non_empty(value) {
        Some(v) => Tinybars::parse_hbar(&v).ok_or_else(|| ConfigError::Invalid {
            key,
            reason: format!("'{}' is not a decimal HBAR amount", v),
        }),
        None => Ok(Tinybars::from_hbar(default_hbar)),
    }
}

impl DeployConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env(file: FileConfig) -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok(), file)
    }

    /// Resolve configuration from `lookup`, falling back to `file`, then defaults.
    ///
    /// Missing credentials fail before anything else is parsed.
    pub fn from_source<F>(lookup: F, file: FileConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let operator_id =
            non_empty(lookup(OPERATOR_ID_VAR)).ok_or(ConfigError::Missing(OPERATOR_ID_VAR))?;
        let operator_key_raw =
            non_empty(lookup(OPERATOR_KEY_VAR)).ok_or(ConfigError::Missing(OPERATOR_KEY_VAR))?;
        let signed_transaction =
            non_empty(lookup(SIGNED_TX_VAR)).ok_or(ConfigError::Missing(SIGNED_TX_VAR))?;

        let operator_key = OperatorKey::parse(&operator_key_raw).map_err(|e| ConfigError::Invalid {
            key: OPERATOR_KEY_VAR,
            reason: e.to_string(),
        })?;

        let network = match non_empty(lookup(NETWORK_VAR)) {
            Some(name) => name
                .parse::<NetworkPreset>()
                .map_err(|reason| ConfigError::Invalid { key: NETWORK_VAR, reason })?,
            None => file.network.unwrap_or_default(),
        };

        let mut endpoints = network.default_endpoints();
        if let Some(url) = non_empty(lookup(RELAY_URL_VAR)).or(file.endpoints.relay_url) {
            endpoints.relay_url = url;
        }
        if let Some(url) = non_empty(lookup(MIRROR_URL_VAR)).or(file.endpoints.mirror_url) {
            endpoints.mirror_url = url;
        }
        if let Some(url) = non_empty(lookup(NODE_URL_VAR)).or(file.endpoints.node_url) {
            endpoints.node_url = url;
        }
        if let Some(id) =
            non_empty(lookup(NODE_ACCOUNT_ID_VAR)).or(file.endpoints.node_account_id)
        {
            endpoints.node_account_id = id;
        }
        if let Some(host) = file.endpoints.explorer_host {
            endpoints.explorer_host = host;
        }

        let max_gas_allowance = hbar_amount(
            MAX_GAS_ALLOWANCE_VAR,
            non_empty(lookup(MAX_GAS_ALLOWANCE_VAR)).or(file.amounts.max_gas_allowance_hbar),
            DEFAULT_MAX_GAS_ALLOWANCE_HBAR,
        )?;
        let min_signer_balance = hbar_amount(
            MIN_SIGNER_BALANCE_VAR,
            non_empty(lookup(MIN_SIGNER_BALANCE_VAR)).or(file.amounts.min_signer_balance_hbar),
            DEFAULT_MIN_SIGNER_BALANCE_HBAR,
        )?;
        let max_transfer_fee = hbar_amount(
            MAX_TRANSFER_FEE_VAR,
            non_empty(lookup(MAX_TRANSFER_FEE_VAR)).or(file.amounts.max_transfer_fee_hbar),
            DEFAULT_MAX_TRANSFER_FEE_HBAR,
        )?;

        let config = DeployConfig {
            operator_id,
            operator_key,
            network,
            endpoints,
            max_gas_allowance,
            min_signer_balance,
            max_transfer_fee,
            signed_transaction,
            timeouts: file.timeouts,
        };

        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}
