//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of a resolved [`DeployConfig`]
//! - Validate value ranges (timeouts > 0, thresholds and fees > 0)
//! - Check identifiers and URLs are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: DeployConfig → Result<(), Vec<ValidationError>>
//! - The gas allowance is deliberately unbounded here

use std::fmt;

use crate::config::schema::DeployConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check an account id has the `shard.realm.num` form.
pub fn is_account_id(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Validate a resolved configuration.
pub fn validate_config(config: &DeployConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_account_id(&config.operator_id) {
        errors.push(ValidationError::new(
            "OPERATOR_ID",
            format!("'{}' is not of the form shard.realm.num", config.operator_id),
        ));
    }

    check_url(&mut errors, "relay_url", &config.endpoints.relay_url);
    check_url(&mut errors, "mirror_url", &config.endpoints.mirror_url);
    check_url(&mut errors, "node_url", &config.endpoints.node_url);

    if !is_account_id(&config.endpoints.node_account_id) {
        errors.push(ValidationError::new(
            "node_account_id",
            format!(
                "'{}' is not of the form shard.realm.num",
                config.endpoints.node_account_id
            ),
        ));
    }

    let host = &config.endpoints.explorer_host;
    if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
        errors.push(ValidationError::new(
            "explorer_host",
            format!("'{}' is not a bare host name", host),
        ));
    }

    if config.min_signer_balance.0 == 0 {
        errors.push(ValidationError::new(
            "MIN_SIGNER_BALANCE_HBAR",
            "must be greater than zero",
        ));
    }

    if config.max_transfer_fee.0 == 0 {
        errors.push(ValidationError::new(
            "MAX_TRANSFER_FEE_HBAR",
            "must be greater than zero",
        ));
    }

    if config.timeouts.rpc_secs == 0 {
        errors.push(ValidationError::new("timeouts.rpc_secs", "must be greater than zero"));
    }
    if config.timeouts.receipt_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.receipt_secs",
            "must be greater than zero",
        ));
    }
    if config.timeouts.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "timeouts.receipt_poll_interval_ms",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
