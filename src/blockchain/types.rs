//! Ledger-specific types and error definitions.

use alloy::primitives::U256;
use std::fmt;
use thiserror::Error;

/// Tinybars per whole HBAR.
pub const TINYBARS_PER_HBAR: u64 = 100_000_000;

/// The relay reports balances and values with 18 decimals; tinybars carry 8.
pub const WEIBARS_PER_TINYBAR: u64 = 10_000_000_000;

/// Amount of native currency, in tinybars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tinybars(pub u64);

impl Tinybars {
    pub const ZERO: Self = Self(0);

    /// Whole HBAR amount.
    pub const fn from_hbar(hbar: u64) -> Self {
        Self(hbar * TINYBARS_PER_HBAR)
    }

    /// Parse a decimal HBAR amount such as `"10"` or `"0.5"`.
    pub fn parse_hbar(value: &str) -> Option<Self> {
        let value = value.trim();
        let (whole, frac) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 8 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac_tinybars: u64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<8}").parse().ok()?
        };
        whole
            .checked_mul(TINYBARS_PER_HBAR)?
            .checked_add(frac_tinybars)
            .map(Self)
    }

    /// Value as the relay expects it (18 decimals).
    pub fn to_weibars(self) -> U256 {
        U256::from(self.0) * U256::from(WEIBARS_PER_TINYBAR)
    }

    /// Convert an 18-decimal relay value, truncating sub-tinybar dust.
    pub fn from_weibars(value: U256) -> Self {
        let tinybars = value / U256::from(WEIBARS_PER_TINYBAR);
        Self(u64::try_from(tinybars).unwrap_or(u64::MAX))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Tinybars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TINYBARS_PER_HBAR;
        let frac = self.0 % TINYBARS_PER_HBAR;
        if frac == 0 {
            write!(f, "{whole} ℏ")
        } else {
            let frac = format!("{frac:08}");
            write!(f, "{whole}.{} ℏ", frac.trim_end_matches('0'))
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// No terminal receipt arrived within the configured wait.
    #[error("No receipt for {transaction_id} after {secs} seconds")]
    ReceiptTimeout { transaction_id: String, secs: u64 },

    /// Mirror node request failed.
    #[error("Mirror node error: {0}")]
    Mirror(String),

    /// Consensus node rejected a request or could not be reached.
    #[error("Consensus node error: {0}")]
    Consensus(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Fee terms of a signed transaction would need more than the allowance.
    #[error("Fee shortfall {shortfall} exceeds the gas allowance of {allowance}")]
    GasAllowanceExceeded {
        shortfall: Tinybars,
        allowance: Tinybars,
    },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Terminal status carried by a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Transaction reached consensus and executed successfully.
    Success,
    /// Transaction reached consensus but failed.
    Failed(String),
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed(reason) => write!(f, "FAILED ({reason})"),
        }
    }
}

/// Finalised outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Identifier of the transaction: the hash for relay submissions,
    /// `payer@seconds.nanos` for native transactions.
    pub transaction_id: String,
    /// Terminal status.
    pub status: ReceiptStatus,
    /// Block the transaction landed in, when reported.
    pub block_number: Option<u64>,
}

/// Account state as reported by the mirror node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    /// Native account identifier (`shard.realm.num`).
    pub account_id: String,
    /// Current balance.
    pub balance: Tinybars,
    /// Ethereum-style nonce as last observed by the mirror.
    pub ethereum_nonce: u64,
}
