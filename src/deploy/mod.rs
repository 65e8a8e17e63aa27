//! Deployment run.
//!
//! # Data Flow
//! ```text
//! DeployConfig
//!     → transaction::decode (sender)
//!     → provision.rs (signer account exists and is funded)
//!     → Ledger::transaction_count (nonce, read before submission)
//!     → submit.rs (forward signed blob, terminal receipt)
//!     → report.rs (contract address, best-effort follow-up, summary)
//! ```
//!
//! Every step is awaited before the next starts. Fatal errors surface as
//! [`DeployError`]; the follow-up read never fails the run.

pub mod pipeline;
pub mod provision;
pub mod report;
pub mod submit;

use thiserror::Error;

use crate::blockchain::{BlockchainError, DecodeError};
use crate::config::ConfigError;

pub use pipeline::run;
pub use provision::{ensure_funded, FundingOutcome};
pub use report::{follow_up_nonce, DeploymentReport, FollowUp};
pub use submit::submit;

/// Fatal errors of a deployment run.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Required settings missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sender cannot be recovered from the signed transaction.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Signer account could not be funded.
    #[error("Funding error: {0}")]
    Funding(String),

    /// Signed transaction was not executed successfully.
    #[error("Submission error: {0}")]
    Submission(String),

    /// A required ledger read failed.
    #[error("Ledger error while {step}: {source}")]
    Ledger {
        step: &'static str,
        #[source]
        source: BlockchainError,
    },
}

#[cfg(test)]
pub(crate) mod fake;
