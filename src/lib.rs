//! Contract deployment through an EVM-compatibility relay.
//!
//! Submits a pre-signed contract-creation transaction, funding the signer's
//! implicitly created account first, and reports the resulting address.

pub mod blockchain;
pub mod config;
pub mod deploy;
pub mod observability;

pub use blockchain::{HederaLedger, Ledger};
pub use config::DeployConfig;
pub use deploy::{run, DeployError, DeploymentReport};
