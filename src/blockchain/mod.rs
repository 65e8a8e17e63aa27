//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (operator key, signed transaction)
//!     → wallet.rs (key parsing, ECDSA then Ed25519)
//!     → transaction.rs (decode signed blob, recover sender, create address)
//!     → client.rs (JSON-RPC relay with timeouts, receipt polling)
//!     → consensus.rs (operator transfers over gRPC, proto.rs messages)
//!     → mirror.rs (account lookups on the mirror node)
//!     → ledger.rs (the Ledger seam used by deployment steps)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC and gRPC calls have configurable timeouts

pub mod client;
pub mod consensus;
pub mod ledger;
pub mod mirror;
pub mod proto;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::RelayClient;
pub use consensus::ConsensusClient;
pub use ledger::{HederaLedger, Ledger};
pub use mirror::MirrorClient;
pub use transaction::{contract_address, recover_sender, DecodeError, SignedTransaction};
pub use types::{
    AccountState, BlockchainError, BlockchainResult, LedgerReceipt, ReceiptStatus, Tinybars,
};
pub use wallet::{KeyKind, OperatorKey};
