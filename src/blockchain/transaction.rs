//! Pre-signed transaction decoding and contract address derivation.
//!
//! # Responsibilities
//! - Hold the raw signed blob verbatim (it is re-transmitted unchanged)
//! - Recover the sender from the signature
//! - Derive the address a contract-creation transaction will deploy to
//!
//! The primary decode path is EIP-2718 (legacy RLP list or typed envelope).
//! Some signing tools emit the "network" form, where a typed transaction is
//! wrapped in an RLP string header; that form is accepted as a legacy shim.

use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{hex, Address, Bytes, U256};
use thiserror::Error;

use crate::blockchain::types::Tinybars;

/// Errors recovering information from a signed transaction.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input is not `0x`-prefixed hex.
    #[error("Signed transaction is not 0x-prefixed hex: {0}")]
    InvalidHex(String),

    /// Input decoded to zero bytes.
    #[error("Signed transaction is empty")]
    Empty,

    /// Bytes are not a transaction envelope.
    #[error("Malformed transaction: {0}")]
    Malformed(String),

    /// Signature does not recover to a sender.
    #[error("Cannot recover sender: {0}")]
    Signature(String),
}

/// Raw signed transaction, kept byte-for-byte as supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
}

impl SignedTransaction {
    /// Parse a `0x`-prefixed hex string.
    pub fn from_hex(value: &str) -> Result<Self, DecodeError> {
        let value = value.trim();
        let body = value
            .strip_prefix("0x")
            .ok_or_else(|| DecodeError::InvalidHex("missing 0x prefix".to_string()))?;
        let raw = hex::decode(body).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(Self { raw: raw.into() })
    }

    pub fn from_bytes(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// The untouched signed bytes.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Decode the envelope, trying EIP-2718 first and the network form second.
    pub fn decode(&self) -> Result<DecodedTransaction, DecodeError> {
        let envelope = match TxEnvelope::decode_2718(&mut self.raw.as_ref()) {
            Ok(envelope) => envelope,
            Err(primary) => {
                tracing::debug!(error = %primary, "EIP-2718 decode failed, trying network encoding");
                TxEnvelope::network_decode(&mut self.raw.as_ref())
                    .map_err(|_| DecodeError::Malformed(primary.to_string()))?
            }
        };

        let sender = envelope
            .recover_signer()
            .map_err(|e| DecodeError::Signature(e.to_string()))?;

        Ok(DecodedTransaction {
            sender,
            tx_type: format!("{:?}", envelope.tx_type()),
            chain_id: envelope.chain_id(),
            nonce: envelope.nonce(),
            gas_limit: envelope.gas_limit(),
            max_fee_per_gas: envelope.max_fee_per_gas(),
            is_create: envelope.is_create(),
        })
    }
}

/// Metadata recovered from a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    /// Recovered sender, canonical checksummed form via `Display`.
    pub sender: Address,
    /// Envelope type name.
    pub tx_type: String,
    /// EIP-155 chain id, absent for pre-155 legacy transactions.
    pub chain_id: Option<u64>,
    /// Nonce the transaction was signed with.
    pub nonce: u64,
    pub gas_limit: u64,
    /// Highest per-gas price the signer agreed to (gas price for legacy).
    pub max_fee_per_gas: u128,
    /// Whether the transaction creates a contract.
    pub is_create: bool,
}

impl DecodedTransaction {
    /// Fee the relay would have to cover if the network gas price is above
    /// what the signer agreed to.
    pub fn fee_shortfall(&self, network_gas_price: u128) -> Tinybars {
        let missing_per_gas = network_gas_price.saturating_sub(self.max_fee_per_gas);
        let missing = U256::from(missing_per_gas) * U256::from(self.gas_limit);
        let shortfall = Tinybars::from_weibars(missing);
        // Round partial tinybars up so a tiny shortfall is never reported as zero.
        if shortfall.to_weibars() < missing {
            Tinybars(shortfall.0.saturating_add(1))
        } else {
            shortfall
        }
    }
}

/// Recover the sender of a signed transaction.
pub fn recover_sender(tx: &SignedTransaction) -> Result<Address, DecodeError> {
    tx.decode().map(|decoded| decoded.sender)
}

/// Address of a contract created by `sender` at `nonce`:
/// the low 20 bytes of `keccak256(rlp([sender, nonce]))`.
pub fn contract_address(sender: Address, nonce: u64) -> Address {
    sender.create(nonce)
}
