//! Operator key loading.
//!
//! # Security
//! - Keys are read from the environment only
//! - Keys are never logged or serialized
//!
//! Key material is accepted as hex, either raw 32 bytes or the DER
//! (PKCS#8) form the ledger's portal exports. ECDSA secp256k1 is tried
//! first, Ed25519 second. Either curve signs native transactions.

use alloy::primitives::{hex, keccak256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// DER prefix of a PKCS#8 secp256k1 private key without public key.
const ECDSA_DER_PREFIX: &str = "3030020100300706052b8104000a04220420";

/// DER prefix of a PKCS#8 Ed25519 private key.
const ED25519_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// Curve of the operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Ecdsa,
    Ed25519,
}

impl KeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Ecdsa => "ECDSA(secp256k1)",
            KeyKind::Ed25519 => "Ed25519",
        }
    }
}

/// Private key of the operator account.
#[derive(Clone)]
pub enum OperatorKey {
    Ecdsa(PrivateKeySigner),
    Ed25519(SigningKey),
}

impl OperatorKey {
    /// Parse a hex-encoded key, with or without `0x`.
    pub fn parse(key: &str) -> BlockchainResult<Self> {
        let key_hex = key.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex).to_ascii_lowercase();

        match Self::parse_ecdsa(&key_hex) {
            Ok(key) => Ok(key),
            Err(ecdsa_err) => Self::parse_ed25519(&key_hex).map_err(|ed_err| {
                BlockchainError::Wallet(format!(
                    "Invalid private key format: not ECDSA ({ecdsa_err}), not Ed25519 ({ed_err})"
                ))
            }),
        }
    }

    fn parse_ecdsa(key_hex: &str) -> Result<Self, String> {
        if key_hex.starts_with(ED25519_DER_PREFIX) {
            return Err("Ed25519 DER encoding".to_string());
        }
        let raw = key_hex.strip_prefix(ECDSA_DER_PREFIX).unwrap_or(key_hex);
        let bytes = hex::decode(raw).map_err(|e| e.to_string())?;
        if bytes.len() != 32 {
            return Err(format!("expected 32 bytes, got {}", bytes.len()));
        }
        PrivateKeySigner::from_slice(&bytes)
            .map(OperatorKey::Ecdsa)
            .map_err(|e| e.to_string())
    }

    fn parse_ed25519(key_hex: &str) -> Result<Self, String> {
        let raw = key_hex.strip_prefix(ED25519_DER_PREFIX).unwrap_or(key_hex);
        let bytes = hex::decode(raw).map_err(|e| e.to_string())?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))?;
        Ok(OperatorKey::Ed25519(SigningKey::from_bytes(&bytes)))
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            OperatorKey::Ecdsa(_) => KeyKind::Ecdsa,
            OperatorKey::Ed25519(_) => KeyKind::Ed25519,
        }
    }

    /// Public key as the ledger identifies it: 33-byte compressed
    /// secp256k1 or 32-byte Ed25519.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            OperatorKey::Ecdsa(signer) => {
                signer.credential().verifying_key().to_sec1_bytes().into_vec()
            }
            OperatorKey::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
        }
    }

    /// Sign a serialized transaction body.
    ///
    /// ECDSA signs the keccak-256 digest and returns `r || s`; Ed25519 signs
    /// the bytes themselves.
    pub fn sign(&self, message: &[u8]) -> BlockchainResult<Vec<u8>> {
        match self {
            OperatorKey::Ecdsa(signer) => {
                let signature = signer
                    .sign_hash_sync(&keccak256(message))
                    .map_err(|e| BlockchainError::Wallet(format!("ECDSA signing failed: {}", e)))?;
                Ok(signature.as_bytes()[..64].to_vec())
            }
            OperatorKey::Ed25519(key) => Ok(key.sign(message).to_bytes().to_vec()),
        }
    }

    /// Public identity safe to log: the EVM address for ECDSA keys, the
    /// hex public key for Ed25519 keys.
    pub fn public_identity(&self) -> String {
        match self {
            OperatorKey::Ecdsa(signer) => signer.address().to_string(),
            OperatorKey::Ed25519(key) => hex::encode(key.verifying_key().to_bytes()),
        }
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("kind", &self.kind())
            .field("public", &self.public_identity())
            .finish()
    }
}
