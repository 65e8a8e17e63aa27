//! JSON-RPC relay client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the relay's JSON-RPC endpoint
//! - Query chain state (chain id, nonce, gas price, receipts)
//! - Forward pre-signed transactions
//! - Poll until a terminal receipt is available

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::TransportResult;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, LedgerReceipt, ReceiptStatus,
};

/// Relay client settings.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
}

/// Relay RPC client wrapper.
#[derive(Clone)]
pub struct RelayClient {
    provider: Arc<dyn Provider + Send + Sync>,
    settings: RelaySettings,
    timeout_duration: Duration,
}

impl RelayClient {
    /// Create a new relay client. Does not touch the network.
    pub fn new(settings: RelaySettings) -> BlockchainResult<Self> {
        let rpc_url: url::Url = settings.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", settings.rpc_url, e))
        })?;
        let provider = Arc::new(ProviderBuilder::new().connect_http(rpc_url))
            as Arc<dyn Provider + Send + Sync>;

        Ok(Self {
            provider,
            timeout_duration: Duration::from_secs(settings.rpc_timeout_secs),
            settings,
        })
    }

    async fn call<T, F>(&self, what: &str, fut: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(method = what, error = %e, "RPC error");
                Err(BlockchainError::Rpc(format!("{} failed: {}", what, e)))
            }
            Err(_) => {
                tracing::warn!(method = what, "RPC timeout");
                Err(BlockchainError::Timeout(self.settings.rpc_timeout_secs))
            }
        }
    }

    /// Verify the connected chain ID matches the expected network.
    pub async fn verify_chain_id(&self, expected: u64) -> BlockchainResult<()> {
        let actual = self.get_chain_id().await?;
        if actual != expected {
            return Err(BlockchainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> BlockchainResult<u64> {
        self.call("eth_chainId", self.provider.get_chain_id()).await
    }

    /// Get the transaction count (nonce) for an address. Always a live read.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.call(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    /// Get current gas price, 18 decimals.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.call("eth_gasPrice", self.provider.get_gas_price()).await
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.call(
            "eth_getTransactionReceipt",
            self.provider.get_transaction_receipt(tx_hash),
        )
        .await
    }

    /// Forward a pre-signed transaction unchanged and wait for its receipt.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<LedgerReceipt> {
        let pending = self
            .call(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(raw),
            )
            .await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, "Transaction accepted by relay");

        self.wait_for_receipt(tx_hash).await
    }

    /// Poll until the transaction has a receipt.
    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<LedgerReceipt> {
        let poll_interval = Duration::from_millis(self.settings.receipt_poll_interval_ms.max(1));
        let wait = Duration::from_secs(self.settings.receipt_timeout_secs);

        let result = timeout(wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                match self.get_transaction_receipt(tx_hash).await? {
                    Some(receipt) => return Ok(to_ledger_receipt(&receipt)),
                    None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                }
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => Err(BlockchainError::ReceiptTimeout {
                transaction_id: tx_hash.to_string(),
                secs: self.settings.receipt_timeout_secs,
            }),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.settings.rpc_url
    }
}

fn to_ledger_receipt(receipt: &TransactionReceipt) -> LedgerReceipt {
    let status = if receipt.status() {
        ReceiptStatus::Success
    } else {
        ReceiptStatus::Failed("execution reverted".to_string())
    };

    LedgerReceipt {
        transaction_id: receipt.transaction_hash.to_string(),
        status,
        block_number: receipt.block_number,
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("rpc_url", &self.settings.rpc_url)
            .field("timeout_secs", &self.settings.rpc_timeout_secs)
            .finish()
    }
}
