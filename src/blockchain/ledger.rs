//! Ledger operations used by a deployment run.
//!
//! [`Ledger`] is the seam between the deployment steps and the network.
//! [`HederaLedger`] serves it from three surfaces: the JSON-RPC relay
//! (pre-signed submissions, live nonce), a consensus node (operator
//! transfers) and the mirror node (account existence and balances).

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::blockchain::client::{RelayClient, RelaySettings};
use crate::blockchain::consensus::{ConsensusClient, ConsensusSettings};
use crate::blockchain::mirror::MirrorClient;
use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{
    AccountState, BlockchainError, BlockchainResult, LedgerReceipt, Tinybars,
};
use crate::blockchain::wallet::OperatorKey;
use crate::config::DeployConfig;

/// Network operations a deployment needs.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Current state of the account behind `address`, `None` if it does not exist.
    async fn account(&self, address: Address) -> BlockchainResult<Option<AccountState>>;

    /// State of the operator account, `None` if unknown.
    async fn operator_account(&self) -> BlockchainResult<Option<AccountState>>;

    /// Live transaction count of `address`.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Transfer `amount` from the operator account to `to`, signed by the
    /// operator key, blocking until finalised.
    async fn transfer(&self, to: Address, amount: Tinybars) -> BlockchainResult<LedgerReceipt>;

    /// Forward a pre-signed transaction verbatim, blocking until finalised.
    ///
    /// The relay may cover at most `max_gas_allowance` of fees the signed
    /// transaction does not pay for itself.
    async fn submit_ethereum_transaction(
        &self,
        tx: &SignedTransaction,
        max_gas_allowance: Tinybars,
    ) -> BlockchainResult<LedgerReceipt>;

    /// Nonce as currently reported by the indexing layer, which may lag.
    async fn observed_nonce(&self, address: Address) -> BlockchainResult<u64>;
}

/// Ledger backed by the relay, a consensus node and the mirror node.
#[derive(Debug)]
pub struct HederaLedger {
    relay: RelayClient,
    consensus: ConsensusClient,
    mirror: MirrorClient,
    operator_id: String,
    operator_key: OperatorKey,
}

impl HederaLedger {
    /// Build clients from configuration. No network traffic happens here,
    /// but a Tokio runtime must be running.
    pub fn new(config: &DeployConfig) -> BlockchainResult<Self> {
        let relay = RelayClient::new(RelaySettings {
            rpc_url: config.endpoints.relay_url.clone(),
            rpc_timeout_secs: config.timeouts.rpc_secs,
            receipt_timeout_secs: config.timeouts.receipt_secs,
            receipt_poll_interval_ms: config.timeouts.receipt_poll_interval_ms,
        })?;
        let consensus = ConsensusClient::new(ConsensusSettings {
            node_url: config.endpoints.node_url.clone(),
            node_account_id: config.endpoints.node_account_id.clone(),
            request_timeout_secs: config.timeouts.rpc_secs,
            receipt_timeout_secs: config.timeouts.receipt_secs,
            receipt_poll_interval_ms: config.timeouts.receipt_poll_interval_ms,
            max_transaction_fee: config.max_transfer_fee,
        })?;
        let mirror = MirrorClient::new(&config.endpoints.mirror_url, config.timeouts.rpc_secs)?;

        Ok(Self {
            relay,
            consensus,
            mirror,
            operator_id: config.operator_id.clone(),
            operator_key: config.operator_key.clone(),
        })
    }

    /// Check the relay serves the expected chain. Failure is only logged.
    pub async fn check_chain(&self, expected_chain_id: u64) {
        match self.relay.verify_chain_id(expected_chain_id).await {
            Ok(()) => tracing::info!(
                rpc_url = %self.relay.rpc_url(),
                chain_id = expected_chain_id,
                "Relay connected"
            ),
            Err(e) => tracing::warn!(error = %e, "Relay chain verification failed"),
        }
    }
}

#[async_trait]
impl Ledger for HederaLedger {
    async fn account(&self, address: Address) -> BlockchainResult<Option<AccountState>> {
        Ok(self
            .mirror
            .account_by_evm_address(address)
            .await?
            .map(AccountState::from))
    }

    async fn operator_account(&self) -> BlockchainResult<Option<AccountState>> {
        Ok(self
            .mirror
            .account(&self.operator_id)
            .await?
            .map(AccountState::from))
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.relay.get_transaction_count(address).await
    }

    async fn transfer(&self, to: Address, amount: Tinybars) -> BlockchainResult<LedgerReceipt> {
        tracing::debug!(
            node = %self.consensus.node_url(),
            payer = %self.operator_id,
            key_type = self.operator_key.kind().as_str(),
            "Submitting transfer"
        );
        self.consensus
            .transfer(&self.operator_id, &self.operator_key, to, amount)
            .await
    }

    async fn submit_ethereum_transaction(
        &self,
        tx: &SignedTransaction,
        max_gas_allowance: Tinybars,
    ) -> BlockchainResult<LedgerReceipt> {
        let decoded = tx
            .decode()
            .map_err(|e| BlockchainError::Rpc(format!("Refusing to forward: {}", e)))?;
        let gas_price = self.relay.get_gas_price().await?;
        let shortfall = decoded.fee_shortfall(gas_price);

        if shortfall > max_gas_allowance {
            return Err(BlockchainError::GasAllowanceExceeded {
                shortfall,
                allowance: max_gas_allowance,
            });
        }
        if shortfall > Tinybars::ZERO {
            tracing::info!(
                shortfall = %shortfall,
                allowance = %max_gas_allowance,
                "Relay will cover part of the fee"
            );
        }

        self.relay.send_raw_transaction(tx.raw()).await
    }

    async fn observed_nonce(&self, address: Address) -> BlockchainResult<u64> {
        match self.mirror.account_by_evm_address(address).await? {
            Some(account) => Ok(account.ethereum_nonce),
            None => Err(BlockchainError::Mirror(format!(
                "Account {} not indexed yet",
                address
            ))),
        }
    }
}
