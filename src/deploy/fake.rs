//! In-memory ledger for unit tests.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::blockchain::{
    AccountState, BlockchainError, BlockchainResult, Ledger, LedgerReceipt, ReceiptStatus,
    SignedTransaction, Tinybars,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Account(Address),
    OperatorAccount,
    TransactionCount(Address),
    Transfer(Address, Tinybars),
    Submit(Tinybars),
    ObservedNonce(Address),
}

pub(crate) struct FakeLedger {
    pub accounts: Mutex<HashMap<Address, AccountState>>,
    pub nonces: Mutex<HashMap<Address, u64>>,
    pub operator: Option<AccountState>,
    pub account_lookup_fails: bool,
    pub transfer_status: ReceiptStatus,
    pub submit_status: ReceiptStatus,
    pub observed_nonce_fails: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            nonces: Mutex::new(HashMap::new()),
            operator: Some(AccountState {
                account_id: "0.0.2".to_string(),
                balance: Tinybars::from_hbar(1_000),
                ethereum_nonce: 0,
            }),
            account_lookup_fails: false,
            transfer_status: ReceiptStatus::Success,
            submit_status: ReceiptStatus::Success,
            observed_nonce_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(self, address: Address, balance: Tinybars, nonce: u64) -> Self {
        self.accounts.lock().unwrap().insert(
            address,
            AccountState {
                account_id: "0.0.9001".to_string(),
                balance,
                ethereum_nonce: nonce,
            },
        );
        self.nonces.lock().unwrap().insert(address, nonce);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<(Address, Tinybars)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Transfer(to, amount) => Some((to, amount)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn receipt(&self, status: &ReceiptStatus) -> LedgerReceipt {
        let n = self.calls.lock().unwrap().len() as u8;
        LedgerReceipt {
            transaction_id: TxHash::repeat_byte(n).to_string(),
            status: status.clone(),
            block_number: Some(100 + n as u64),
        }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn account(&self, address: Address) -> BlockchainResult<Option<AccountState>> {
        self.record(Call::Account(address));
        if self.account_lookup_fails {
            return Err(BlockchainError::Mirror("connection refused".to_string()));
        }
        Ok(self.accounts.lock().unwrap().get(&address).cloned())
    }

    async fn operator_account(&self) -> BlockchainResult<Option<AccountState>> {
        self.record(Call::OperatorAccount);
        Ok(self.operator.clone())
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.record(Call::TransactionCount(address));
        Ok(self.nonces.lock().unwrap().get(&address).copied().unwrap_or(0))
    }

    async fn transfer(&self, to: Address, amount: Tinybars) -> BlockchainResult<LedgerReceipt> {
        self.record(Call::Transfer(to, amount));
        if self.transfer_status.is_success() {
            let mut accounts = self.accounts.lock().unwrap();
            let entry = accounts.entry(to).or_insert_with(|| AccountState {
                account_id: "0.0.9001".to_string(),
                balance: Tinybars::ZERO,
                ethereum_nonce: 0,
            });
            entry.balance = Tinybars(entry.balance.0 + amount.0);
        }
        Ok(self.receipt(&self.transfer_status))
    }

    async fn submit_ethereum_transaction(
        &self,
        tx: &SignedTransaction,
        max_gas_allowance: Tinybars,
    ) -> BlockchainResult<LedgerReceipt> {
        self.record(Call::Submit(max_gas_allowance));
        if self.submit_status.is_success() {
            let sender = crate::blockchain::recover_sender(tx)
                .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
            *self.nonces.lock().unwrap().entry(sender).or_insert(0) += 1;
        }
        Ok(self.receipt(&self.submit_status))
    }

    async fn observed_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.record(Call::ObservedNonce(address));
        if self.observed_nonce_fails {
            return Err(BlockchainError::Mirror("account not indexed yet".to_string()));
        }
        Ok(self.nonces.lock().unwrap().get(&address).copied().unwrap_or(0))
    }
}

/// Signed legacy contract creation from Anvil's first key.
pub(crate) fn signed_create(nonce: u64) -> (SignedTransaction, Address) {
    use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
    use alloy::eips::eip2718::Encodable2718;
    use alloy::primitives::{Bytes, TxKind, U256};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    let signer: PrivateKeySigner = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        .parse()
        .unwrap();
    let tx = TxLegacy {
        chain_id: Some(296),
        nonce,
        gas_price: 710_000_000_000,
        gas_limit: 400_000,
        to: TxKind::Create,
        value: U256::ZERO,
        input: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]),
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    let raw = TxEnvelope::from(tx.into_signed(signature)).encoded_2718();
    (SignedTransaction::from_bytes(raw), signer.address())
}
