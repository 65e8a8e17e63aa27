//! Forwarding the pre-signed transaction.

use crate::blockchain::{Ledger, LedgerReceipt, SignedTransaction, Tinybars};
use crate::deploy::DeployError;

/// Forward `tx` unchanged and wait for its terminal receipt.
///
/// Any failure is fatal and not retried: the blob cannot be re-signed here.
pub async fn submit<L>(
    ledger: &L,
    tx: &SignedTransaction,
    max_gas_allowance: Tinybars,
) -> Result<LedgerReceipt, DeployError>
where
    L: Ledger + ?Sized,
{
    tracing::info!(
        bytes = tx.raw().len(),
        max_gas_allowance = %max_gas_allowance,
        "Submitting signed transaction"
    );

    let receipt = ledger
        .submit_ethereum_transaction(tx, max_gas_allowance)
        .await
        .map_err(|e| DeployError::Submission(e.to_string()))?;

    if !receipt.status.is_success() {
        return Err(DeployError::Submission(format!(
            "transaction {} finished with status {}",
            receipt.transaction_id, receipt.status
        )));
    }

    tracing::info!(
        tx_hash = %receipt.transaction_id,
        block = ?receipt.block_number,
        status = %receipt.status,
        "Transaction finalised"
    );

    Ok(receipt)
}
