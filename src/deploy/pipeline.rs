//! The deployment run, top to bottom.

use crate::blockchain::{contract_address, Ledger, SignedTransaction};
use crate::config::DeployConfig;
use crate::deploy::provision::ensure_funded;
use crate::deploy::report::{follow_up_nonce, DeploymentReport};
use crate::deploy::submit::submit;
use crate::deploy::DeployError;

/// Run one deployment against `ledger`.
///
/// Order is fixed: decode, provision, read nonce, submit, derive address,
/// follow-up read. The nonce used for the address is the one read before
/// submission.
pub async fn run<L>(config: &DeployConfig, ledger: &L) -> Result<DeploymentReport, DeployError>
where
    L: Ledger + ?Sized,
{
    tracing::info!(network = %config.network, operator = %config.operator_id, "Using network");

    let tx = SignedTransaction::from_hex(&config.signed_transaction)?;
    let decoded = tx.decode()?;
    let sender = decoded.sender;
    tracing::info!(
        sender = %sender,
        tx_type = %decoded.tx_type,
        signed_nonce = decoded.nonce,
        "Recovered signer"
    );

    if let Some(chain_id) = decoded.chain_id {
        if chain_id != config.network.chain_id() {
            tracing::warn!(
                signed_chain_id = chain_id,
                network_chain_id = config.network.chain_id(),
                "Transaction was signed for a different chain"
            );
        }
    }
    if !decoded.is_create {
        tracing::warn!("Transaction is not a contract creation; the reported address will hold no code");
    }

    let funding = ensure_funded(ledger, sender, config.min_signer_balance).await?;

    let nonce = ledger
        .transaction_count(sender)
        .await
        .map_err(|source| DeployError::Ledger {
            step: "reading the signer nonce",
            source,
        })?;
    tracing::info!(sender = %sender, nonce, "Signer nonce before submission");
    if nonce != decoded.nonce {
        tracing::warn!(
            account_nonce = nonce,
            signed_nonce = decoded.nonce,
            "Signed nonce differs from the account nonce; the network is likely to reject it"
        );
    }

    let receipt = submit(ledger, &tx, config.max_gas_allowance).await?;

    let contract = contract_address(sender, nonce);
    tracing::info!(contract_address = %contract, "Contract address");

    let follow_up = follow_up_nonce(ledger, sender, nonce + 1).await;

    let transaction_id = receipt.transaction_id;
    let explorer_url = config.explorer_url(&transaction_id);

    Ok(DeploymentReport {
        network: config.network,
        sender,
        nonce,
        contract_address: contract,
        transaction_id,
        explorer_url,
        funding,
        follow_up,
    })
}
