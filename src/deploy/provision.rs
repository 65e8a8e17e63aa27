//! Signer account provisioning.
//!
//! The signer of the pre-signed transaction is addressed only by its EVM
//! address. Sending value to that address materialises the account on the
//! ledger if it does not exist yet, so "create" and "top up" are the same
//! transfer.

use alloy::primitives::Address;

use crate::blockchain::{Ledger, LedgerReceipt, Tinybars};
use crate::deploy::DeployError;

/// What provisioning did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    /// Balance already met the threshold; nothing was sent.
    AlreadyFunded { account_id: String, balance: Tinybars },
    /// The operator transferred the shortfall.
    Funded {
        /// Balance before the transfer, `None` if the account did not exist.
        previous: Option<Tinybars>,
        transferred: Tinybars,
        receipt: LedgerReceipt,
    },
}

impl FundingOutcome {
    pub fn transferred(&self) -> Tinybars {
        match self {
            FundingOutcome::AlreadyFunded { .. } => Tinybars::ZERO,
            FundingOutcome::Funded { transferred, .. } => *transferred,
        }
    }
}

/// Make sure the account behind `signer` exists and holds at least `threshold`.
///
/// A failed lookup counts as "does not exist". At most one transfer is
/// issued, for exactly the shortfall, and it is never retried.
pub async fn ensure_funded<L>(
    ledger: &L,
    signer: Address,
    threshold: Tinybars,
) -> Result<FundingOutcome, DeployError>
where
    L: Ledger + ?Sized,
{
    let existing = match ledger.account(signer).await {
        Ok(account) => account,
        Err(e) => {
            tracing::warn!(signer = %signer, error = %e, "Account lookup failed, assuming it does not exist");
            None
        }
    };

    let previous = existing.as_ref().map(|account| account.balance);
    if let Some(account) = existing {
        if account.balance >= threshold {
            tracing::info!(
                signer = %signer,
                account_id = %account.account_id,
                balance = %account.balance,
                threshold = %threshold,
                "Signer account already funded"
            );
            return Ok(FundingOutcome::AlreadyFunded {
                account_id: account.account_id,
                balance: account.balance,
            });
        }
    }

    let shortfall = threshold.saturating_sub(previous.unwrap_or(Tinybars::ZERO));
    match previous {
        Some(balance) => tracing::info!(
            signer = %signer,
            balance = %balance,
            shortfall = %shortfall,
            "Topping up signer account"
        ),
        None => tracing::info!(
            signer = %signer,
            amount = %shortfall,
            "Signer account not found, creating it with a transfer"
        ),
    }

    check_operator_balance(ledger, shortfall).await?;

    let receipt = ledger
        .transfer(signer, shortfall)
        .await
        .map_err(|e| DeployError::Funding(format!("transfer of {} failed: {}", shortfall, e)))?;

    if !receipt.status.is_success() {
        return Err(DeployError::Funding(format!(
            "transfer {} finished with status {}",
            receipt.transaction_id, receipt.status
        )));
    }

    tracing::info!(
        signer = %signer,
        amount = %shortfall,
        tx_hash = %receipt.transaction_id,
        "Signer account funded"
    );

    Ok(FundingOutcome::Funded {
        previous,
        transferred: shortfall,
        receipt,
    })
}

/// Fail early when the operator visibly cannot cover `amount`.
///
/// An unknown operator balance is not an error; the transfer itself decides.
async fn check_operator_balance<L>(ledger: &L, amount: Tinybars) -> Result<(), DeployError>
where
    L: Ledger + ?Sized,
{
    match ledger.operator_account().await {
        Ok(Some(operator)) if operator.balance < amount => Err(DeployError::Funding(format!(
            "operator {} holds {}, needs {}",
            operator.account_id, operator.balance, amount
        ))),
        Ok(Some(operator)) => {
            tracing::debug!(operator = %operator.account_id, balance = %operator.balance, "Operator balance");
            Ok(())
        }
        Ok(None) => {
            tracing::warn!("Operator account not found on the mirror node");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Operator balance unavailable");
            Ok(())
        }
    }
}
