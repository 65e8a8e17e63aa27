//! Contract address derivation and the final summary.

use alloy::primitives::Address;
use std::fmt;

use crate::blockchain::Ledger;
use crate::config::NetworkPreset;
use crate::deploy::provision::FundingOutcome;

/// Result of the informational nonce read after submission.
///
/// This is not an error type: an unavailable value never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// The indexer reports this nonce.
    Observed { nonce: u64 },
    /// The read failed; the reason is logged and kept for the summary.
    Unavailable { reason: String },
}

/// Read the signer's nonce again, for information only.
///
/// `expected` is the nonce the ledger should report once the deployment is
/// indexed. Lagging or failing reads are logged, nothing more.
pub async fn follow_up_nonce<L>(ledger: &L, sender: Address, expected: u64) -> FollowUp
where
    L: Ledger + ?Sized,
{
    match ledger.observed_nonce(sender).await {
        Ok(nonce) => {
            if nonce < expected {
                tracing::info!(nonce, expected, "Indexer has not caught up with the deployment yet");
            } else {
                tracing::info!(nonce, "Signer nonce after deployment");
            }
            FollowUp::Observed { nonce }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Follow-up nonce read failed, ignoring");
            FollowUp::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Everything a successful run reports.
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    pub network: NetworkPreset,
    pub sender: Address,
    /// Nonce read before submission, used for the address.
    pub nonce: u64,
    pub contract_address: Address,
    pub transaction_id: String,
    pub explorer_url: String,
    pub funding: FundingOutcome,
    pub follow_up: FollowUp,
}

impl fmt::Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network:          {}", self.network)?;
        writeln!(f, "Signer:           {}", self.sender)?;
        match &self.funding {
            FundingOutcome::AlreadyFunded { balance, .. } => {
                writeln!(f, "Funding:          already funded ({})", balance)?
            }
            FundingOutcome::Funded { transferred, .. } => {
                writeln!(f, "Funding:          transferred {}", transferred)?
            }
        }
        writeln!(f, "Deploy nonce:     {}", self.nonce)?;
        writeln!(f, "Contract address: {}", self.contract_address)?;
        writeln!(f, "Transaction:      {}", self.transaction_id)?;
        write!(f, "Explorer:         {}", self.explorer_url)?;
        if let FollowUp::Observed { nonce } = self.follow_up {
            write!(f, "\nObserved nonce:   {}", nonce)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Tinybars;
    use crate::deploy::fake::FakeLedger;

    fn sender() -> Address {
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
    }

    #[tokio::test]
    async fn test_follow_up_failure_is_not_fatal() {
        let mut ledger = FakeLedger::new();
        ledger.observed_nonce_fails = true;
        let follow_up = follow_up_nonce(&ledger, sender(), 1).await;
        assert!(matches!(follow_up, FollowUp::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_follow_up_reports_lagging_value() {
        let ledger = FakeLedger::new().with_account(sender(), Tinybars::ZERO, 3);
        assert_eq!(
            follow_up_nonce(&ledger, sender(), 4).await,
            FollowUp::Observed { nonce: 3 }
        );
    }

    #[test]
    fn test_summary_lines() {
        let report = DeploymentReport {
            network: NetworkPreset::Testnet,
            sender: sender(),
            nonce: 0,
            contract_address: sender().create(0),
            transaction_id: alloy::primitives::TxHash::repeat_byte(0xab).to_string(),
            explorer_url: "https://hashscan.io/testnet/transaction/0xabab".to_string(),
            funding: FundingOutcome::AlreadyFunded {
                account_id: "0.0.9001".to_string(),
                balance: Tinybars::from_hbar(2),
            },
            follow_up: FollowUp::Unavailable {
                reason: "lag".to_string(),
            },
        };

        let text = report.to_string();
        assert!(text.contains("Network:          testnet"));
        assert!(text.contains("already funded (2 ℏ)"));
        assert!(text.contains(&format!("Contract address: {}", sender().create(0))));
        assert!(text.contains("https://hashscan.io/testnet/transaction/"));
        assert!(!text.contains("Observed nonce"));
    }
}
