//! Mirror node REST client.
//!
//! # Responsibilities
//! - Look up accounts by native id or EVM address
//! - Distinguish "account does not exist" (404) from request failures
//!
//! Mirror data trails consensus by a few seconds; callers that need a live
//! value go through the relay instead.

use alloy::primitives::Address;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::blockchain::types::{AccountState, BlockchainError, BlockchainResult, Tinybars};

/// `GET /api/v1/accounts/{id}` response, trimmed to the fields used here.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorAccount {
    pub account: String,
    pub balance: MirrorBalance,
    #[serde(default)]
    pub ethereum_nonce: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorBalance {
    pub balance: u64,
}

impl From<MirrorAccount> for AccountState {
    fn from(account: MirrorAccount) -> Self {
        Self {
            account_id: account.account,
            balance: Tinybars(account.balance.balance),
            ethereum_nonce: account.ethereum_nonce,
        }
    }
}

/// Mirror node client.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MirrorClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> BlockchainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BlockchainError::Mirror(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up an account by `shard.realm.num` or `0x` EVM address.
    ///
    /// Returns `Ok(None)` when the mirror has no such account.
    pub async fn account(&self, id: &str) -> BlockchainResult<Option<MirrorAccount>> {
        let url = format!("{}/api/v1/accounts/{}", self.base_url, id);
        tracing::debug!(url = %url, "Mirror account lookup");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BlockchainError::Mirror(format!("GET {} failed: {}", url, e)))?;

        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let account = res.json::<MirrorAccount>().await.map_err(|e| {
                    BlockchainError::Mirror(format!("Unexpected account payload: {}", e))
                })?;
                Ok(Some(account))
            }
            status => Err(BlockchainError::Mirror(format!(
                "GET {} returned status {}",
                url, status
            ))),
        }
    }

    /// Look up the account behind an EVM address.
    pub async fn account_by_evm_address(
        &self,
        address: Address,
    ) -> BlockchainResult<Option<MirrorAccount>> {
        self.account(&format!("{:#x}", address)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_existing_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/0.0.1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": "0.0.1234",
                "balance": { "balance": 250_000_000u64, "timestamp": "1700000000.000000000", "tokens": [] },
                "ethereum_nonce": 4,
                "evm_address": "0x00000000000000000000000000000000000004d2"
            })))
            .mount(&server)
            .await;

        let client = MirrorClient::new(&server.uri(), 5).unwrap();
        let account = client.account("0.0.1234").await.unwrap().unwrap();
        let state = AccountState::from(account);
        assert_eq!(state.account_id, "0.0.1234");
        assert_eq!(state.balance, Tinybars(250_000_000));
        assert_eq!(state.ethereum_nonce, 4);
    }

    #[tokio::test]
    async fn test_missing_account_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "_status": { "messages": [{ "message": "Not found" }] }
            })))
            .mount(&server)
            .await;

        let client = MirrorClient::new(&format!("{}/", server.uri()), 5).unwrap();
        let address: Address = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap();
        assert!(client.account_by_evm_address(address).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = MirrorClient::new(&server.uri(), 5).unwrap();
        let result = client.account("0.0.1").await;
        assert!(matches!(result, Err(BlockchainError::Mirror(_))));
    }
}
