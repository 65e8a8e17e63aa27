//! Consensus node client for native transfers.
//!
//! # Responsibilities
//! - Build and sign `CryptoTransfer` transactions paid by the operator
//! - Submit them over gRPC with per-request timeouts
//! - Poll the node for the transaction receipt
//!
//! The recipient is addressed by its EVM address alias; crediting an alias
//! that has no account yet creates one.

use alloy::primitives::Address;
use prost::Message;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, timeout};
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

use crate::blockchain::proto::{self, response_code};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, LedgerReceipt, ReceiptStatus, Tinybars,
};
use crate::blockchain::wallet::{KeyKind, OperatorKey};

/// Lifetime of a submitted transaction on the node.
const VALID_DURATION_SECS: i64 = 120;

/// Backdating of the valid-start timestamp, absorbs clock skew.
const VALID_START_BACKDATE_SECS: u64 = 10;

const TRANSFER_MEMO: &str = "relay-deployer signer funding";

/// Consensus client settings.
#[derive(Debug, Clone)]
pub struct ConsensusSettings {
    pub node_url: String,
    pub node_account_id: String,
    pub request_timeout_secs: u64,
    pub receipt_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
    /// Ceiling on the node fee for one transfer.
    pub max_transaction_fee: Tinybars,
}

/// gRPC client bound to a single consensus node.
#[derive(Clone)]
pub struct ConsensusClient {
    channel: Channel,
    node_account: proto::AccountId,
    settings: ConsensusSettings,
    timeout_duration: Duration,
}

impl ConsensusClient {
    /// Create a client. The connection is established on first use, but a
    /// Tokio runtime must be running.
    pub fn new(settings: ConsensusSettings) -> BlockchainResult<Self> {
        let node_account = parse_account_id(&settings.node_account_id)?;
        let timeout_duration = Duration::from_secs(settings.request_timeout_secs);
        let channel = Endpoint::from_shared(settings.node_url.clone())
            .map_err(|e| {
                BlockchainError::Consensus(format!(
                    "Invalid node URL '{}': {}",
                    settings.node_url, e
                ))
            })?
            .connect_timeout(timeout_duration)
            .timeout(timeout_duration)
            .connect_lazy();

        Ok(Self {
            channel,
            node_account,
            settings,
            timeout_duration,
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> BlockchainResult<Resp>
    where
        Req: Message + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        let call = async move {
            grpc.ready().await.map_err(|e| {
                BlockchainError::Consensus(format!("{} unavailable: {}", path, e))
            })?;
            let codec: ProstCodec<Req, Resp> = ProstCodec::default();
            grpc.unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await
            .map(tonic::Response::into_inner)
            .map_err(|status| {
                BlockchainError::Consensus(format!("{} failed: {}", path, status.message()))
            })
        };

        match timeout(self.timeout_duration, call).await {
            Ok(result) => {
                if let Err(e) = &result {
                    tracing::warn!(method = path, error = %e, "gRPC error");
                }
                result
            }
            Err(_) => {
                tracing::warn!(method = path, "gRPC timeout");
                Err(BlockchainError::Timeout(self.settings.request_timeout_secs))
            }
        }
    }

    /// Move `amount` from `payer` to the account aliased by `to`, signed
    /// with `key`, and wait for the receipt.
    pub async fn transfer(
        &self,
        payer: &str,
        key: &OperatorKey,
        to: Address,
        amount: Tinybars,
    ) -> BlockchainResult<LedgerReceipt> {
        let payer = parse_account_id(payer)?;
        let transaction_id = proto::TransactionId {
            transaction_valid_start: Some(valid_start()),
            account_id: Some(payer.clone()),
        };
        let id = format_transaction_id(&transaction_id);

        let body = transfer_body(
            transaction_id.clone(),
            self.node_account.clone(),
            self.settings.max_transaction_fee,
            payer,
            to,
            amount,
        )?;
        let transaction = sign_transaction(&body, key)?;

        let response: proto::TransactionResponse =
            self.unary(proto::CRYPTO_TRANSFER_PATH, transaction).await?;
        if response.node_transaction_precheck_code != response_code::OK {
            return Err(BlockchainError::Consensus(format!(
                "transfer {} rejected at precheck: {}",
                id,
                response_code::name(response.node_transaction_precheck_code)
            )));
        }
        tracing::info!(
            transaction_id = %id,
            to = %to,
            amount = %amount,
            "Transfer accepted by node"
        );

        self.wait_for_receipt(transaction_id, id).await
    }

    /// Poll until the node reports a terminal receipt status.
    async fn wait_for_receipt(
        &self,
        transaction_id: proto::TransactionId,
        id: String,
    ) -> BlockchainResult<LedgerReceipt> {
        let poll_interval = Duration::from_millis(self.settings.receipt_poll_interval_ms.max(1));
        let wait = Duration::from_secs(self.settings.receipt_timeout_secs);
        let query = proto::Query {
            transaction_get_receipt: Some(proto::TransactionGetReceiptQuery {
                header: Some(proto::QueryHeader::default()),
                transaction_id: Some(transaction_id),
            }),
        };

        let result = timeout(wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let response: proto::Response =
                    self.unary(proto::GET_RECEIPT_PATH, query.clone()).await?;
                let Some(receipt) = response.transaction_get_receipt else {
                    return Err(BlockchainError::Consensus(format!(
                        "empty receipt response for {}",
                        id
                    )));
                };
                let precheck = receipt
                    .header
                    .map(|h| h.node_transaction_precheck_code)
                    .unwrap_or(response_code::OK);
                let status = receipt
                    .receipt
                    .map(|r| r.status)
                    .unwrap_or(response_code::UNKNOWN);

                match (precheck, status) {
                    (response_code::OK, response_code::UNKNOWN)
                    | (response_code::BUSY, _)
                    | (response_code::RECEIPT_NOT_FOUND, _)
                    | (response_code::UNKNOWN, _) => {
                        tracing::debug!(transaction_id = %id, "Transfer pending")
                    }
                    (response_code::OK, response_code::SUCCESS) => {
                        return Ok(LedgerReceipt {
                            transaction_id: id.clone(),
                            status: ReceiptStatus::Success,
                            block_number: None,
                        })
                    }
                    (response_code::OK, failed) => {
                        return Ok(LedgerReceipt {
                            transaction_id: id.clone(),
                            status: ReceiptStatus::Failed(response_code::name(failed)),
                            block_number: None,
                        })
                    }
                    (rejected, _) => {
                        return Err(BlockchainError::Consensus(format!(
                            "receipt query for {} rejected: {}",
                            id,
                            response_code::name(rejected)
                        )))
                    }
                }
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => Err(BlockchainError::ReceiptTimeout {
                transaction_id: id,
                secs: self.settings.receipt_timeout_secs,
            }),
        }
    }

    pub fn node_url(&self) -> &str {
        &self.settings.node_url
    }
}

impl std::fmt::Debug for ConsensusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusClient")
            .field("node_url", &self.settings.node_url)
            .field("node_account_id", &self.settings.node_account_id)
            .finish()
    }
}

/// Parse `shard.realm.num`.
pub fn parse_account_id(value: &str) -> BlockchainResult<proto::AccountId> {
    let invalid = || BlockchainError::Consensus(format!("invalid account id '{}'", value));
    let parts: Vec<i64> = value
        .trim()
        .split('.')
        .map(|p| p.parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [shard, realm, num] if *shard >= 0 && *realm >= 0 && *num >= 0 => Ok(proto::AccountId {
            shard_num: *shard,
            realm_num: *realm,
            account_num: Some(*num),
            alias: None,
        }),
        _ => Err(invalid()),
    }
}

/// `payer@seconds.nanos`, as explorers and mirror nodes print it.
pub fn format_transaction_id(transaction_id: &proto::TransactionId) -> String {
    let payer = transaction_id
        .account_id
        .as_ref()
        .map(|a| format!("{}.{}.{}", a.shard_num, a.realm_num, a.account_num.unwrap_or_default()))
        .unwrap_or_default();
    let start = transaction_id.transaction_valid_start.clone().unwrap_or_default();
    format!("{}@{}.{:09}", payer, start.seconds, start.nanos)
}

fn valid_start() -> proto::Timestamp {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .saturating_sub(Duration::from_secs(VALID_START_BACKDATE_SECS));
    proto::Timestamp {
        seconds: now.as_secs() as i64,
        nanos: now.subsec_nanos() as i32,
    }
}

/// Body of a two-legged transfer: `payer` debited, the alias of `to` credited.
pub fn transfer_body(
    transaction_id: proto::TransactionId,
    node_account: proto::AccountId,
    max_fee: Tinybars,
    payer: proto::AccountId,
    to: Address,
    amount: Tinybars,
) -> BlockchainResult<proto::TransactionBody> {
    let amount = i64::try_from(amount.0).map_err(|_| {
        BlockchainError::Consensus(format!("transfer amount {} out of range", amount))
    })?;
    let recipient = proto::AccountId {
        shard_num: payer.shard_num,
        realm_num: payer.realm_num,
        account_num: None,
        alias: Some(to.to_vec()),
    };

    Ok(proto::TransactionBody {
        transaction_id: Some(transaction_id),
        node_account_id: Some(node_account),
        transaction_fee: max_fee.0,
        transaction_valid_duration: Some(proto::Duration {
            seconds: VALID_DURATION_SECS,
        }),
        memo: TRANSFER_MEMO.to_string(),
        crypto_transfer: Some(proto::CryptoTransferTransactionBody {
            transfers: Some(proto::TransferList {
                account_amounts: vec![
                    proto::AccountAmount {
                        account_id: Some(payer),
                        amount: -amount,
                    },
                    proto::AccountAmount {
                        account_id: Some(recipient),
                        amount,
                    },
                ],
            }),
        }),
    })
}

/// Serialize `body` and wrap it with the operator's signature.
pub fn sign_transaction(
    body: &proto::TransactionBody,
    key: &OperatorKey,
) -> BlockchainResult<proto::Transaction> {
    let body_bytes = body.encode_to_vec();
    let signature = key.sign(&body_bytes)?;
    let pub_key_prefix = key.public_key_bytes();

    let pair = match key.kind() {
        KeyKind::Ecdsa => proto::SignaturePair {
            pub_key_prefix,
            ed25519: None,
            ecdsa_secp256k1: Some(signature),
        },
        KeyKind::Ed25519 => proto::SignaturePair {
            pub_key_prefix,
            ed25519: Some(signature),
            ecdsa_secp256k1: None,
        },
    };

    let signed = proto::SignedTransaction {
        body_bytes,
        sig_map: Some(proto::SignatureMap {
            sig_pair: vec![pair],
        }),
    };

    Ok(proto::Transaction {
        signed_transaction_bytes: signed.encode_to_vec(),
    })
}
