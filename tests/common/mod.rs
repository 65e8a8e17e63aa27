//! Shared utilities for integration testing against mock relay and mirror servers.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{hex, Address, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tonic::body::BoxBody;
use tonic::codec::ProstCodec;
use tonic::codegen::{http, BoxFuture, Context, Poll, Service};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::transport::server::TcpIncoming;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use relay_deployer::blockchain::proto::{self, response_code};
use relay_deployer::blockchain::{OperatorKey, Tinybars};
use relay_deployer::config::{DeployConfig, NetworkEndpoints, NetworkPreset, TimeoutConfig};

/// Anvil's first key; signs the deployment.
pub const SIGNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Anvil's second key; the operator.
pub const OPERATOR_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// RFC 8032 test vector 1 in DER form; an Ed25519 operator.
pub const ED25519_OPERATOR_KEY: &str =
    "302e020100300506032b6570042204209d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

/// Nothing listens here.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

pub const TX_HASH: &str = "0x9fc76417374aa880d4449a1f7f31ec597f00b1f6f3dd2d66f4c9c6c445836d8b";

/// Hex-encoded signed legacy contract creation and its signer.
pub fn signed_create(nonce: u64, gas_price: u128) -> (String, Address) {
    let signer: PrivateKeySigner = SIGNER_KEY.parse().unwrap();
    let tx = TxLegacy {
        chain_id: Some(296),
        nonce,
        gas_price,
        gas_limit: 400_000,
        to: TxKind::Create,
        value: U256::ZERO,
        input: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]),
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    let raw = TxEnvelope::from(tx.into_signed(signature)).encoded_2718();
    (format!("0x{}", hex::encode(raw)), signer.address())
}

pub fn deploy_config(relay: &MockServer, mirror: &MockServer, signed_tx: String) -> DeployConfig {
    DeployConfig {
        operator_id: "0.0.2".to_string(),
        operator_key: OperatorKey::parse(OPERATOR_KEY).unwrap(),
        network: NetworkPreset::Testnet,
        endpoints: NetworkEndpoints {
            relay_url: relay.uri(),
            mirror_url: mirror.uri(),
            node_url: UNREACHABLE_URL.to_string(),
            node_account_id: "0.0.3".to_string(),
            explorer_host: "hashscan.io".to_string(),
        },
        max_gas_allowance: Tinybars::from_hbar(10),
        min_signer_balance: Tinybars::from_hbar(1),
        max_transfer_fee: Tinybars::from_hbar(2),
        signed_transaction: signed_tx,
        timeouts: TimeoutConfig {
            rpc_secs: 5,
            receipt_secs: 5,
            receipt_poll_interval_ms: 10,
        },
    }
}

/// JSON-RPC responder answering by method name, echoing request ids.
pub struct RpcRouter {
    results: HashMap<&'static str, Value>,
}

impl RpcRouter {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
        }
    }

    pub fn on(mut self, rpc_method: &'static str, result: Value) -> Self {
        self.results.insert(rpc_method, result);
        self
    }
}

impl Respond for RpcRouter {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let id = body["id"].clone();
        let rpc_method = body["method"].as_str().unwrap_or_default();

        let payload = match self.results.get(rpc_method) {
            Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            None => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("method {} not mocked", rpc_method) }
            }),
        };
        ResponseTemplate::new(200).set_body_json(payload)
    }
}

pub async fn mount_relay(server: &MockServer, router: RpcRouter) {
    Mock::given(method("POST"))
        .respond_with(router)
        .mount(server)
        .await;
}

pub async fn mount_account(server: &MockServer, id: &str, balance: u64, ethereum_nonce: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/accounts/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account": "0.0.9001",
            "balance": { "balance": balance, "timestamp": "1700000000.000000000", "tokens": [] },
            "ethereum_nonce": ethereum_nonce,
            "evm_address": id
        })))
        .mount(server)
        .await;
}

/// Transaction receipt as the relay returns it.
pub fn receipt(from: Address, status: &str) -> Value {
    json!({
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": "0x2a9b6c5c3b3c1e3a4f1a2d9e8e8f0c1b2a3d4e5f60718293a4b5c6d7e8f90a1b",
        "blockNumber": "0x10",
        "from": from,
        "to": null,
        "cumulativeGasUsed": "0x30d40",
        "gasUsed": "0x30d40",
        "effectiveGasPrice": "0xa54f4c3c00",
        "contractAddress": from.create(0),
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "status": status,
        "type": "0x0"
    })
}

/// JSON-RPC method names the relay received, in order.
pub async fn rpc_methods(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| {
            serde_json::from_slice::<Value>(&r.body)
                .ok()
                .and_then(|b| b["method"].as_str().map(str::to_string))
        })
        .collect()
}

/// In-process consensus node answering transfers and receipt queries.
#[derive(Clone)]
pub struct MockNode {
    state: Arc<Mutex<NodeState>>,
}

struct NodeState {
    precheck: i32,
    receipt_status: i32,
    /// Receipt queries answered with UNKNOWN before the final status.
    pending_polls: usize,
    transfers: Vec<proto::Transaction>,
    receipt_queries: usize,
}

impl MockNode {
    pub fn new(receipt_status: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(NodeState {
                precheck: response_code::OK,
                receipt_status,
                pending_polls: 1,
                transfers: Vec::new(),
                receipt_queries: 0,
            })),
        }
    }

    pub fn rejecting(precheck: i32) -> Self {
        let node = Self::new(response_code::SUCCESS);
        node.state.lock().unwrap().precheck = precheck;
        node
    }

    /// Serve on an ephemeral port and return the node URL.
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let incoming = TcpIncoming::from_listener(listener, true, None).unwrap();
        let service = self.clone();

        tokio::spawn(async move {
            let _ = tonic::transport::Server::builder()
                .add_service(service)
                .serve_with_incoming(incoming)
                .await;
        });

        format!("http://{}", addr)
    }

    /// Transfers received, decoded down to their signed body.
    pub fn transfers(&self) -> Vec<(proto::TransactionBody, proto::SignaturePair)> {
        use prost::Message;

        self.state
            .lock()
            .unwrap()
            .transfers
            .iter()
            .map(|transaction| {
                let signed = proto::decode_signed(transaction).unwrap();
                let body = proto::TransactionBody::decode(signed.body_bytes.as_slice()).unwrap();
                let pair = signed.sig_map.unwrap().sig_pair.remove(0);
                (body, pair)
            })
            .collect()
    }

    /// Raw body bytes of each transfer, as signed.
    pub fn signed_bodies(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .transfers
            .iter()
            .map(|transaction| proto::decode_signed(transaction).unwrap().body_bytes)
            .collect()
    }

    pub fn receipt_queries(&self) -> usize {
        self.state.lock().unwrap().receipt_queries
    }
}

impl NamedService for MockNode {
    const NAME: &'static str = "proto.CryptoService";
}

struct TransferCall(MockNode);

impl UnaryService<proto::Transaction> for TransferCall {
    type Response = proto::TransactionResponse;
    type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<proto::Transaction>) -> Self::Future {
        let mut state = self.0.state.lock().unwrap();
        state.transfers.push(request.into_inner());
        let response = proto::TransactionResponse {
            node_transaction_precheck_code: state.precheck,
            cost: 0,
        };
        Box::pin(async move { Ok(tonic::Response::new(response)) })
    }
}

struct ReceiptCall(MockNode);

impl UnaryService<proto::Query> for ReceiptCall {
    type Response = proto::Response;
    type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

    fn call(&mut self, _request: tonic::Request<proto::Query>) -> Self::Future {
        let mut state = self.0.state.lock().unwrap();
        state.receipt_queries += 1;
        let status = if state.pending_polls > 0 {
            state.pending_polls -= 1;
            response_code::UNKNOWN
        } else {
            state.receipt_status
        };
        let response = proto::Response {
            transaction_get_receipt: Some(proto::TransactionGetReceiptResponse {
                header: Some(proto::ResponseHeader {
                    node_transaction_precheck_code: response_code::OK,
                }),
                receipt: Some(proto::TransactionReceipt { status }),
            }),
        };
        Box::pin(async move { Ok(tonic::Response::new(response)) })
    }
}

impl Service<http::Request<BoxBody>> for MockNode {
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<BoxBody>) -> Self::Future {
        let node = self.clone();
        match request.uri().path() {
            proto::CRYPTO_TRANSFER_PATH => Box::pin(async move {
                let codec: ProstCodec<proto::TransactionResponse, proto::Transaction> =
                    ProstCodec::default();
                let mut grpc = Grpc::new(codec);
                Ok(grpc.unary(TransferCall(node), request).await)
            }),
            proto::GET_RECEIPT_PATH => Box::pin(async move {
                let codec: ProstCodec<proto::Response, proto::Query> = ProstCodec::default();
                let mut grpc = Grpc::new(codec);
                Ok(grpc.unary(ReceiptCall(node), request).await)
            }),
            _ => Box::pin(async move {
                Ok(http::Response::builder()
                    .status(200)
                    .header("grpc-status", "12")
                    .header("content-type", "application/grpc")
                    .body(tonic::body::empty_body())
                    .unwrap())
            }),
        }
    }
}
