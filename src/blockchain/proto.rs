//! Subset of the ledger's protobuf API used for native transfers.
//!
//! Field numbers follow the network's published `.proto` files. Members of
//! a `oneof` are modelled as optional fields; they encode identically on
//! the wire.

use prost::Message;

/// gRPC path of `CryptoService.cryptoTransfer`.
pub const CRYPTO_TRANSFER_PATH: &str = "/proto.CryptoService/cryptoTransfer";

/// gRPC path of `CryptoService.getTransactionReceipts`.
pub const GET_RECEIPT_PATH: &str = "/proto.CryptoService/getTransactionReceipts";

#[derive(Clone, PartialEq, Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Duration {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
}

/// Account addressed by number or by alias (an EVM address or public key).
#[derive(Clone, PartialEq, Message)]
pub struct AccountId {
    #[prost(int64, tag = "1")]
    pub shard_num: i64,
    #[prost(int64, tag = "2")]
    pub realm_num: i64,
    #[prost(int64, optional, tag = "3")]
    pub account_num: Option<i64>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub alias: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionId {
    #[prost(message, optional, tag = "1")]
    pub transaction_valid_start: Option<Timestamp>,
    #[prost(message, optional, tag = "2")]
    pub account_id: Option<AccountId>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AccountAmount {
    #[prost(message, optional, tag = "1")]
    pub account_id: Option<AccountId>,
    #[prost(sint64, tag = "2")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransferList {
    #[prost(message, repeated, tag = "1")]
    pub account_amounts: Vec<AccountAmount>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CryptoTransferTransactionBody {
    #[prost(message, optional, tag = "1")]
    pub transfers: Option<TransferList>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionBody {
    #[prost(message, optional, tag = "1")]
    pub transaction_id: Option<TransactionId>,
    #[prost(message, optional, tag = "2")]
    pub node_account_id: Option<AccountId>,
    #[prost(uint64, tag = "3")]
    pub transaction_fee: u64,
    #[prost(message, optional, tag = "4")]
    pub transaction_valid_duration: Option<Duration>,
    #[prost(string, tag = "6")]
    pub memo: String,
    #[prost(message, optional, tag = "14")]
    pub crypto_transfer: Option<CryptoTransferTransactionBody>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignaturePair {
    #[prost(bytes = "vec", tag = "1")]
    pub pub_key_prefix: Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub ed25519: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "6")]
    pub ecdsa_secp256k1: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignatureMap {
    #[prost(message, repeated, tag = "1")]
    pub sig_pair: Vec<SignaturePair>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SignedTransaction {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub sig_map: Option<SignatureMap>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
    #[prost(bytes = "vec", tag = "5")]
    pub signed_transaction_bytes: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionResponse {
    #[prost(int32, tag = "1")]
    pub node_transaction_precheck_code: i32,
    #[prost(uint64, tag = "2")]
    pub cost: u64,
}

/// Receipt queries are free, so the header carries no payment.
#[derive(Clone, PartialEq, Message)]
pub struct QueryHeader {
    #[prost(message, optional, tag = "1")]
    pub payment: Option<Transaction>,
    #[prost(int32, tag = "2")]
    pub response_type: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionGetReceiptQuery {
    #[prost(message, optional, tag = "1")]
    pub header: Option<QueryHeader>,
    #[prost(message, optional, tag = "2")]
    pub transaction_id: Option<TransactionId>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Query {
    #[prost(message, optional, tag = "14")]
    pub transaction_get_receipt: Option<TransactionGetReceiptQuery>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ResponseHeader {
    #[prost(int32, tag = "1")]
    pub node_transaction_precheck_code: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionReceipt {
    #[prost(int32, tag = "1")]
    pub status: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TransactionGetReceiptResponse {
    #[prost(message, optional, tag = "1")]
    pub header: Option<ResponseHeader>,
    #[prost(message, optional, tag = "2")]
    pub receipt: Option<TransactionReceipt>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Response {
    #[prost(message, optional, tag = "14")]
    pub transaction_get_receipt: Option<TransactionGetReceiptResponse>,
}

/// `ResponseCodeEnum` values this crate acts on.
pub mod response_code {
    pub const OK: i32 = 0;
    pub const PAYER_ACCOUNT_NOT_FOUND: i32 = 2;
    pub const INVALID_NODE_ACCOUNT: i32 = 3;
    pub const TRANSACTION_EXPIRED: i32 = 4;
    pub const INVALID_TRANSACTION_START: i32 = 5;
    pub const INVALID_SIGNATURE: i32 = 7;
    pub const INSUFFICIENT_TX_FEE: i32 = 9;
    pub const INSUFFICIENT_PAYER_BALANCE: i32 = 10;
    pub const DUPLICATE_TRANSACTION: i32 = 11;
    pub const BUSY: i32 = 12;
    pub const RECEIPT_NOT_FOUND: i32 = 18;
    pub const UNKNOWN: i32 = 21;
    pub const SUCCESS: i32 = 22;
    pub const INSUFFICIENT_ACCOUNT_BALANCE: i32 = 28;

    /// Symbolic name of `code`, or the number when it is not one of the above.
    pub fn name(code: i32) -> String {
        let name = match code {
            OK => "OK",
            PAYER_ACCOUNT_NOT_FOUND => "PAYER_ACCOUNT_NOT_FOUND",
            INVALID_NODE_ACCOUNT => "INVALID_NODE_ACCOUNT",
            TRANSACTION_EXPIRED => "TRANSACTION_EXPIRED",
            INVALID_TRANSACTION_START => "INVALID_TRANSACTION_START",
            INVALID_SIGNATURE => "INVALID_SIGNATURE",
            INSUFFICIENT_TX_FEE => "INSUFFICIENT_TX_FEE",
            INSUFFICIENT_PAYER_BALANCE => "INSUFFICIENT_PAYER_BALANCE",
            DUPLICATE_TRANSACTION => "DUPLICATE_TRANSACTION",
            BUSY => "BUSY",
            RECEIPT_NOT_FOUND => "RECEIPT_NOT_FOUND",
            UNKNOWN => "UNKNOWN",
            SUCCESS => "SUCCESS",
            INSUFFICIENT_ACCOUNT_BALANCE => "INSUFFICIENT_ACCOUNT_BALANCE",
            other => return format!("response code {}", other),
        };
        name.to_string()
    }
}

/// Decode a [`SignedTransaction`] out of its envelope.
pub fn decode_signed(
    transaction: &Transaction,
) -> Result<SignedTransaction, prost::DecodeError> {
    SignedTransaction::decode(transaction.signed_transaction_bytes.as_slice())
}
