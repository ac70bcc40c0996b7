//! Shared utilities for integration testing.
//!
//! Provides a mock Solana JSON-RPC node with programmable nonce state, plus
//! a raw-socket HTTP client for driving the gateway end to end.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use solana_sdk::hash::Hash;
use solana_sdk::transaction::VersionedTransaction;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use transfer_gateway::ledger::ServiceSigners;

/// Programmable state behind the mock RPC node.
pub struct MockNodeState {
    /// Blockhash returned by `getLatestBlockhash`.
    pub blockhash: Hash,
    /// Current nonce account value; `None` means the account has no data.
    pub nonce: Mutex<Option<Hash>>,
    /// Lamports returned by `getMinimumBalanceForRentExemption`.
    pub rent: u64,
    /// When set, `sendTransaction` fails preflight with `BlockhashNotFound`.
    pub stale_nonce: AtomicBool,
    /// When set, `getSignatureStatuses` reports the signature as unseen and
    /// rotates the nonce value, simulating a concurrent consumer winning the
    /// race after submission.
    pub advance_on_status_check: AtomicBool,
    /// Sizes requested through `getMinimumBalanceForRentExemption`.
    pub rent_requests: Mutex<Vec<u64>>,
    /// Every transaction accepted by `sendTransaction`, decoded.
    pub transactions: Mutex<Vec<VersionedTransaction>>,
}

impl MockNodeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blockhash: Hash::new_from_array([11u8; 32]),
            nonce: Mutex::new(Some(Hash::new_from_array([22u8; 32]))),
            rent: 1_500_000,
            stale_nonce: AtomicBool::new(false),
            advance_on_status_check: AtomicBool::new(false),
            rent_requests: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
        })
    }

    pub fn current_nonce(&self) -> Option<Hash> {
        *self.nonce.lock().unwrap()
    }

    pub fn last_transaction(&self) -> VersionedTransaction {
        self.transactions.lock().unwrap().last().cloned().unwrap()
    }
}

/// Start the mock node on an ephemeral port; returns its address.
pub async fn start_mock_node(state: Arc<MockNodeState>) -> SocketAddr {
    let app = Router::new().route("/", post(rpc_handler)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn rpc_handler(State(state): State<Arc<MockNodeState>>, Json(req): Json<Value>) -> Json<Value> {
    let method = req["method"].as_str().unwrap_or_default();
    let id = req["id"].clone();

    let result = match method {
        "getLatestBlockhash" => json!({
            "context": context(),
            "value": {
                "blockhash": state.blockhash.to_string(),
                "lastValidBlockHeight": 1000u64,
            }
        }),
        "getMinimumBalanceForRentExemption" => {
            let space = req["params"][0].as_u64().unwrap_or_default();
            state.rent_requests.lock().unwrap().push(space);
            json!(state.rent)
        }
        "getAccountInfo" => {
            let value = state.current_nonce().map(|nonce| {
                json!({
                    "data": [bs58::encode(nonce.as_ref()).into_string(), "base58"],
                    "executable": false,
                    "lamports": 1_500_000u64,
                    "owner": "11111111111111111111111111111111",
                    "rentEpoch": 0u64,
                    "space": 80u64,
                })
            });
            json!({ "context": context(), "value": value })
        }
        "sendTransaction" => {
            if state.stale_nonce.load(Ordering::SeqCst) {
                return Json(json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": -32002,
                        "message": "Transaction simulation failed: Blockhash not found",
                        "data": {
                            "accounts": null,
                            "err": "BlockhashNotFound",
                            "logs": [],
                            "unitsConsumed": 0u64,
                            "returnData": null,
                            "innerInstructions": null,
                            "replacementBlockhash": null,
                        }
                    }
                }));
            }

            let encoded = req["params"][0].as_str().unwrap_or_default();
            let tx = decode_transaction(encoded);
            let signature = tx.signatures[0];
            state.transactions.lock().unwrap().push(tx);
            json!(signature.to_string())
        }
        "getSignatureStatuses" => {
            if state.advance_on_status_check.load(Ordering::SeqCst) {
                *state.nonce.lock().unwrap() = Some(Hash::new_from_array([33u8; 32]));
                json!({ "context": context(), "value": [null] })
            } else {
                json!({
                    "context": context(),
                    "value": [{
                        "slot": 1u64,
                        "confirmations": 10u64,
                        "err": null,
                        "status": { "Ok": null },
                        "confirmationStatus": "confirmed",
                    }]
                })
            }
        }
        "isBlockhashValid" => json!({ "context": context(), "value": true }),
        "getVersion" => json!({ "solana-core": "2.0.0", "feature-set": 0u64 }),
        other => panic!("mock node received unexpected method '{other}'"),
    };

    Json(json!({ "jsonrpc": "2.0", "result": result, "id": id }))
}

fn context() -> Value {
    json!({ "apiVersion": "2.0.0", "slot": 1u64 })
}

/// The RPC accepts base58 or base64 transaction encodings; try both.
fn decode_transaction(encoded: &str) -> VersionedTransaction {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(encoded))
        .expect("transaction param is neither base58 nor base64");
    bincode::deserialize(&bytes).expect("transaction param did not decode")
}

/// Deterministic process identities for tests.
pub fn test_signers() -> ServiceSigners {
    let payer = bs58::encode([1u8; 32]).into_string();
    let receiver = bs58::encode([2u8; 32]).into_string();
    ServiceSigners::from_base58(&payer, &receiver).unwrap()
}

/// Issue a `POST` with a JSON body over a raw socket; returns status + body.
#[allow(dead_code)]
pub async fn post_json(addr: SocketAddr, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response).to_string();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default();
    (status, body)
}
