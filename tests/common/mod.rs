//! In-process Substrate node stub for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

use substrate_session::{MemoryNotifier, MemoryStorage, Session, SessionOptions};

// ============================================================================
// Chain constants
// ============================================================================

pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

pub const GENESIS: [u8; 32] = [0x11; 32];
pub const SPEC_VERSION: u32 = 100;
pub const TRANSACTION_VERSION: u32 = 1;
pub const NONCE: u64 = 5;

pub const IN_BLOCK: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const FINALIZED: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

const SUBSCRIPTION: &str = "tx-sub-1";

// ============================================================================
// Script
// ============================================================================

/// What the node does after `author_submitAndWatchExtrinsic`.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Status payloads sent right after the subscription id.
    pub statuses: Vec<Value>,
    /// Close the socket after the last status.
    pub close_after: bool,
    /// Answer the submission with an RPC error instead.
    pub reject_submit: bool,
    /// Hold each WebSocket upgrade until notified.
    pub gate: Option<Arc<Notify>>,
}

impl Script {
    /// `ready`, `inBlock`, `finalized`.
    pub fn finalizing() -> Self {
        Self::with_statuses([
            json!("ready"),
            json!({ "inBlock": IN_BLOCK }),
            json!({ "finalized": FINALIZED }),
        ])
    }

    pub fn with_statuses(statuses: impl IntoIterator<Item = Value>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn closing(mut self) -> Self {
        self.close_after = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn rejecting() -> Self {
        Self {
            reject_submit: true,
            ..Self::default()
        }
    }
}

// ============================================================================
// MockNode
// ============================================================================

/// Accepts any number of connections and answers the methods the session
/// uses.
#[derive(Clone)]
pub struct MockNode {
    pub url: String,
    /// Method names in arrival order, across all connections.
    pub methods: Arc<Mutex<Vec<String>>>,
    /// Hex extrinsics received by `author_submitAndWatchExtrinsic`.
    pub submissions: Arc<Mutex<Vec<String>>>,
}

impl MockNode {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let node = Self {
            url: format!("ws://127.0.0.1:{port}"),
            methods: Arc::new(Mutex::new(Vec::new())),
            submissions: Arc::new(Mutex::new(Vec::new())),
        };

        let accepted = node.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let node = accepted.clone();
                let script = script.clone();
                tokio::spawn(async move {
                    if let Some(gate) = &script.gate {
                        gate.notified().await;
                    }
                    if let Ok(ws) = accept_async(stream).await {
                        node.serve(ws, script).await;
                    }
                });
            }
        });

        node
    }

    pub fn methods(&self) -> Vec<String> {
        self.methods.lock().clone()
    }

    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().clone()
    }

    async fn serve(&self, mut ws: WebSocketStream<TcpStream>, script: Script) {
        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let request: Value = serde_json::from_str(&text).expect("json request");
            let id = request["id"].clone();
            let method = request["method"].as_str().unwrap_or_default().to_string();
            self.methods.lock().push(method.clone());

            let result = match method.as_str() {
                "chain_getBlockHash" => json!(format!("0x{}", hex::encode(GENESIS))),
                "state_getRuntimeVersion" => json!({
                    "specName": "nftaa-node",
                    "implName": "nftaa-node",
                    "authoringVersion": 1,
                    "specVersion": SPEC_VERSION,
                    "implVersion": 1,
                    "apis": [],
                    "transactionVersion": TRANSACTION_VERSION,
                    "stateVersion": 1
                }),
                "system_chain" => json!("Development"),
                "system_accountNextIndex" => json!(NONCE),
                "author_unwatchExtrinsic" => json!(true),
                "author_submitAndWatchExtrinsic" => {
                    let extrinsic = request["params"][0].as_str().unwrap_or_default().to_string();
                    self.submissions.lock().push(extrinsic);

                    if script.reject_submit {
                        send(
                            &mut ws,
                            json!({
                                "jsonrpc": "2.0",
                                "id": id,
                                "error": { "code": 1010, "message": "Invalid Transaction", "data": "Transaction is outdated" }
                            }),
                        )
                        .await;
                        continue;
                    }

                    send(&mut ws, json!({ "jsonrpc": "2.0", "id": id, "result": SUBSCRIPTION })).await;
                    for status in &script.statuses {
                        send(
                            &mut ws,
                            json!({
                                "jsonrpc": "2.0",
                                "method": "author_extrinsicUpdate",
                                "params": { "subscription": SUBSCRIPTION, "result": status }
                            }),
                        )
                        .await;
                    }
                    if script.close_after {
                        let _ = ws.close(None).await;
                        return;
                    }
                    continue;
                }
                other => {
                    send(
                        &mut ws,
                        json!({
                            "jsonrpc": "2.0",
                            "id": id,
                            "error": { "code": -32601, "message": format!("Method not found: {other}") }
                        }),
                    )
                    .await;
                    continue;
                }
            };

            send(&mut ws, json!({ "jsonrpc": "2.0", "id": id, "result": result })).await;
        }
    }
}

async fn send(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    let _ = ws.send(Message::Text(value.to_string().into())).await;
}

// ============================================================================
// Session helpers
// ============================================================================

pub struct Harness {
    pub session: Session,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<MemoryNotifier>,
}

pub fn harness() -> Harness {
    harness_with(MemoryStorage::new(), None)
}

pub fn harness_with(
    storage: MemoryStorage,
    extension: Option<Arc<dyn substrate_session::WalletExtension>>,
) -> Harness {
    let storage = Arc::new(storage);
    let notifier = Arc::new(MemoryNotifier::new());

    let mut builder = Session::builder()
        .storage(storage.clone())
        .notifier(notifier.clone())
        .options(SessionOptions::new());
    if let Some(extension) = extension {
        builder = builder.wallet_extension(extension);
    }

    Harness {
        session: builder.build().expect("build session"),
        storage,
        notifier,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
