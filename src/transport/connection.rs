//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to a Substrate node,
//! including request/response correlation and subscription routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the node (responses, notifications)
//! - Outgoing calls from the Rust API
//! - Request/response correlation by JSON-RPC id
//! - Subscription registration and notification fan-out
//!
//! Subscription channels are created inside the event loop when the
//! subscribe response arrives, before the next frame is read, so no
//! notification can arrive for an id the loop does not know yet.
//!
//! `wss` endpoints go through rustls with the webpki root store.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Once};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, SubscriptionId};
use crate::protocol::{Notification, Request, Response, RpcMethod};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for opening the socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

/// Installs the process-wide rustls crypto provider on first use.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Err means the host already installed one
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsSink = SplitSink<WsStream, Message>;

/// Map of request IDs to waiting callers.
type CorrelationMap = FxHashMap<RequestId, Pending>;

/// Map of live subscriptions to their notification channels.
type SubscriptionMap = FxHashMap<SubscriptionId, mpsc::UnboundedSender<Value>>;

/// A caller waiting for a response.
enum Pending {
    /// Plain call, resolved with the raw response.
    Call(oneshot::Sender<Result<Response>>),
    /// Subscribe call, resolved with the notification receiver.
    Subscribe(oneshot::Sender<Result<Subscription>>),
}

impl Pending {
    fn fail(self, error: Error) {
        match self {
            Self::Call(tx) => {
                let _ = tx.send(Err(error));
            }
            Self::Subscribe(tx) => {
                let _ = tx.send(Err(error));
            }
        }
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// An open subscription: its node-assigned id and notification payloads.
///
/// The receiver yields `None` once the connection shuts down.
#[derive(Debug)]
pub struct Subscription {
    /// Node-assigned subscription id.
    pub id: SubscriptionId,
    /// Notification payloads (`params.result`) in arrival order.
    pub receiver: mpsc::UnboundedReceiver<Value>,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and register the waiting caller.
    Send { request: Request, pending: Pending },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Stop routing notifications for a subscription and send the
    /// node-side unsubscribe call without waiting for its reply.
    Unsubscribe {
        id: SubscriptionId,
        request: Request,
    },
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a Substrate node.
///
/// Handles request/response correlation and subscription routing.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; clones share the
/// same socket and event loop.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Subscription map (shared with event loop).
    subscriptions: Arc<Mutex<SubscriptionMap>>,
    /// Per-call timeout.
    request_timeout: Duration,
}

impl Connection {
    /// Opens a WebSocket to `url` and spawns the event loop.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the socket is not open within `connect_timeout`
    /// - [`Error::Connection`] if the TCP connect, TLS handshake or
    ///   WebSocket upgrade fails
    pub async fn open(url: &str, connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        debug!(url = %url, "Opening WebSocket");
        install_crypto_provider();

        let (ws_stream, _) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("{url}: {e}")))?;

        debug!(url = %url, "WebSocket connection established");

        Ok(Self::new(ws_stream, request_timeout))
    }

    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new(ws_stream: WsStream, request_timeout: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let subscriptions = Arc::new(Mutex::new(SubscriptionMap::default()));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&subscriptions),
        ));

        Self {
            command_tx,
            correlation,
            subscriptions,
            request_timeout,
        }
    }

    /// Calls `method` and returns its `result` value.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Rpc`] if the node replied with an error object
    /// - [`Error::Protocol`] if too many pending requests
    pub async fn call(&self, method: RpcMethod) -> Result<Value> {
        let request = Request::new(method);
        let response = self.send(request).await?;
        response.into_result()
    }

    /// Sends a request and waits for the raw response.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::call`], minus [`Error::Rpc`].
    pub async fn send(&self, request: Request) -> Result<Response> {
        let request_id = request.id;
        self.check_pending_limit()?;

        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                pending: Pending::Call(response_tx),
            })
            .map_err(|_| Error::ConnectionClosed)?;

        self.await_reply(request_id, response_rx).await
    }

    /// Calls a subscribing method and returns the open subscription.
    ///
    /// The subscribe call itself is bounded by the request timeout; the
    /// subscription that follows is not.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::call`], plus [`Error::Protocol`] if the node
    /// returns something other than a subscription id.
    pub async fn subscribe(&self, method: RpcMethod) -> Result<Subscription> {
        let request = Request::new(method);
        let request_id = request.id;
        self.check_pending_limit()?;

        let (subscription_tx, subscription_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                pending: Pending::Subscribe(subscription_tx),
            })
            .map_err(|_| Error::ConnectionClosed)?;

        self.await_reply(request_id, subscription_rx).await
    }

    /// Stops routing notifications for `id` and sends `method` to the node.
    ///
    /// The reply is discarded. A no-op once the connection is closed.
    pub fn unsubscribe(&self, id: SubscriptionId, method: RpcMethod) {
        let request = Request::new(method);
        let _ = self
            .command_tx
            .send(ConnectionCommand::Unsubscribe { id, request });
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns the number of live subscriptions.
    #[inline]
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Returns `true` once the event loop has terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Shuts down the connection gracefully.
    ///
    /// Pending calls fail with [`Error::ConnectionClosed`] and all
    /// subscription receivers end.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    fn check_pending_limit(&self) -> Result<()> {
        let correlation = self.correlation.lock();
        if correlation.len() >= MAX_PENDING_REQUESTS {
            warn!(
                pending = correlation.len(),
                max = MAX_PENDING_REQUESTS,
                "Too many pending requests"
            );
            return Err(Error::protocol(format!(
                "Too many pending requests: {}/{}",
                correlation.len(),
                MAX_PENDING_REQUESTS
            )));
        }
        Ok(())
    }

    async fn await_reply<T>(
        &self,
        request_id: RequestId,
        reply_rx: oneshot::Receiver<Result<T>>,
    ) -> Result<T> {
        match timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    self.request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        subscriptions: Arc<Mutex<SubscriptionMap>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from the node
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &subscriptions);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, pending }) => {
                            Self::handle_send_command(request, pending, &mut ws_write, &correlation).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Unsubscribe { id, request }) => {
                            subscriptions.lock().remove(&id);
                            trace!(subscription_id = %id, "Subscription removed");

                            Self::send_detached(request, &mut ws_write).await;
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_pending_requests(&correlation);
        Self::close_subscriptions(&subscriptions);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the node.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        subscriptions: &Arc<Mutex<SubscriptionMap>>,
    ) {
        // Responses carry an id, notifications do not
        if let Ok(response) = from_str::<Response>(text) {
            let pending = correlation.lock().remove(&response.id);

            match pending {
                Some(Pending::Call(tx)) => {
                    let _ = tx.send(Ok(response));
                }
                Some(Pending::Subscribe(tx)) => {
                    let _ = tx.send(Self::open_subscription(response, subscriptions));
                }
                // Detached requests and timed-out calls
                None => {
                    trace!(id = %response.id, "Response for unknown request");
                }
            }
            return;
        }

        if let Ok(notification) = from_str::<Notification>(text) {
            let subscription_id = notification.params.subscription;
            let mut map = subscriptions.lock();

            match map.get(&subscription_id) {
                Some(tx) => {
                    if tx.send(notification.params.result).is_err() {
                        // Receiver dropped without unsubscribing
                        map.remove(&subscription_id);
                        trace!(%subscription_id, "Dropped notification for closed receiver");
                    }
                }
                None => {
                    warn!(
                        %subscription_id,
                        method = %notification.method,
                        "Notification for unknown subscription"
                    );
                }
            }
            return;
        }

        warn!(text = %text, "Failed to parse incoming message");
    }

    /// Turns a subscribe response into a registered [`Subscription`].
    fn open_subscription(
        response: Response,
        subscriptions: &Arc<Mutex<SubscriptionMap>>,
    ) -> Result<Subscription> {
        let result = response.into_result()?;
        let id = SubscriptionId::from_value(&result)
            .ok_or_else(|| Error::protocol(format!("Expected subscription id, got {result}")))?;

        let (tx, receiver) = mpsc::unbounded_channel();
        subscriptions.lock().insert(id.clone(), tx);
        trace!(subscription_id = %id, "Subscription registered");

        Ok(Subscription { id, receiver })
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command(
        request: Request,
        pending: Pending,
        ws_write: &mut WsSink,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                pending.fail(Error::Json(e));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, pending);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            if let Some(pending) = correlation.lock().remove(&request_id) {
                pending.fail(Error::WebSocket(e));
            }
            return;
        }

        trace!(%request_id, method = request.method, "Request sent");
    }

    /// Sends a request nobody waits for. Its reply is dropped on arrival.
    async fn send_detached(request: Request, ws_write: &mut WsSink) {
        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, method = request.method, "Failed to encode request");
                return;
            }
        };

        match ws_write.send(Message::Text(json.into())).await {
            Ok(()) => trace!(request_id = %request.id, method = request.method, "Detached request sent"),
            Err(e) => debug!(error = %e, method = request.method, "Failed to send detached request"),
        }
    }

    /// Fails all pending requests with ConnectionClosed error.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, waiter) in pending {
            waiter.fail(Error::ConnectionClosed);
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }

    /// Drops every notification sender so receivers observe end-of-stream.
    fn close_subscriptions(subscriptions: &Arc<Mutex<SubscriptionMap>>) {
        let count = {
            let mut map = subscriptions.lock();
            let count = map.len();
            map.clear();
            count
        };

        if count > 0 {
            debug!(count, "Closed subscriptions on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Starts a one-connection node stub driven by `script`.
    async fn stub_node<F, Fut>(script: F) -> String
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let ws = accept_async(stream).await.expect("upgrade");
            script(ws).await;
        });

        format!("ws://127.0.0.1:{port}")
    }

    async fn next_request(ws: &mut WebSocketStream<TcpStream>) -> Value {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return from_str(&text).expect("json"),
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    async fn reply(ws: &mut WebSocketStream<TcpStream>, value: Value) {
        ws.send(Message::Text(value.to_string().into()))
            .await
            .expect("send");
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT.as_secs(), 30);
        assert_eq!(DEFAULT_CONNECT_TIMEOUT.as_secs(), 30);
        assert_eq!(MAX_PENDING_REQUESTS, 100);
    }

    #[tokio::test]
    async fn test_call_roundtrip() {
        let url = stub_node(|mut ws| async move {
            let request = next_request(&mut ws).await;
            assert_eq!(request["method"], "system_chain");
            reply(&mut ws, json!({ "jsonrpc": "2.0", "id": request["id"], "result": "Development" })).await;
        })
        .await;

        let connection = Connection::open(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
            .await
            .expect("open");
        let chain = connection.call(RpcMethod::SystemChain).await.expect("call");

        assert_eq!(chain, "Development");
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_rpc_error_is_surfaced() {
        let url = stub_node(|mut ws| async move {
            let request = next_request(&mut ws).await;
            reply(
                &mut ws,
                json!({ "jsonrpc": "2.0", "id": request["id"], "error": { "code": -32601, "message": "Method not found" } }),
            )
            .await;
        })
        .await;

        let connection = Connection::open(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
            .await
            .expect("open");
        let err = connection.call(RpcMethod::SystemChain).await.unwrap_err();

        assert!(matches!(err, Error::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_subscription_receives_notifications_sent_right_after_reply() {
        let url = stub_node(|mut ws| async move {
            let request = next_request(&mut ws).await;
            reply(&mut ws, json!({ "jsonrpc": "2.0", "id": request["id"], "result": "sub-7" })).await;
            for status in [json!("ready"), json!({ "inBlock": "0x01" })] {
                reply(
                    &mut ws,
                    json!({
                        "jsonrpc": "2.0",
                        "method": "author_extrinsicUpdate",
                        "params": { "subscription": "sub-7", "result": status }
                    }),
                )
                .await;
            }
            // Keep the socket open until the client goes away
            while ws.next().await.is_some() {}
        })
        .await;

        let connection = Connection::open(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
            .await
            .expect("open");
        let mut subscription = connection
            .subscribe(RpcMethod::AuthorSubmitAndWatchExtrinsic("0x00".into()))
            .await
            .expect("subscribe");

        assert_eq!(subscription.id.as_str(), "sub-7");
        assert_eq!(subscription.receiver.recv().await, Some(json!("ready")));
        assert_eq!(subscription.receiver.recv().await, Some(json!({ "inBlock": "0x01" })));

        connection.shutdown();
        assert_eq!(subscription.receiver.recv().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_ends_stream_and_notifies_node() {
        let (seen_tx, seen_rx) = oneshot::channel();
        let url = stub_node(|mut ws| async move {
            let request = next_request(&mut ws).await;
            reply(&mut ws, json!({ "jsonrpc": "2.0", "id": request["id"], "result": "sub-9" })).await;

            // Never answer the unwatch
            let unwatch = next_request(&mut ws).await;
            let _ = seen_tx.send(unwatch);
            while ws.next().await.is_some() {}
        })
        .await;

        let connection = Connection::open(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
            .await
            .expect("open");
        let mut subscription = connection
            .subscribe(RpcMethod::AuthorSubmitAndWatchExtrinsic("0x00".into()))
            .await
            .expect("subscribe");

        connection.unsubscribe(
            subscription.id.clone(),
            RpcMethod::AuthorUnwatchExtrinsic(subscription.id.clone()),
        );

        assert_eq!(subscription.receiver.recv().await, None);
        let unwatch = seen_rx.await.expect("unwatch request");
        assert_eq!(unwatch["method"], "author_unwatchExtrinsic");
        assert_eq!(unwatch["params"], json!(["sub-9"]));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_wss_reaches_tls_handshake() {
        use tokio::io::AsyncReadExt;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let (hello_tx, hello_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut header = [0u8; 3];
            let _ = stream.read_exact(&mut header).await;
            let _ = hello_tx.send(header);
        });

        let err = Connection::open(
            &format!("wss://127.0.0.1:{port}"),
            Duration::from_secs(5),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .await
        .err()
        .expect("no TLS server");

        // TLS record header: handshake content type, protocol major version 3
        let header = hello_rx.await.expect("client hello");
        assert_eq!(header[0], 0x16);
        assert_eq!(header[1], 0x03);
        assert!(err.is_connection_error(), "{err}");
        assert!(!err.to_string().contains("not compiled in"), "{err}");
    }

    #[tokio::test]
    async fn test_remote_close_fails_pending_calls() {
        let url = stub_node(|mut ws| async move {
            let _ = next_request(&mut ws).await;
            let _ = ws.close(None).await;
        })
        .await;

        let connection = Connection::open(&url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
            .await
            .expect("open");
        let err = connection.call(RpcMethod::SystemChain).await.unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_open_refused_is_connection_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = Connection::open(
            &format!("ws://127.0.0.1:{port}"),
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT,
        )
        .await
        .err()
        .expect("must fail");

        assert!(err.is_connection_error());
    }
}
