//! Connection handle to a Substrate node.
//!
//! A [`Client`] is what a successful connect produces: a live
//! [`Connection`] plus the chain facts gathered during the handshake.
//!
//! # Handshake
//!
//! | Call | Yields |
//! |------|--------|
//! | `chain_getBlockHash [0]` | genesis hash |
//! | `state_getRuntimeVersion` | spec and transaction version |
//! | `system_chain` | chain name |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::RpcMethod;
use crate::transport::Connection;

use super::extrinsic::{SignedExtrinsic, hash_from_hex, to_hex};
use super::progress::TxProgress;

// ============================================================================
// ChainInfo
// ============================================================================

/// Facts about the connected chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Chain name reported by the node.
    pub chain: String,
    /// Genesis block hash.
    pub genesis_hash: [u8; 32],
    /// Runtime spec name.
    pub spec_name: String,
    /// Runtime spec version.
    pub spec_version: u32,
    /// Runtime transaction version.
    pub transaction_version: u32,
}

impl ChainInfo {
    /// Genesis hash as hex.
    #[inline]
    #[must_use]
    pub fn genesis_hex(&self) -> String {
        to_hex(self.genesis_hash)
    }
}

/// Subset of `state_getRuntimeVersion` the session needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeVersion {
    spec_name: String,
    spec_version: u32,
    transaction_version: u32,
}

// ============================================================================
// Client
// ============================================================================

struct ClientInner {
    endpoint: String,
    connection: Connection,
    info: ChainInfo,
}

/// Live connection handle. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.endpoint)
            .field("chain", &self.inner.info.chain)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connects to `endpoint` and runs the handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the socket cannot be opened or the handshake fails
    /// - [`Error::ConnectionTimeout`] if the socket does not open in time
    pub async fn connect(
        endpoint: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let connection = Connection::open(endpoint, connect_timeout, request_timeout).await?;

        let info = match Self::handshake(&connection).await {
            Ok(info) => info,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Handshake failed");
                connection.shutdown();
                return Err(match e {
                    Error::ConnectionTimeout { .. } | Error::Connection { .. } => e,
                    other => Error::connection(format!("handshake with {endpoint} failed: {other}")),
                });
            }
        };

        info!(
            endpoint = %endpoint,
            chain = %info.chain,
            spec = %info.spec_name,
            spec_version = info.spec_version,
            "Connected to node"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                endpoint: endpoint.to_string(),
                connection,
                info,
            }),
        })
    }

    async fn handshake(connection: &Connection) -> Result<ChainInfo> {
        let genesis = connection.call(RpcMethod::ChainGetBlockHash(0)).await?;
        let genesis_hash = hash_from_hex(expect_str(&genesis, "genesis hash")?)?;

        let version: RuntimeVersion =
            serde_json::from_value(connection.call(RpcMethod::StateGetRuntimeVersion).await?)?;

        let chain = connection.call(RpcMethod::SystemChain).await?;
        let chain = expect_str(&chain, "chain name")?.to_string();

        Ok(ChainInfo {
            chain,
            genesis_hash,
            spec_name: version.spec_name,
            spec_version: version.spec_version,
            transaction_version: version.transaction_version,
        })
    }

    /// Endpoint this client is connected to.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Chain facts from the handshake.
    #[inline]
    #[must_use]
    pub fn chain_info(&self) -> &ChainInfo {
        &self.inner.info
    }

    /// Performs an arbitrary call.
    ///
    /// # Errors
    ///
    /// See [`Connection::call`].
    pub async fn request(&self, method: RpcMethod) -> Result<Value> {
        self.inner.connection.call(method).await
    }

    /// Next nonce for `address`, counting transactions in the pool.
    ///
    /// # Errors
    ///
    /// See [`Connection::call`]; [`Error::Protocol`] for a non-numeric reply.
    pub async fn account_next_index(&self, address: &str) -> Result<u64> {
        let value = self
            .request(RpcMethod::SystemAccountNextIndex(address.to_string()))
            .await?;
        value
            .as_u64()
            .ok_or_else(|| Error::protocol(format!("Expected nonce, got {value}")))
    }

    /// Submits `extrinsic` and returns its status stream.
    ///
    /// # Errors
    ///
    /// [`Error::Rpc`] when the node rejects the extrinsic outright
    /// (bad signature, stale nonce), or any transport error.
    pub async fn submit_and_watch(&self, extrinsic: &SignedExtrinsic) -> Result<TxProgress> {
        let extrinsic_hash = extrinsic.hash();
        debug!(hash = %extrinsic_hash, len = extrinsic.as_bytes().len(), "Submitting extrinsic");

        let subscription = self
            .inner
            .connection
            .subscribe(RpcMethod::AuthorSubmitAndWatchExtrinsic(extrinsic.to_hex()))
            .await?;

        Ok(TxProgress::new(
            self.inner.connection.clone(),
            subscription,
            extrinsic_hash,
        ))
    }

    /// Closes the connection.
    pub fn shutdown(&self) {
        debug!(endpoint = %self.inner.endpoint, "Shutting down client");
        self.inner.connection.shutdown();
    }

    /// Returns `true` once the underlying socket is gone.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.connection.is_closed()
    }
}

fn expect_str<'a>(value: &'a Value, what: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::protocol(format!("Expected {what} string, got {value}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_runtime_version_subset() {
        let version: RuntimeVersion = serde_json::from_value(json!({
            "specName": "node-template",
            "implName": "node-template",
            "authoringVersion": 1,
            "specVersion": 100,
            "implVersion": 1,
            "apis": [],
            "transactionVersion": 1,
            "stateVersion": 1
        }))
        .expect("parse");

        assert_eq!(version.spec_name, "node-template");
        assert_eq!(version.spec_version, 100);
        assert_eq!(version.transaction_version, 1);
    }

    #[test]
    fn test_expect_str() {
        assert_eq!(expect_str(&json!("x"), "name").expect("str"), "x");
        assert!(matches!(
            expect_str(&json!(1), "name"),
            Err(Error::Protocol { .. })
        ));
    }

    #[test]
    fn test_genesis_hex() {
        let info = ChainInfo {
            chain: "Development".into(),
            genesis_hash: [0x11; 32],
            spec_name: "node".into(),
            spec_version: 1,
            transaction_version: 1,
        };
        assert_eq!(info.genesis_hex(), format!("0x{}", "11".repeat(32)));
    }

    #[test]
    fn test_client_is_clone_and_debug() {
        fn assert_traits<T: Clone + fmt::Debug + Send + Sync>() {}
        assert_traits::<Client>();
    }
}
