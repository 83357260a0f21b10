//! Session coordinator.
//!
//! The [`Session`] owns the single node connection, the account registry
//! with its selection, and the durable preferences. It is cheap to clone;
//! all clones share state.
//!
//! # Example
//!
//! ```no_run
//! use substrate_session::{Call, Session, Transaction};
//!
//! # async fn example() -> substrate_session::Result<()> {
//! let session = Session::builder().build()?;
//! session.connect("ws://127.0.0.1:9920").await?;
//! session.connect_wallet().await?;
//!
//! let remark = Call::new(0, 0).arg(&b"hello".to_vec());
//! let outcome = session.submit(&Transaction::new(remark)).await?;
//! println!("finalized in {}", outcome.block_hash);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::chain::Client;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::storage::{DebouncedWriter, Storage, StorageKeys};
use crate::wallet::{Account, AccountRegistry, WalletExtension, import_accounts};

use super::builder::SessionBuilder;
use super::options::{DEFAULT_NODE_URL, SessionOptions};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle of the node connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Socket opening or handshake running.
    Connecting,
    /// Handshake complete.
    Connected,
}

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the session.
pub(crate) struct SessionInner {
    /// Configuration.
    pub options: SessionOptions,

    /// Prefixed storage keys.
    pub keys: StorageKeys,

    /// Preference backend.
    pub storage: Arc<dyn Storage>,

    /// Toast surface.
    pub notifier: Arc<dyn Notifier>,

    /// Wallet extension, if the host provides one.
    pub extension: Option<Arc<dyn WalletExtension>>,

    /// Connection state broadcaster.
    pub state: watch::Sender<ConnectionState>,

    /// Live client.
    pub client: Mutex<Option<Client>>,

    /// Serializes connect attempts.
    pub connect_lock: tokio::sync::Mutex<()>,

    /// Bumped by every disconnect, guarded by `client`. A connect that
    /// finishes under a newer generation is discarded.
    pub generation: AtomicU64,

    /// Development and extension accounts.
    pub registry: RwLock<AccountRegistry>,

    /// Selected account.
    pub selected: RwLock<Option<Account>>,

    /// Current node endpoint preference.
    pub node_url: RwLock<String>,

    /// Debounced persistence of `node_url`.
    pub url_writer: DebouncedWriter,
}

// ============================================================================
// Session
// ============================================================================

/// Dashboard session with one Substrate node.
#[derive(Clone)]
pub struct Session {
    /// Shared inner state.
    pub(crate) inner: Arc<SessionInner>,
}

// ============================================================================
// Session - Display
// ============================================================================

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("node_url", &*self.inner.node_url.read())
            .field(
                "selected",
                &self.inner.selected.read().as_ref().map(|a| a.address.clone()),
            )
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Construction
// ============================================================================

impl Session {
    /// Creates a configuration builder for the session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates a session and restores saved preferences.
    ///
    /// A saved selection is restored only when it names a registry
    /// member; a saved node URL replaces `node_url`.
    pub(crate) fn new(
        node_url: Option<String>,
        options: SessionOptions,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        extension: Option<Arc<dyn WalletExtension>>,
    ) -> Result<Self> {
        let keys = StorageKeys::new(&options.storage_prefix);
        let registry = AccountRegistry::new(options.ss58_prefix)?;

        let saved_url = read_preference(storage.as_ref(), keys.node_url());
        let node_url = saved_url
            .or(node_url)
            .unwrap_or_else(|| DEFAULT_NODE_URL.to_string());

        let selected = read_preference(storage.as_ref(), keys.selected_account())
            .and_then(|address| registry.find(&address).cloned());

        let url_writer = DebouncedWriter::spawn(
            Arc::clone(&storage),
            keys.node_url(),
            options.persist_debounce,
        );
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        info!(
            node_url = %node_url,
            accounts = registry.len(),
            restored = ?selected.as_ref().map(|a| a.address.as_str()),
            "Session initialized"
        );

        Ok(Self {
            inner: Arc::new(SessionInner {
                options,
                keys,
                storage,
                notifier,
                extension,
                state,
                client: Mutex::new(None),
                connect_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                registry: RwLock::new(registry),
                selected: RwLock::new(selected),
                node_url: RwLock::new(node_url),
                url_writer,
            }),
        })
    }

    /// Session configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }
}

// ============================================================================
// Session - Connection
// ============================================================================

impl Session {
    /// Connects to `endpoint`, replacing any live connection.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `endpoint` is not a `ws`/`wss` URL
    /// - [`Error::Connection`] if the socket or the handshake fails
    /// - [`Error::ConnectionTimeout`] if the socket does not open in time
    /// - [`Error::ConnectionClosed`] if [`Session::disconnect`] ran meanwhile
    pub async fn connect(&self, endpoint: &str) -> Result<Client> {
        validate_endpoint(endpoint)?;
        let _guard = self.inner.connect_lock.lock().await;

        let generation = {
            let mut slot = self.inner.client.lock();
            if let Some(previous) = slot.take() {
                debug!(endpoint = %previous.endpoint(), "Dropping previous connection");
                previous.shutdown();
            }
            self.inner.generation.load(Ordering::Acquire)
        };
        self.inner.state.send_replace(ConnectionState::Connecting);

        let options = &self.inner.options;
        match Client::connect(endpoint, options.connect_timeout, options.request_timeout).await {
            Ok(client) => {
                let mut slot = self.inner.client.lock();
                if self.inner.generation.load(Ordering::Acquire) != generation {
                    self.inner.state.send_replace(ConnectionState::Disconnected);
                    drop(slot);
                    client.shutdown();
                    warn!(endpoint = %endpoint, "Disconnected while connecting; dropping new connection");
                    return Err(Error::ConnectionClosed);
                }
                *slot = Some(client.clone());
                self.inner.state.send_replace(ConnectionState::Connected);
                drop(slot);

                info!(endpoint = %endpoint, "Connected to node");
                Ok(client)
            }
            Err(e) => {
                self.inner.state.send_replace(ConnectionState::Disconnected);
                error!(endpoint = %endpoint, error = %e, "Failed to connect to node");
                Err(e)
            }
        }
    }

    /// Connects to the current [`Session::node_url`].
    ///
    /// # Errors
    ///
    /// See [`Session::connect`].
    pub async fn connect_default(&self) -> Result<Client> {
        let endpoint = self.node_url();
        self.connect(&endpoint).await
    }

    /// Tears down the connection and forgets extension accounts and the
    /// selection. Calling it while disconnected is a no-op apart from the
    /// state reset. A connect still in flight is discarded when it
    /// completes and returns [`Error::ConnectionClosed`].
    pub fn disconnect(&self) {
        let previous = {
            let mut slot = self.inner.client.lock();
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
            slot.take()
        };
        if let Some(client) = previous {
            client.shutdown();
            info!(endpoint = %client.endpoint(), "Disconnected from node");
        }

        self.inner.registry.write().clear_extension_accounts();
        self.clear_selection();
        self.inner.state.send_replace(ConnectionState::Disconnected);
    }

    /// Live client, if connected and the socket is still open.
    #[must_use]
    pub fn client(&self) -> Option<Client> {
        self.inner
            .client
            .lock()
            .as_ref()
            .filter(|client| !client.is_closed())
            .cloned()
    }

    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Returns `true` if connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns `true` while a connect is in progress.
    #[inline]
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.state() == ConnectionState::Connecting
    }

    /// Subscribes to connection state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Node endpoint preference.
    #[must_use]
    pub fn node_url(&self) -> String {
        self.inner.node_url.read().clone()
    }

    /// Changes the node endpoint preference.
    ///
    /// The value is persisted once no further change arrives within the
    /// configured debounce window. It does not reconnect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `url` is not a `ws`/`wss` URL.
    pub fn set_node_url(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        validate_endpoint(&url)?;

        *self.inner.node_url.write() = url.clone();
        self.inner.url_writer.write(url);
        Ok(())
    }
}

// ============================================================================
// Session - Accounts
// ============================================================================

impl Session {
    /// Enables the wallet extension, imports its accounts, and restores the
    /// saved selection (falling back to the first account).
    ///
    /// Without an extension, or when the user declines, only the
    /// development accounts are available.
    ///
    /// # Errors
    ///
    /// Propagates errors reported by the extension.
    pub async fn connect_wallet(&self) -> Result<Vec<Account>> {
        let injected = match &self.inner.extension {
            Some(extension) => {
                let enabled = extension
                    .enable(&self.inner.options.app_name)
                    .await
                    .inspect_err(|e| error!(error = %e, "Failed to enable wallet extension"))?;

                if enabled {
                    extension
                        .accounts()
                        .await
                        .inspect_err(|e| error!(error = %e, "Failed to list extension accounts"))?
                } else {
                    info!("No extension found, development accounts available");
                    Vec::new()
                }
            }
            None => {
                debug!("No wallet extension configured");
                Vec::new()
            }
        };

        let imported = import_accounts(injected);
        self.inner.registry.write().set_extension_accounts(imported);

        let saved = read_preference(self.inner.storage.as_ref(), self.inner.keys.selected_account());
        let selected = {
            let registry = self.inner.registry.read();
            match saved.as_deref() {
                Some(address) => {
                    let found = registry.find(address).cloned();
                    if found.is_none() {
                        warn!(address = %address, "Saved account not found, using first account");
                    }
                    found.or_else(|| registry.first().cloned())
                }
                None => registry.first().cloned(),
            }
        };
        self.set_selected(selected);

        let accounts = self.accounts();
        info!(count = accounts.len(), "Wallet connected");
        Ok(accounts)
    }

    /// All accounts: development first, then extension.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.inner.registry.read().to_vec()
    }

    /// Selected account.
    #[must_use]
    pub fn selected_account(&self) -> Option<Account> {
        self.inner.selected.read().clone()
    }

    /// Selects the account with `address`.
    ///
    /// An unknown address selects the first account instead. Returns the
    /// account actually selected.
    pub fn select_account(&self, address: &str) -> Option<Account> {
        let account = {
            let registry = self.inner.registry.read();
            if !registry.contains(address) {
                warn!(address = %address, "Unknown account, selecting first account");
            }
            registry.find_or_first(address).cloned()
        };

        self.set_selected(account.clone());
        account
    }

    /// Clears the selection and forgets the saved address.
    pub fn clear_selection(&self) {
        self.set_selected(None);
    }

    fn set_selected(&self, account: Option<Account>) {
        let key = self.inner.keys.selected_account();
        let persisted = match &account {
            Some(account) => self.inner.storage.set(key, &account.address),
            None => self.inner.storage.remove(key),
        };
        if let Err(e) = persisted {
            error!(key = %key, error = %e, "Failed to persist selected account");
        }

        debug!(
            address = ?account.as_ref().map(|a| a.address.as_str()),
            "Selected account changed"
        );
        *self.inner.selected.write() = account;
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads a preference, treating backend failures as "not saved".
fn read_preference(storage: &dyn Storage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read preference");
            None
        }
    }
}

/// Accepts `ws://` and `wss://` URLs with a host.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| Error::invalid_argument(format!("Invalid node URL {endpoint}: {e}")))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(Error::invalid_argument(format!(
            "Node URL must use ws:// or wss://, got {endpoint}"
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_argument(format!(
            "Node URL has no host: {endpoint}"
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::notify::MemoryNotifier;
    use crate::storage::MemoryStorage;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

    fn session_with(storage: Arc<MemoryStorage>) -> Session {
        Session::new(
            None,
            SessionOptions::new(),
            storage,
            Arc::new(MemoryNotifier::new()),
            None,
        )
        .expect("session")
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("ws://127.0.0.1:9920").is_ok());
        assert!(validate_endpoint("wss://rpc.example.org").is_ok());
        assert!(validate_endpoint("http://127.0.0.1:9920").is_err());
        assert!(validate_endpoint("not a url").is_err());
    }

    #[test]
    fn test_session_is_clone_and_debug() {
        fn assert_clone<T: Clone>() {}
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_clone::<Session>();
        assert_debug::<Session>();
    }

    #[tokio::test]
    async fn test_new_restores_known_selection_and_url() {
        let storage = Arc::new(MemoryStorage::with_entries([
            ("nftaa-selected-account", BOB),
            ("nftaa-node-url", "ws://10.0.0.1:9944"),
        ]));
        let session = session_with(storage);

        assert_eq!(session.selected_account().map(|a| a.address), Some(BOB.into()));
        assert_eq!(session.node_url(), "ws://10.0.0.1:9944");
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_new_ignores_unknown_selection() {
        let storage = Arc::new(MemoryStorage::with_entries([(
            "nftaa-selected-account",
            "5UnknownAddress",
        )]));
        let session = session_with(storage);

        assert!(session.selected_account().is_none());
        assert_eq!(session.node_url(), DEFAULT_NODE_URL);
    }

    #[tokio::test]
    async fn test_connect_wallet_without_extension_selects_first() {
        let storage = Arc::new(MemoryStorage::new());
        let session = session_with(storage.clone());

        let accounts = session.connect_wallet().await.expect("connect wallet");
        assert_eq!(accounts.len(), 6);
        assert_eq!(session.selected_account().map(|a| a.address), Some(ALICE.into()));
        assert_eq!(
            storage.get("nftaa-selected-account").expect("get").as_deref(),
            Some(ALICE)
        );
    }

    #[tokio::test]
    async fn test_select_unknown_falls_back_to_first() {
        let storage = Arc::new(MemoryStorage::new());
        let session = session_with(storage.clone());

        assert_eq!(session.select_account(BOB).map(|a| a.address), Some(BOB.into()));
        assert_eq!(
            session.select_account("nobody").map(|a| a.address),
            Some(ALICE.into())
        );

        session.clear_selection();
        assert!(session.selected_account().is_none());
        assert_eq!(storage.get("nftaa-selected-account").expect("get"), None);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        session.select_account(BOB);

        session.disconnect();
        session.disconnect();

        assert!(session.selected_account().is_none());
        assert!(session.client().is_none());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_set_node_url_rejects_http() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        assert!(session.set_node_url("http://127.0.0.1").is_err());
        assert_eq!(session.node_url(), DEFAULT_NODE_URL);
    }

    #[tokio::test]
    async fn test_connect_refused_returns_to_disconnected() {
        let session = session_with(Arc::new(MemoryStorage::new()));
        let mut states = session.watch_state();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = session
            .connect(&format!("ws://127.0.0.1:{port}"))
            .await
            .expect_err("refused");
        assert!(err.is_connection_error());
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(states.has_changed().expect("sender alive"));
        assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
    }
}
