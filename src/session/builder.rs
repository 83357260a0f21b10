//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and creating [`Session`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use substrate_session::{FileStorage, Session};
//!
//! # async fn example() -> substrate_session::Result<()> {
//! let session = Session::builder()
//!     .node_url("ws://127.0.0.1:9944")
//!     .storage(Arc::new(FileStorage::open("./prefs.json")?))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::notify::{LogNotifier, Notifier};
use crate::storage::{MemoryStorage, Storage};
use crate::wallet::WalletExtension;

use super::core::{Session, validate_endpoint};
use super::options::SessionOptions;

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`] instance.
///
/// Use [`Session::builder()`] to create a new builder. Every setting is
/// optional: by default preferences live in memory, toasts go to the log,
/// and no wallet extension is available.
#[derive(Default, Clone)]
pub struct SessionBuilder {
    /// Initial node endpoint.
    node_url: Option<String>,
    /// Preference backend.
    storage: Option<Arc<dyn Storage>>,
    /// Toast surface.
    notifier: Option<Arc<dyn Notifier>>,
    /// Wallet extension bridge.
    extension: Option<Arc<dyn WalletExtension>>,
    /// Tuning options.
    options: SessionOptions,
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("node_url", &self.node_url)
            .field("has_storage", &self.storage.is_some())
            .field("has_notifier", &self.notifier.is_some())
            .field("has_extension", &self.extension.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a new session builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial node endpoint.
    ///
    /// A node URL saved in storage takes precedence.
    #[inline]
    #[must_use]
    pub fn node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = Some(url.into());
        self
    }

    /// Sets the preference backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the toast surface.
    #[inline]
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the wallet extension bridge.
    #[inline]
    #[must_use]
    pub fn wallet_extension(mut self, extension: Arc<dyn WalletExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Sets the tuning options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the session with validation.
    ///
    /// Must be called inside a Tokio runtime; the session spawns its
    /// preference writer on it.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid or no runtime is running
    /// - [`Error::InvalidArgument`] if the node URL is not a `ws`/`wss` URL
    pub fn build(self) -> Result<Session> {
        self.validate()?;

        if Handle::try_current().is_err() {
            return Err(Error::config(
                "Session must be built inside a Tokio runtime.\n\
                 Example: #[tokio::main] async fn main() { Session::builder().build() }",
            ));
        }

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));

        Session::new(self.node_url, self.options, storage, notifier, self.extension)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    fn validate(&self) -> Result<()> {
        self.options.validate().map_err(Error::config)?;

        if let Some(url) = &self.node_url {
            validate_endpoint(url)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = SessionBuilder::new();
        assert!(builder.node_url.is_none());
        assert!(builder.storage.is_none());
        assert!(builder.extension.is_none());
        assert_eq!(builder.options, SessionOptions::new());
    }

    #[test]
    fn test_node_url_sets_endpoint() {
        let builder = SessionBuilder::new().node_url("ws://127.0.0.1:9944");
        assert_eq!(builder.node_url.as_deref(), Some("ws://127.0.0.1:9944"));
    }

    #[test]
    fn test_build_fails_outside_runtime() {
        let err = SessionBuilder::new().build().expect_err("no runtime");
        assert!(err.to_string().contains("Tokio runtime"));
    }

    #[tokio::test]
    async fn test_build_fails_with_http_url() {
        let err = SessionBuilder::new()
            .node_url("http://127.0.0.1:9944")
            .build()
            .expect_err("bad scheme");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_build_fails_with_invalid_options() {
        let err = SessionBuilder::new()
            .options(SessionOptions::new().with_connect_timeout(Duration::ZERO))
            .build()
            .expect_err("invalid options");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_build_uses_given_node_url() {
        let session = SessionBuilder::new()
            .node_url("ws://127.0.0.1:9944")
            .build()
            .expect("build");
        assert_eq!(session.node_url(), "ws://127.0.0.1:9944");
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = SessionBuilder::new().node_url("ws://a:1");
        let cloned = builder.clone();
        assert_eq!(builder.node_url, cloned.node_url);
    }
}
