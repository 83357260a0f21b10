//! Session tuning options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use substrate_session::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_app_name("My Dashboard")
//!     .with_ss58_prefix(0)
//!     .with_request_timeout(Duration::from_secs(10));
//!
//! assert!(options.validate().is_ok());
//! ```

use std::time::Duration;

use crate::storage::debounce::DEFAULT_DEBOUNCE;
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};

// ============================================================================
// Constants
// ============================================================================

/// Node endpoint used when none is configured or saved.
pub const DEFAULT_NODE_URL: &str = "ws://127.0.0.1:9920";

/// Name presented to the wallet extension.
pub const DEFAULT_APP_NAME: &str = "NFTAA Test";

/// Prefix of every storage key.
pub const DEFAULT_STORAGE_PREFIX: &str = "nftaa-";

/// Generic Substrate SS58 prefix.
pub const DEFAULT_SS58_PREFIX: u16 = 42;

// ============================================================================
// SessionOptions
// ============================================================================

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Application name sent to the wallet extension.
    pub app_name: String,

    /// SS58 prefix for development account addresses.
    pub ss58_prefix: u16,

    /// Prefix prepended to every storage key.
    pub storage_prefix: String,

    /// Quiet window before a node URL change is persisted.
    pub persist_debounce: Duration,

    /// Upper bound on opening the WebSocket.
    pub connect_timeout: Duration,

    /// Upper bound on each JSON-RPC call.
    pub request_timeout: Duration,

    /// Sign with the `CheckMetadataHash` extension (disabled mode).
    pub metadata_hash_check: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            ss58_prefix: DEFAULT_SS58_PREFIX,
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            persist_debounce: DEFAULT_DEBOUNCE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            metadata_hash_check: false,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the application name.
    #[inline]
    #[must_use]
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Sets the SS58 prefix.
    #[inline]
    #[must_use]
    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    /// Sets the storage key prefix.
    #[inline]
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Sets the node URL persistence window.
    #[inline]
    #[must_use]
    pub fn with_persist_debounce(mut self, window: Duration) -> Self {
        self.persist_debounce = window;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enables the `CheckMetadataHash` signed extension.
    #[inline]
    #[must_use]
    pub fn with_metadata_hash_check(mut self) -> Self {
        self.metadata_hash_check = true;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.trim().is_empty() {
            return Err("Application name must not be empty".to_string());
        }
        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err("Timeouts must be greater than zero".to_string());
        }
        // SS58 reserves 46 and 47; prefixes above 16383 do not encode.
        if matches!(self.ss58_prefix, 46 | 47) || self.ss58_prefix > 16_383 {
            return Err(format!("Invalid SS58 prefix {}", self.ss58_prefix));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
