//! Durable client-side preferences.
//!
//! The session keeps two values across restarts: the selected account
//! address and the node endpoint. Both live in a string key-value
//! [`Storage`]; keys carry an optional application prefix so several
//! sessions can share one store.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Storage`] | Key-value backend trait |
//! | [`MemoryStorage`] | Process-local backend |
//! | [`FileStorage`] | JSON file backend |
//! | [`StorageKeys`] | Prefixed key names |
//! | [`DebouncedWriter`] | Coalesces bursts of writes to one key |

// ============================================================================
// Submodules
// ============================================================================

/// Debounced single-key writer.
pub mod debounce;

/// JSON file backend.
pub mod file;

/// In-memory backend.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use debounce::DebouncedWriter;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Key of the selected account address.
pub const SELECTED_ACCOUNT_KEY: &str = "selected-account";

/// Key of the node endpoint.
pub const NODE_URL_KEY: &str = "node-url";

// ============================================================================
// Storage
// ============================================================================

/// String key-value store.
///
/// Implementations must be cheap to call from async code: the session
/// calls them while holding no lock but without spawning a blocking task.
pub trait Storage: Send + Sync {
    /// Reads `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// StorageKeys
// ============================================================================

/// Fully qualified key names for one application prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    selected_account: String,
    node_url: String,
}

impl StorageKeys {
    /// Builds the key names under `prefix`.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            selected_account: format!("{prefix}{SELECTED_ACCOUNT_KEY}"),
            node_url: format!("{prefix}{NODE_URL_KEY}"),
        }
    }

    /// Key of the selected account address.
    #[inline]
    #[must_use]
    pub fn selected_account(&self) -> &str {
        &self.selected_account
    }

    /// Key of the node endpoint.
    #[inline]
    #[must_use]
    pub fn node_url(&self) -> &str {
        &self.node_url
    }
}

// ============================================================================
// Tests
// ============================================================================
