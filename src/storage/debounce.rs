//! Debounced single-key writer.
//!
//! Every [`DebouncedWriter::write`] replaces the pending value and restarts
//! the quiet window. When the window elapses with no further write, the
//! last value is stored. Dropping the writer flushes a pending value.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::Storage;

// ============================================================================
// Constants
// ============================================================================

/// Default quiet window before a value is persisted.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

// ============================================================================
// DebouncedWriter
// ============================================================================

/// Coalesces bursts of writes to one storage key.
///
/// Must be created inside a Tokio runtime.
pub struct DebouncedWriter {
    key: String,
    tx: watch::Sender<Option<String>>,
    task: JoinHandle<()>,
}

impl fmt::Debug for DebouncedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedWriter")
            .field("key", &self.key)
            .field("pending", &*self.tx.borrow())
            .finish_non_exhaustive()
    }
}

impl DebouncedWriter {
    /// Spawns the writer task for `key`.
    #[must_use]
    pub fn spawn(storage: Arc<dyn Storage>, key: impl Into<String>, window: Duration) -> Self {
        let key = key.into();
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(rx, storage, key.clone(), window));

        Self { key, tx, task }
    }

    /// Schedules `value` to be written once the window is quiet.
    pub fn write(&self, value: impl Into<String>) {
        self.tx.send_replace(Some(value.into()));
    }

    /// Key this writer persists.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns `true` once the writer task has exited.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(
    mut rx: watch::Receiver<Option<String>>,
    storage: Arc<dyn Storage>,
    key: String,
    window: Duration,
) {
    while rx.changed().await.is_ok() {
        // Restart the window on every new value.
        let closed = loop {
            match tokio::time::timeout(window, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => break true,
                Err(_) => break false,
            }
        };

        let value = rx.borrow_and_update().clone();
        if let Some(value) = value {
            match storage.set(&key, &value) {
                Ok(()) => debug!(key = %key, value = %value, "Persisted debounced value"),
                Err(e) => error!(key = %key, error = %e, "Failed to persist debounced value"),
            }
        }

        if closed {
            break;
        }
    }

    debug!(key = %key, "Debounced writer stopped");
}

// ============================================================================
// Tests
// ============================================================================
