//! Notification surface trait and stock implementations.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::identifiers::ToastId;

use super::toast::{Severity, Toast};

// ============================================================================
// Notifier
// ============================================================================

/// Addressable toast surface.
///
/// The surface owns display timing: a toast with `auto_dismiss_ms` set is
/// removed by the surface itself.
pub trait Notifier: Send + Sync {
    /// Shows `toast` and returns its handle id.
    fn add(&self, toast: Toast) -> ToastId;

    /// Replaces the content of a shown toast. Unknown ids are ignored.
    fn update(&self, id: ToastId, toast: Toast);

    /// Removes a toast. Unknown ids are ignored.
    fn remove(&self, id: ToastId);
}

// ============================================================================
// LogNotifier
// ============================================================================

/// Renders toasts as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn add(&self, toast: Toast) -> ToastId {
        let id = ToastId::generate();
        log_toast(id, "shown", &toast);
        id
    }

    fn update(&self, id: ToastId, toast: Toast) {
        log_toast(id, "updated", &toast);
    }

    fn remove(&self, id: ToastId) {
        info!(toast_id = %id, "Toast removed");
    }
}

fn log_toast(id: ToastId, action: &str, toast: &Toast) {
    match toast.severity {
        Severity::Error | Severity::Warning => warn!(
            toast_id = %id,
            action,
            title = %toast.title,
            severity = toast.severity.as_str(),
            "{}",
            toast.description
        ),
        Severity::Info | Severity::Success => info!(
            toast_id = %id,
            action,
            title = %toast.title,
            severity = toast.severity.as_str(),
            "{}",
            toast.description
        ),
    }
}

// ============================================================================
// MemoryNotifier
// ============================================================================

/// Surface operation, as recorded by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    /// [`Notifier::add`].
    Added(ToastId, Toast),
    /// [`Notifier::update`].
    Updated(ToastId, Toast),
    /// [`Notifier::remove`].
    Removed(ToastId),
}

/// Keeps the live toasts and a history of every operation.
///
/// Useful for headless front ends and tests. The history is never
/// trimmed and grows with every operation, so long-lived sessions should
/// use [`LogNotifier`] or a host surface instead.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    live: Mutex<FxHashMap<ToastId, Toast>>,
    history: Mutex<Vec<ToastEvent>>,
}

impl MemoryNotifier {
    /// Creates an empty surface.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts currently shown.
    #[must_use]
    pub fn live(&self) -> Vec<(ToastId, Toast)> {
        self.live
            .lock()
            .iter()
            .map(|(id, toast)| (*id, toast.clone()))
            .collect()
    }

    /// Current content of `id`.
    #[must_use]
    pub fn get(&self, id: ToastId) -> Option<Toast> {
        self.live.lock().get(&id).cloned()
    }

    /// Every operation so far, in order.
    #[must_use]
    pub fn history(&self) -> Vec<ToastEvent> {
        self.history.lock().clone()
    }

    /// Descriptions of every toast content shown, in order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.history
            .lock()
            .iter()
            .filter_map(|event| match event {
                ToastEvent::Added(_, toast) | ToastEvent::Updated(_, toast) => {
                    Some(toast.description.clone())
                }
                ToastEvent::Removed(_) => None,
            })
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn add(&self, toast: Toast) -> ToastId {
        let id = ToastId::generate();
        self.live.lock().insert(id, toast.clone());
        self.history.lock().push(ToastEvent::Added(id, toast));
        id
    }

    fn update(&self, id: ToastId, toast: Toast) {
        if let Some(current) = self.live.lock().get_mut(&id) {
            *current = toast.clone();
        }
        self.history.lock().push(ToastEvent::Updated(id, toast));
    }

    fn remove(&self, id: ToastId) {
        self.live.lock().remove(&id);
        self.history.lock().push(ToastEvent::Removed(id));
    }
}

// ============================================================================
// Tests
// ============================================================================
