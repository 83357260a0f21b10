//! Single mutable status toast for one in-flight operation.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::identifiers::ToastId;

use super::notifier::Notifier;
use super::toast::Toast;

// ============================================================================
// StatusToast
// ============================================================================

/// Owner of one toast on a [`Notifier`].
///
/// [`StatusToast::finish`] and [`StatusToast::dismiss`] consume the
/// handle, so nothing can touch the toast after its terminal state.
/// Dropping an unfinished handle removes the toast.
pub struct StatusToast {
    notifier: Arc<dyn Notifier>,
    id: Option<ToastId>,
}

impl fmt::Debug for StatusToast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusToast")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl StatusToast {
    /// Shows `toast` and takes ownership of it.
    #[must_use]
    pub fn show(notifier: Arc<dyn Notifier>, toast: Toast) -> Self {
        let id = notifier.add(toast);
        trace!(toast_id = %id, "Status toast shown");
        Self {
            notifier,
            id: Some(id),
        }
    }

    /// Surface id of the toast.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<ToastId> {
        self.id
    }

    /// Replaces the content.
    pub fn update(&mut self, toast: Toast) {
        if let Some(id) = self.id {
            self.notifier.update(id, toast);
        }
    }

    /// Sets the final content and releases the toast to the surface.
    pub fn finish(mut self, toast: Toast) {
        if let Some(id) = self.id.take() {
            self.notifier.update(id, toast);
        }
    }

    /// Removes the toast.
    pub fn dismiss(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(id) = self.id.take() {
            trace!(toast_id = %id, "Status toast removed");
            self.notifier.remove(id);
        }
    }
}

impl Drop for StatusToast {
    fn drop(&mut self) {
        self.remove();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::notify::notifier::{MemoryNotifier, ToastEvent};

    fn surface() -> (Arc<MemoryNotifier>, Arc<dyn Notifier>) {
        let memory = Arc::new(MemoryNotifier::new());
        let notifier: Arc<dyn Notifier> = memory.clone();
        (memory, notifier)
    }

    #[test]
    fn test_finish_keeps_toast_with_final_content() {
        let (memory, notifier) = surface();
        let mut status = StatusToast::show(notifier, Toast::new("T", "start"));
        let id = status.id().expect("id");
        status.update(Toast::new("T", "middle"));
        status.finish(Toast::new("T", "done"));

        assert_eq!(memory.get(id).map(|t| t.description), Some("done".into()));
        assert_eq!(memory.descriptions(), ["start", "middle", "done"]);
    }

    #[test]
    fn test_dismiss_removes_toast() {
        let (memory, notifier) = surface();
        let status = StatusToast::show(notifier, Toast::new("T", "start"));
        let id = status.id().expect("id");
        status.dismiss();

        assert!(memory.get(id).is_none());
        let removals = memory
            .history()
            .into_iter()
            .filter(|e| matches!(e, ToastEvent::Removed(_)))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn test_drop_removes_unfinished_toast() {
        let (memory, notifier) = surface();
        {
            let _status = StatusToast::show(notifier, Toast::new("T", "start"));
        }
        assert!(memory.live().is_empty());
    }
}
