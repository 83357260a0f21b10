//! User notification surface.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Toast`] | Notification content |
//! | [`Notifier`] | Addressable toast surface |
//! | [`LogNotifier`] | Surface that writes to `tracing` |
//! | [`MemoryNotifier`] | Surface that records every operation |
//! | [`StatusToast`] | Owned handle to one mutable toast |

// ============================================================================
// Submodules
// ============================================================================

/// Notifier trait and implementations.
pub mod notifier;

/// Owned status toast handle.
pub mod status;

/// Toast content.
pub mod toast;

// ============================================================================
// Re-exports
// ============================================================================

pub use notifier::{LogNotifier, MemoryNotifier, Notifier, ToastEvent};
pub use status::StatusToast;
pub use toast::{Severity, Toast};
