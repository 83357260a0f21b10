//! JSON-RPC protocol message types.
//!
//! This module defines the message format for communication between the
//! session and a Substrate node.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Session → Node | Method call |
//! | `Response` | Node → Session | Call result or error |
//! | `Notification` | Node → Session | Subscription update |
//!
//! # Method Naming
//!
//! Methods follow `module_methodName` format:
//!
//! - `chain_getBlockHash`
//! - `system_accountNextIndex`
//! - `author_submitAndWatchExtrinsic`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Notification and transaction status types |
//! | `method` | RPC method definitions |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Notification message types.
pub mod event;

/// RPC method definitions.
pub mod method;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Notification, NotificationParams, TxStatus};
pub use method::{EXTRINSIC_UPDATE, RpcMethod};
pub use request::{Request, Response, RpcError};
