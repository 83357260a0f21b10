//! WebSocket transport layer.
//!
//! This module handles communication between the session (Rust) and a
//! Substrate node via WebSocket JSON-RPC.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │                              │  Substrate node │
//! │                 │         WebSocket            │                 │
//! │  Client         │─────────────────────────────►│  JSON-RPC       │
//! │  → Connection   │      ws://host:port          │  server         │
//! │                 │◄─────────────────────────────│                 │
//! └─────────────────┘   responses, notifications   └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Connect and upgrade to WebSocket
//! 2. `Connection::call` / `Connection::subscribe` - Exchange messages
//! 3. `Connection::shutdown` - Close the socket, fail pending calls
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    Connection, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, Subscription,
};
