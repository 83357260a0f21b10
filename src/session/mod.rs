//! Dashboard session: connection manager, account selection, submission.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Shared session handle |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionOptions`] | Timeouts, prefixes, names |
//! | [`ConnectionState`] | Observable connection lifecycle |
//!
//! # Example
//!
//! ```no_run
//! use substrate_session::{ConnectionState, Session};
//!
//! # async fn example() -> substrate_session::Result<()> {
//! let session = Session::builder().build()?;
//! let mut state = session.watch_state();
//!
//! session.connect_default().await?;
//! assert_eq!(*state.borrow_and_update(), ConnectionState::Connected);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for session configuration.
pub mod builder;

/// Core session implementation.
pub mod core;

/// Session options.
pub mod options;

/// Sign-and-submit flow.
pub mod submit;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use core::{ConnectionState, Session};
pub use options::{DEFAULT_APP_NAME, DEFAULT_NODE_URL, SessionOptions};
