//! Substrate Session - dashboard session with a Substrate node.
//!
//! This library holds everything a chain dashboard front end needs below
//! its UI: one JSON-RPC connection to a node, a registry of signing
//! accounts, and a sign-and-submit flow that reports progress through a
//! single status toast.
//!
//! # Architecture
//!
//! The session follows a client model:
//!
//! - **Session (Rust)**: Owns the connection, accounts, and preferences
//! - **Node**: Answers JSON-RPC calls and streams transaction status
//! - **Host**: Supplies storage, the toast surface, and an optional wallet
//!   extension through traits
//!
//! Key design principles:
//!
//! - At most one live [`Client`]; connecting again replaces it
//! - Development accounts (`//Alice` .. `//Ferdie`) always precede
//!   extension accounts
//! - Transaction status is a finite [`futures_util::Stream`] consumed in
//!   one loop
//! - Submission stages only move forward
//!
//! # Quick Start
//!
//! ```no_run
//! use substrate_session::{Call, Result, Session, Transaction};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .node_url("ws://127.0.0.1:9920")
//!         .build()?;
//!
//!     session.connect_default().await?;
//!     session.connect_wallet().await?;
//!     session.select_account("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");
//!
//!     // System.remark(b"hello")
//!     let tx = Transaction::new(Call::new(0, 0).arg(&b"hello".to_vec()));
//!     let outcome = session
//!         .sign_and_send(&tx, |in_block| println!("in block {}", in_block.block_hash))
//!         .await?;
//!
//!     println!("finalized in {}", outcome.block_hash);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], builder, options |
//! | [`chain`] | [`Client`], extrinsic encoding, status stream |
//! | [`wallet`] | Accounts, registry, signers, extension bridge |
//! | [`storage`] | Preference backends and debounced writer |
//! | [`notify`] | Toast surface |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | JSON-RPC message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Chain access: client handle, extrinsics, status stream.
pub mod chain;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// User notification surface.
pub mod notify;

/// JSON-RPC message types.
///
/// Internal module defining request/response/notification structures.
pub mod protocol;

/// Dashboard session.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// Durable preferences.
pub mod storage;

/// WebSocket transport layer.
///
/// Internal module handling the node connection and its event loop.
pub mod transport;

/// Accounts and signers.
pub mod wallet;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{ConnectionState, Session, SessionBuilder, SessionOptions};

// Chain types
pub use chain::{
    Call, ChainInfo, Client, MultiSignature, SignedExtrinsic, SignerPayload, Transaction,
    TxOutcome, TxProgress, TxStage,
};

// Wallet types
pub use wallet::{Account, AccountSource, InjectedAccount, Signer, WalletExtension};

// Storage types
pub use storage::{FileStorage, MemoryStorage, Storage};

// Notification types
pub use notify::{LogNotifier, MemoryNotifier, Notifier, Severity, Toast};

// Protocol types
pub use protocol::TxStatus;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, SubscriptionId, ToastId};
