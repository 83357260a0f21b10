//! Chain access: connection handle, extrinsics, status stream.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Live node connection with handshake facts |
//! | [`Call`], [`Transaction`] | Prepared call data |
//! | [`SignedExtrinsic`] | Encoded, signed extrinsic |
//! | [`TxProgress`] | Status stream of one submission |

// ============================================================================
// Submodules
// ============================================================================

/// Node connection handle.
pub mod client;

/// Extrinsic encoding and signing payloads.
pub mod extrinsic;

/// Transaction status stream.
pub mod progress;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ChainInfo, Client};
pub use extrinsic::{
    Call, ExtrinsicParams, MultiSignature, SignedExtrinsic, SignerPayload, SigningPayload,
    Transaction,
};
pub use progress::{StageTracker, TxOutcome, TxProgress, TxStage};
