//! Accounts and signers.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Account`] | Selectable account with its key location |
//! | [`AccountRegistry`] | Development accounts followed by extension accounts |
//! | [`WalletExtension`] | Browser wallet bridge |
//! | [`Signer`] | Resolved key for one account |

// ============================================================================
// Submodules
// ============================================================================

/// Account entity.
pub mod account;

/// Well-known development keypairs.
pub mod dev;

/// Wallet extension bridge.
pub mod extension;

/// Ordered account registry.
pub mod registry;

/// Signer resolution.
pub mod signer;

// ============================================================================
// Re-exports
// ============================================================================

pub use account::{Account, AccountSource};
pub use dev::DEV_SEEDS;
pub use extension::{InjectedAccount, WalletExtension, import_accounts};
pub use registry::AccountRegistry;
pub use signer::Signer;
