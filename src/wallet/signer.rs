//! Signer resolution: turns the selected [`Account`] into something that
//! can produce a [`MultiSignature`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use sp_core::{Pair, sr25519};
use tracing::debug;

use crate::chain::{Call, ExtrinsicParams, MultiSignature, SignerPayload, SigningPayload};
use crate::error::{Error, Result};

use super::account::{Account, AccountSource};
use super::dev;
use super::extension::WalletExtension;

// ============================================================================
// Signer
// ============================================================================

/// Key material (or a route to it) for one account.
#[derive(Clone)]
pub enum Signer {
    /// In-process development keypair.
    Dev {
        /// Derived sr25519 pair.
        pair: sr25519::Pair,
        /// Public key of `pair`.
        account_id: [u8; 32],
    },
    /// Key held by the wallet extension.
    Extension {
        /// Extension that signs on our behalf.
        extension: Arc<dyn WalletExtension>,
        /// SS58 address passed to the extension.
        address: String,
        /// Decoded public key.
        account_id: [u8; 32],
    },
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev { account_id, .. } => f
                .debug_struct("Dev")
                .field("account_id", &hex::encode(account_id))
                .finish_non_exhaustive(),
            Self::Extension { address, .. } => f
                .debug_struct("Extension")
                .field("address", address)
                .finish_non_exhaustive(),
        }
    }
}

impl Signer {
    /// Resolves the signer for `account`.
    ///
    /// Development accounts are re-derived from the fixed seed list by
    /// address, so a registry entry cannot smuggle in an arbitrary seed.
    ///
    /// # Errors
    ///
    /// - [`Error::Signing`] if a development address matches no fixed seed
    /// - [`Error::Signing`] if an extension account is selected but no
    ///   extension is configured
    pub fn for_account(
        account: &Account,
        extension: Option<Arc<dyn WalletExtension>>,
        ss58_prefix: u16,
    ) -> Result<Self> {
        match &account.source {
            AccountSource::DevKeypair { .. } => {
                let seed = dev::seed_for_address(&account.address, ss58_prefix)
                    .ok_or_else(|| Error::signing("Unknown admin account"))?;
                let pair = dev::keypair(seed)?;
                debug!(address = %account.address, "Resolved development signer");

                Ok(Self::Dev {
                    account_id: pair.public().0,
                    pair,
                })
            }
            AccountSource::Extension { source } => {
                let extension = extension.ok_or_else(|| {
                    Error::signing(format!("No wallet extension available to sign for {source}"))
                })?;
                debug!(address = %account.address, source = %source, "Resolved extension signer");

                Ok(Self::Extension {
                    extension,
                    address: account.address.clone(),
                    account_id: account.public_key,
                })
            }
        }
    }

    /// Public key that goes into the extrinsic's address field.
    #[inline]
    #[must_use]
    pub fn account_id(&self) -> &[u8; 32] {
        match self {
            Self::Dev { account_id, .. } | Self::Extension { account_id, .. } => account_id,
        }
    }

    /// Returns `true` for in-process signers.
    #[inline]
    #[must_use]
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev { .. })
    }

    /// Signs `call` under `params`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] if the extension refuses or returns a
    /// malformed signature.
    pub async fn sign(&self, call: &Call, params: &ExtrinsicParams) -> Result<MultiSignature> {
        match self {
            Self::Dev { pair, .. } => {
                let message = SigningPayload::new(call, params).message();
                Ok(MultiSignature::Sr25519(pair.sign(&message).0))
            }
            Self::Extension {
                extension, address, ..
            } => {
                let payload = SignerPayload::new(address, call, params);
                let signature = extension.sign_payload(&payload).await.map_err(|e| match e {
                    Error::Signing { .. } => e,
                    other => Error::signing(format!("extension signing failed: {other}")),
                })?;

                MultiSignature::from_hex(&signature)
                    .map_err(|e| Error::signing(format!("malformed extension signature: {e}")))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
