//! Account entity.

use serde::{Deserialize, Serialize};

// ============================================================================
// AccountSource
// ============================================================================

/// Where an account's private key lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AccountSource {
    /// In-process keypair derived from a well-known development seed.
    DevKeypair {
        /// Derivation URI, e.g. `//Alice`.
        seed: String,
    },
    /// Key held by a browser wallet extension.
    Extension {
        /// Extension that injected the account.
        source: String,
    },
}

// ============================================================================
// Account
// ============================================================================

/// A selectable signing account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// SS58 address.
    pub address: String,
    /// Display name.
    pub name: String,
    /// Key location.
    pub source: AccountSource,
    /// Raw sr25519 public key / account id.
    #[serde(with = "hex_key")]
    pub public_key: [u8; 32],
}

impl Account {
    /// Returns `true` for development keypair accounts.
    #[inline]
    #[must_use]
    pub fn is_dev(&self) -> bool {
        matches!(self.source, AccountSource::DevKeypair { .. })
    }

    /// Derivation seed of a development account.
    #[inline]
    #[must_use]
    pub fn dev_seed(&self) -> Option<&str> {
        match &self.source {
            AccountSource::DevKeypair { seed } => Some(seed),
            AccountSource::Extension { .. } => None,
        }
    }
}

/// Public keys travel as `0x` hex in JSON.
mod hex_key {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use crate::chain::extrinsic::{hash_from_hex, to_hex};

    pub fn serialize<S: Serializer>(key: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        hash_from_hex(&text).map_err(D::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
