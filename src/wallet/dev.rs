//! Well-known development keypairs.
//!
//! Derived with sr25519 from the standard development phrase, so the
//! addresses match every Substrate dev chain (`//Alice` is
//! `5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY` under prefix 42).

// ============================================================================
// Imports
// ============================================================================

use std::sync::OnceLock;

use sp_core::crypto::{Ss58AddressFormat, Ss58Codec};
use sp_core::{Pair, sr25519};

use crate::error::{Error, Result};

use super::account::{Account, AccountSource};

// ============================================================================
// Constants
// ============================================================================

/// Development seeds, in registry order.
pub const DEV_SEEDS: [&str; 6] = ["//Alice", "//Bob", "//Charlie", "//Dave", "//Eve", "//Ferdie"];

/// Suffix of development account display names.
const DEV_NAME_SUFFIX: &str = " (Admin)";

// ============================================================================
// Derivation
// ============================================================================

/// Derives the keypair for a development seed.
///
/// # Errors
///
/// Returns [`Error::Signing`] if the seed is not a valid secret URI.
pub fn keypair(seed: &str) -> Result<sr25519::Pair> {
    sr25519::Pair::from_string(seed, None)
        .map_err(|e| Error::signing(format!("invalid development seed {seed}: {e:?}")))
}

/// Encodes a public key as SS58 under `ss58_prefix`.
#[must_use]
pub fn ss58(public_key: &[u8; 32], ss58_prefix: u16) -> String {
    sr25519::Public::from_raw(*public_key)
        .to_ss58check_with_version(Ss58AddressFormat::custom(ss58_prefix))
}

/// Public keys of [`DEV_SEEDS`], derived once per process.
fn dev_public_keys() -> Result<&'static [[u8; 32]]> {
    static KEYS: OnceLock<std::result::Result<Vec<[u8; 32]>, String>> = OnceLock::new();

    KEYS.get_or_init(|| {
        DEV_SEEDS
            .iter()
            .map(|seed| keypair(seed).map(|pair| pair.public().0).map_err(|e| e.to_string()))
            .collect()
    })
    .as_deref()
    .map_err(|message| Error::signing(message.clone()))
}

/// Public key for `seed`, from the cache when it is a fixed seed.
fn public_key(seed: &str) -> Result<[u8; 32]> {
    match DEV_SEEDS.iter().position(|fixed| *fixed == seed) {
        Some(index) => Ok(dev_public_keys()?[index]),
        None => Ok(keypair(seed)?.public().0),
    }
}

/// Derives the registry entry for a development seed.
///
/// # Errors
///
/// See [`keypair`].
pub fn account(seed: &str, ss58_prefix: u16) -> Result<Account> {
    let public_key = public_key(seed)?;
    let name = seed.trim_start_matches("//");

    Ok(Account {
        address: ss58(&public_key, ss58_prefix),
        name: format!("{name}{DEV_NAME_SUFFIX}"),
        source: AccountSource::DevKeypair {
            seed: seed.to_string(),
        },
        public_key,
    })
}

/// Derives all development accounts in [`DEV_SEEDS`] order.
///
/// # Errors
///
/// See [`keypair`].
pub fn accounts(ss58_prefix: u16) -> Result<Vec<Account>> {
    DEV_SEEDS
        .iter()
        .map(|seed| account(seed, ss58_prefix))
        .collect()
}

/// Finds the development seed whose account has `address`.
///
/// Returns `None` when no fixed seed derives to `address`.
#[must_use]
pub fn seed_for_address(address: &str, ss58_prefix: u16) -> Option<&'static str> {
    let keys = dev_public_keys().ok()?;
    DEV_SEEDS
        .iter()
        .zip(keys)
        .find(|(_, key)| ss58(key, ss58_prefix) == address)
        .map(|(seed, _)| *seed)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

    #[test]
    fn test_alice_and_bob_addresses() {
        assert_eq!(account("//Alice", 42).expect("alice").address, ALICE);
        assert_eq!(account("//Bob", 42).expect("bob").address, BOB);
    }

    #[test]
    fn test_display_names() {
        let names: Vec<String> = accounts(42)
            .expect("derive")
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(
            names,
            [
                "Alice (Admin)",
                "Bob (Admin)",
                "Charlie (Admin)",
                "Dave (Admin)",
                "Eve (Admin)",
                "Ferdie (Admin)"
            ]
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let first = keypair("//Alice").expect("first").public();
        let second = keypair("//Alice").expect("second").public();
        assert_eq!(first, second);
    }

    #[test]
    fn test_prefix_changes_address_not_key() {
        let generic = account("//Alice", 42).expect("generic");
        let polkadot = account("//Alice", 0).expect("polkadot");

        assert_ne!(generic.address, polkadot.address);
        assert_eq!(generic.public_key, polkadot.public_key);
        assert!(polkadot.address.starts_with('1'));
    }

    #[test]
    fn test_seed_for_address() {
        assert_eq!(seed_for_address(ALICE, 42), Some("//Alice"));
        assert_eq!(seed_for_address(BOB, 42), Some("//Bob"));
        assert_eq!(seed_for_address("not-an-address", 42), None);
        // Right key, wrong network prefix
        assert_eq!(seed_for_address(ALICE, 0), None);
    }

    #[test]
    fn test_invalid_seed() {
        assert!(keypair("not a uri with spaces //").is_err());
    }
}
