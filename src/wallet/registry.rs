//! Account registry: development accounts first, extension accounts after.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::Result;

use super::account::Account;
use super::dev;

// ============================================================================
// AccountRegistry
// ============================================================================

/// Ordered set of selectable accounts.
///
/// The development accounts are derived once at construction and are
/// always present as a prefix; extension accounts follow and are replaced
/// wholesale on every discovery.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    dev: Vec<Account>,
    extension: Vec<Account>,
    ss58_prefix: u16,
}

impl AccountRegistry {
    /// Creates a registry holding only the development accounts.
    ///
    /// # Errors
    ///
    /// Propagates key derivation failures.
    pub fn new(ss58_prefix: u16) -> Result<Self> {
        let dev = dev::accounts(ss58_prefix)?;
        debug!(count = dev.len(), ss58_prefix, "Derived development accounts");

        Ok(Self {
            dev,
            extension: Vec::new(),
            ss58_prefix,
        })
    }

    /// Network prefix used for development addresses.
    #[inline]
    #[must_use]
    pub const fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// All accounts: development first, then extension.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.dev.iter().chain(self.extension.iter())
    }

    /// Owned snapshot of [`AccountRegistry::iter`].
    #[must_use]
    pub fn to_vec(&self) -> Vec<Account> {
        self.iter().cloned().collect()
    }

    /// Development accounts.
    #[inline]
    #[must_use]
    pub fn dev_accounts(&self) -> &[Account] {
        &self.dev
    }

    /// Extension accounts from the last discovery.
    #[inline]
    #[must_use]
    pub fn extension_accounts(&self) -> &[Account] {
        &self.extension
    }

    /// Replaces the extension accounts.
    pub fn set_extension_accounts(&mut self, accounts: Vec<Account>) {
        debug!(count = accounts.len(), "Extension accounts replaced");
        self.extension = accounts;
    }

    /// Drops all extension accounts.
    pub fn clear_extension_accounts(&mut self) {
        self.extension.clear();
    }

    /// Looks up an account by address.
    #[must_use]
    pub fn find(&self, address: &str) -> Option<&Account> {
        self.iter().find(|account| account.address == address)
    }

    /// Returns `true` if `address` is in the registry.
    #[inline]
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.find(address).is_some()
    }

    /// First account in registry order.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Account> {
        self.iter().next()
    }

    /// Resolves `address`, falling back to the first account.
    #[must_use]
    pub fn find_or_first(&self, address: &str) -> Option<&Account> {
        self.find(address).or_else(|| self.first())
    }

    /// Number of accounts.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dev.len() + self.extension.len()
    }

    /// Returns `true` if the registry holds no account.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::wallet::account::AccountSource;
    use crate::wallet::dev::DEV_SEEDS;

    fn extension_account(address: &str) -> Account {
        Account {
            address: address.to_string(),
            name: address.to_string(),
            source: AccountSource::Extension {
                source: "test".into(),
            },
            public_key: [1; 32],
        }
    }

    #[test]
    fn test_new_holds_exactly_dev_accounts_in_order() {
        let registry = AccountRegistry::new(42).expect("registry");
        let seeds: Vec<&str> = registry.iter().filter_map(Account::dev_seed).collect();

        assert_eq!(registry.len(), DEV_SEEDS.len());
        assert_eq!(seeds, DEV_SEEDS);
        assert!(registry.extension_accounts().is_empty());
    }

    #[test]
    fn test_extension_accounts_follow_dev_accounts() {
        let mut registry = AccountRegistry::new(42).expect("registry");
        registry.set_extension_accounts(vec![extension_account("ext-1"), extension_account("ext-2")]);

        let all = registry.to_vec();
        assert_eq!(all.len(), DEV_SEEDS.len() + 2);
        assert!(all[..DEV_SEEDS.len()].iter().all(Account::is_dev));
        assert_eq!(all[DEV_SEEDS.len()].address, "ext-1");
        assert_eq!(all[DEV_SEEDS.len() + 1].address, "ext-2");
    }

    #[test]
    fn test_clear_keeps_dev_accounts() {
        let mut registry = AccountRegistry::new(42).expect("registry");
        registry.set_extension_accounts(vec![extension_account("ext-1")]);
        registry.clear_extension_accounts();

        assert_eq!(registry.len(), DEV_SEEDS.len());
        assert!(!registry.contains("ext-1"));
    }

    #[test]
    fn test_find_or_first() {
        let mut registry = AccountRegistry::new(42).expect("registry");
        registry.set_extension_accounts(vec![extension_account("ext-1")]);

        assert_eq!(registry.find_or_first("ext-1").map(|a| a.address.as_str()), Some("ext-1"));
        assert_eq!(
            registry.find_or_first("missing").and_then(Account::dev_seed),
            Some("//Alice")
        );
    }

    mod props {
        use super::*;

        use proptest::prelude::*;

        proptest! {
            #[test]
            fn dev_accounts_are_always_a_prefix(addresses in proptest::collection::vec("[a-z0-9]{1,12}", 0..8)) {
                let mut registry = AccountRegistry::new(42).expect("registry");
                registry.set_extension_accounts(addresses.iter().map(|a| extension_account(a)).collect());

                let all = registry.to_vec();
                prop_assert_eq!(&all[..DEV_SEEDS.len()], registry.dev_accounts());
                prop_assert_eq!(all.len(), DEV_SEEDS.len() + addresses.len());
            }

            #[test]
            fn unknown_address_resolves_to_first(address in "[a-z]{1,20}") {
                let registry = AccountRegistry::new(42).expect("registry");
                let resolved = registry.find_or_first(&address).expect("non-empty");
                prop_assert_eq!(resolved, registry.first().expect("non-empty"));
            }
        }
    }
}
