//! Wallet extension bridge.
//!
//! The browser injects the extension; this crate only sees it through the
//! [`WalletExtension`] trait. A front end implements the trait on top of
//! whatever bridge it has (wasm-bindgen, IPC to a webview, a test double).

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sp_core::crypto::{AccountId32, Ss58Codec};
use tracing::warn;

use crate::chain::SignerPayload;
use crate::error::{Error, Result};

use super::account::{Account, AccountSource};

// ============================================================================
// InjectedAccount
// ============================================================================

/// Account as reported by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectedAccount {
    /// SS58 address (any network prefix).
    pub address: String,
    /// User-chosen name.
    #[serde(default)]
    pub name: Option<String>,
    /// Extension that holds the key.
    pub source: String,
}

impl InjectedAccount {
    /// Converts into a registry [`Account`], decoding the public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the address is not valid SS58.
    pub fn into_account(self) -> Result<Account> {
        let (account_id, _format) = AccountId32::from_ss58check_with_version(&self.address)
            .map_err(|e| Error::invalid_argument(format!("bad address {}: {e:?}", self.address)))?;
        let public_key: [u8; 32] = account_id.into();
        let name = self.name.unwrap_or_else(|| self.address.clone());

        Ok(Account {
            address: self.address,
            name,
            source: AccountSource::Extension {
                source: self.source,
            },
            public_key,
        })
    }
}

/// Converts injected accounts, dropping (and logging) malformed ones.
#[must_use]
pub fn import_accounts(injected: Vec<InjectedAccount>) -> Vec<Account> {
    injected
        .into_iter()
        .filter_map(|account| {
            let address = account.address.clone();
            match account.into_account() {
                Ok(account) => Some(account),
                Err(e) => {
                    warn!(address = %address, error = %e, "Skipping extension account");
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// WalletExtension
// ============================================================================

/// Browser wallet extension capable of account discovery and remote signing.
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Asks the extension to authorize `app_name`.
    ///
    /// Returns `false` when no extension is installed or the user declined.
    async fn enable(&self, app_name: &str) -> Result<bool>;

    /// Accounts the user exposed to this application.
    async fn accounts(&self) -> Result<Vec<InjectedAccount>>;

    /// Signs `payload` with the key of `payload.address`.
    ///
    /// Returns the hex-encoded, scheme-tagged signature.
    async fn sign_payload(&self, payload: &SignerPayload) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    #[test]
    fn test_into_account_decodes_key() {
        let account = InjectedAccount {
            address: ALICE.into(),
            name: Some("My Alice".into()),
            source: "polkadot-js".into(),
        }
        .into_account()
        .expect("valid");

        let expected = crate::wallet::dev::account("//Alice", 42).expect("alice");
        assert_eq!(account.public_key, expected.public_key);
        assert_eq!(account.name, "My Alice");
        assert!(!account.is_dev());
    }

    #[test]
    fn test_missing_name_falls_back_to_address() {
        let account = InjectedAccount {
            address: ALICE.into(),
            name: None,
            source: "talisman".into(),
        }
        .into_account()
        .expect("valid");
        assert_eq!(account.name, ALICE);
    }

    #[test]
    fn test_import_skips_malformed() {
        let accounts = import_accounts(vec![
            InjectedAccount {
                address: "garbage".into(),
                name: None,
                source: "x".into(),
            },
            InjectedAccount {
                address: ALICE.into(),
                name: None,
                source: "x".into(),
            },
        ]);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address, ALICE);
    }

    #[test]
    fn test_injected_account_json() {
        let account: InjectedAccount = serde_json::from_str(
            r#"{ "address": "5Grw", "source": "polkadot-js" }"#,
        )
        .expect("parse");
        assert_eq!(account.name, None);
    }
}
