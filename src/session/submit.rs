//! Sign-and-submit flow.
//!
//! One status toast follows the transaction from signing to its terminal
//! status. The status stream is consumed in a single loop; only
//! `Finalized` settles with success and only an error status, a signing
//! failure, or a closed stream settles with an error.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::chain::{
    Client, ExtrinsicParams, SignedExtrinsic, StageTracker, Transaction, TxOutcome, TxStage,
};
use crate::error::{Error, Result};
use crate::notify::{Severity, StatusToast, Toast};
use crate::protocol::TxStatus;
use crate::wallet::{Account, Signer};

use super::core::Session;

// ============================================================================
// Constants
// ============================================================================

/// Title of the submission status toast.
pub const STATUS_TITLE: &str = "Transaction Status";

/// How long the finalized toast stays up.
pub const FINALIZED_DISMISS_MS: u64 = 2000;

// ============================================================================
// Toasts
// ============================================================================

fn signing_toast(is_dev: bool) -> Toast {
    let description = if is_dev {
        "Signing with admin account..."
    } else {
        "Waiting for signature..."
    };
    Toast::new(STATUS_TITLE, description).with_icon("i-lucide-clock")
}

fn submitted_toast() -> Toast {
    Toast::new(STATUS_TITLE, "Transaction submitted to network...").with_icon("i-lucide-send")
}

fn in_block_toast() -> Toast {
    Toast::new(
        STATUS_TITLE,
        "Transaction included in block, awaiting finalization...",
    )
    .with_severity(Severity::Warning)
    .with_icon("i-lucide-package")
}

fn finalized_toast() -> Toast {
    Toast::new(STATUS_TITLE, "Transaction finalized!")
        .with_severity(Severity::Success)
        .with_auto_dismiss(FINALIZED_DISMISS_MS)
        .with_dismissible()
        .with_icon("i-lucide-package-check")
}

// ============================================================================
// Session - Submission
// ============================================================================

impl Session {
    /// Signs `tx` with the selected account, submits it, and waits for
    /// finalization.
    ///
    /// `on_in_block` runs once, when the transaction is first included in
    /// a block.
    ///
    /// # Errors
    ///
    /// - [`Error::NoAccount`] if no account is selected or no node is connected
    /// - [`Error::Signing`] if the signer cannot be resolved or refuses
    /// - [`Error::Submission`] if the node reports a dropped, invalid,
    ///   usurped, or finality-timeout status
    /// - [`Error::ConnectionClosed`] if the stream ends before a terminal status
    /// - [`Error::Rpc`] if the node rejects the extrinsic on submission
    pub async fn sign_and_send<F>(&self, tx: &Transaction, mut on_in_block: F) -> Result<TxOutcome>
    where
        F: FnMut(&TxOutcome),
    {
        let (account, client) = match (self.selected_account(), self.client()) {
            (Some(account), Some(client)) => (account, client),
            _ => {
                warn!("Cannot submit without a selected account and a live connection");
                return Err(Error::NoAccount);
            }
        };

        // Dropping `status` on any early return removes the toast.
        let mut status = StatusToast::show(
            Arc::clone(&self.inner.notifier),
            signing_toast(account.is_dev()),
        );

        let extrinsic = self
            .sign(&client, &account, tx)
            .await
            .inspect_err(|e| error!(address = %account.address, error = %e, "Signing failed"))?;

        let mut progress = client
            .submit_and_watch(&extrinsic)
            .await
            .inspect_err(|e| error!(error = %e, "Submission rejected"))?;
        let extrinsic_hash = progress.extrinsic_hash().to_string();

        let mut tracker = StageTracker::new();
        while let Some(update) = progress.next().await {
            let update = update.inspect_err(|e| {
                error!(hash = %extrinsic_hash, error = %e, "Status stream failed");
            })?;

            if update.is_error() {
                error!(hash = %extrinsic_hash, status = update.label(), "Transaction error");
                status.dismiss();
                return Err(submission_error(&update));
            }

            let Some(stage) = TxStage::of(&update) else {
                debug!(hash = %extrinsic_hash, status = update.label(), "Transaction status");
                continue;
            };
            if !tracker.advance(stage) {
                debug!(hash = %extrinsic_hash, status = update.label(), "Ignoring stale status");
                continue;
            }

            match &update {
                TxStatus::Ready => status.update(submitted_toast()),
                TxStatus::InBlock(block) => {
                    info!(hash = %extrinsic_hash, block = %block, "Transaction in block");
                    status.update(in_block_toast());
                    on_in_block(&TxOutcome {
                        extrinsic_hash: extrinsic_hash.clone(),
                        block_hash: block.clone(),
                        status: update.clone(),
                    });
                }
                TxStatus::Finalized(block) => {
                    info!(hash = %extrinsic_hash, block = %block, "Transaction finalized");
                    status.finish(finalized_toast());
                    return Ok(TxOutcome {
                        extrinsic_hash,
                        block_hash: block.clone(),
                        status: update.clone(),
                    });
                }
                _ => {}
            }
        }

        error!(hash = %extrinsic_hash, "Status stream ended before a terminal status");
        status.dismiss();
        Err(Error::ConnectionClosed)
    }

    /// [`Session::sign_and_send`] without an in-block callback.
    ///
    /// # Errors
    ///
    /// See [`Session::sign_and_send`].
    pub async fn submit(&self, tx: &Transaction) -> Result<TxOutcome> {
        self.sign_and_send(tx, |_| {}).await
    }

    /// Resolves the signer, fetches the nonce, signs, and encodes.
    async fn sign(
        &self,
        client: &Client,
        account: &Account,
        tx: &Transaction,
    ) -> Result<SignedExtrinsic> {
        let signer = Signer::for_account(
            account,
            self.inner.extension.clone(),
            self.inner.options.ss58_prefix,
        )?;

        let nonce = client.account_next_index(&account.address).await?;
        let info = client.chain_info();
        let params = ExtrinsicParams {
            spec_version: info.spec_version,
            transaction_version: info.transaction_version,
            genesis_hash: info.genesis_hash,
            nonce,
            tip: tx.tip,
            metadata_hash_check: self.inner.options.metadata_hash_check,
        };
        debug!(address = %account.address, nonce, "Signing transaction");

        let signature = signer.sign(&tx.call, &params).await?;
        Ok(SignedExtrinsic::new(
            signer.account_id(),
            &signature,
            &tx.call,
            &params,
        ))
    }
}

fn submission_error(status: &TxStatus) -> Error {
    let message = match status {
        TxStatus::Dropped => "dropped from the transaction pool".to_string(),
        TxStatus::Invalid => "declared invalid by the node".to_string(),
        TxStatus::Usurped(by) => format!("usurped by {by}"),
        TxStatus::FinalityTimeout(block) => format!("finality timed out in block {block}"),
        other => format!("unexpected status {}", other.label()),
    };
    Error::submission(status.label(), message)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chain::Call;
    use crate::notify::MemoryNotifier;
    use crate::session::SessionOptions;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_toast_texts() {
        assert_eq!(signing_toast(true).description, "Signing with admin account...");
        assert_eq!(signing_toast(false).description, "Waiting for signature...");

        let initial = signing_toast(true);
        assert!(initial.is_sticky());
        assert!(!initial.dismissible);
        assert_eq!(initial.severity, Severity::Info);

        assert_eq!(in_block_toast().severity, Severity::Warning);

        let finalized = finalized_toast();
        assert_eq!(finalized.severity, Severity::Success);
        assert_eq!(finalized.auto_dismiss_ms, Some(2000));
        assert!(finalized.dismissible);
        assert_eq!(finalized.icon.as_deref(), Some("i-lucide-package-check"));
    }

    #[test]
    fn test_submission_error_labels() {
        let err = submission_error(&TxStatus::Invalid);
        assert!(err.is_submission_error());
        assert!(err.to_string().starts_with("Transaction invalid"));

        let err = submission_error(&TxStatus::Usurped("0xab".into()));
        assert!(err.to_string().contains("0xab"));
    }

    #[tokio::test]
    async fn test_no_account_fails_without_toast() {
        let notifier = Arc::new(MemoryNotifier::new());
        let session = Session::new(
            None,
            SessionOptions::new(),
            Arc::new(MemoryStorage::new()),
            notifier.clone(),
            None,
        )
        .expect("session");
        session.select_account("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");

        let tx = Transaction::new(Call::new(0, 0));
        let err = session.submit(&tx).await.expect_err("not connected");

        assert!(matches!(err, Error::NoAccount));
        assert_eq!(err.to_string(), "No account or API connection");
        assert!(notifier.history().is_empty());
    }
}
