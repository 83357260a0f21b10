//! Transaction status stream.
//!
//! [`TxProgress`] turns the raw `author_extrinsicUpdate` notifications of one
//! submission into a finite stream of [`TxStatus`] values. The stream ends
//! right after the first terminal status; if the connection drops first it
//! yields one [`Error::ConnectionClosed`] and then ends.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::{RpcMethod, TxStatus};
use crate::transport::{Connection, Subscription};

// ============================================================================
// TxStage
// ============================================================================

/// Forward-only submission stage: `Ready < InBlock < Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TxStage {
    /// Accepted into the pool.
    Ready,
    /// Included in a block.
    InBlock,
    /// Finalized.
    Finalized,
}

impl TxStage {
    /// Stage a status moves to, if any.
    #[must_use]
    pub fn of(status: &TxStatus) -> Option<Self> {
        match status {
            TxStatus::Ready => Some(Self::Ready),
            TxStatus::InBlock(_) => Some(Self::InBlock),
            TxStatus::Finalized(_) => Some(Self::Finalized),
            _ => None,
        }
    }
}

/// Tracks the highest stage reached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageTracker {
    current: Option<TxStage>,
}

impl StageTracker {
    /// Creates a tracker with no stage reached.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Highest stage reached so far.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> Option<TxStage> {
        self.current
    }

    /// Moves to `stage` if it is strictly ahead; returns whether it moved.
    pub fn advance(&mut self, stage: TxStage) -> bool {
        match self.current {
            Some(current) if stage <= current => false,
            _ => {
                self.current = Some(stage);
                true
            }
        }
    }
}

// ============================================================================
// TxOutcome
// ============================================================================

/// Result object for a submission that reached a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Blake2-256 hash of the submitted extrinsic.
    pub extrinsic_hash: String,
    /// Block the extrinsic was included or finalized in.
    pub block_hash: String,
    /// Status that produced this outcome.
    pub status: TxStatus,
}

// ============================================================================
// TxProgress
// ============================================================================

/// Stream of status updates for one submitted extrinsic.
pub struct TxProgress {
    connection: Connection,
    subscription: Subscription,
    extrinsic_hash: String,
    finished: bool,
}

impl fmt::Debug for TxProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxProgress")
            .field("subscription", &self.subscription.id)
            .field("extrinsic_hash", &self.extrinsic_hash)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl TxProgress {
    pub(crate) fn new(connection: Connection, subscription: Subscription, extrinsic_hash: String) -> Self {
        Self {
            connection,
            subscription,
            extrinsic_hash,
            finished: false,
        }
    }

    /// Subscription id assigned by the node.
    #[inline]
    #[must_use]
    pub fn subscription_id(&self) -> &SubscriptionId {
        &self.subscription.id
    }

    /// Hash of the submitted extrinsic.
    #[inline]
    #[must_use]
    pub fn extrinsic_hash(&self) -> &str {
        &self.extrinsic_hash
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            let id = self.subscription.id.clone();
            self.connection
                .unsubscribe(id.clone(), RpcMethod::AuthorUnwatchExtrinsic(id));
        }
    }
}

impl Stream for TxProgress {
    type Item = Result<TxStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            match this.subscription.receiver.poll_recv(cx) {
                Poll::Pending => return Poll::Pending,

                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(Error::ConnectionClosed)));
                }

                Poll::Ready(Some(value)) => match TxStatus::parse(&value) {
                    Some(status) => {
                        trace!(
                            subscription_id = %this.subscription.id,
                            status = status.label(),
                            "Transaction status"
                        );
                        if status.is_terminal() {
                            this.finish();
                        }
                        return Poll::Ready(Some(Ok(status)));
                    }
                    None => {
                        warn!(
                            subscription_id = %this.subscription.id,
                            payload = %value,
                            "Unrecognized transaction status"
                        );
                    }
                },
            }
        }
    }
}

impl Drop for TxProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

// ============================================================================
// Tests
// ============================================================================
