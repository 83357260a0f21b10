//! Subscription notification types.
//!
//! Notifications are pushed by the node for an open subscription. They carry
//! no request `id`; routing is by the `subscription` field.
//!
//! # Transaction Status Values
//!
//! | Wire value | Variant | Meaning |
//! |------------|---------|---------|
//! | `"future"` | [`TxStatus::Future`] | In pool, nonce gap |
//! | `"ready"` | [`TxStatus::Ready`] | In pool, ready for inclusion |
//! | `{"broadcast": [..]}` | [`TxStatus::Broadcast`] | Gossiped to peers |
//! | `{"inBlock": hash}` | [`TxStatus::InBlock`] | Included in a block |
//! | `{"retracted": hash}` | [`TxStatus::Retracted`] | Block left the best chain |
//! | `{"finalityTimeout": hash}` | [`TxStatus::FinalityTimeout`] | Gave up waiting |
//! | `{"finalized": hash}` | [`TxStatus::Finalized`] | Finalized |
//! | `{"usurped": hash}` | [`TxStatus::Usurped`] | Replaced by another tx |
//! | `"dropped"` | [`TxStatus::Dropped`] | Dropped from pool |
//! | `"invalid"` | [`TxStatus::Invalid`] | Invalid |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::SubscriptionId;

// ============================================================================
// Notification
// ============================================================================

/// A subscription notification from the node.
///
/// # Format
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "method": "author_extrinsicUpdate",
///   "params": { "subscription": "abc", "result": "ready" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// Notification method name.
    pub method: String,

    /// Subscription id and payload.
    pub params: NotificationParams,
}

/// Payload of a [`Notification`].
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    /// Subscription the notification belongs to.
    pub subscription: SubscriptionId,

    /// Notification payload.
    pub result: Value,
}

// ============================================================================
// TxStatus
// ============================================================================

/// Lifecycle status of a submitted extrinsic, as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxStatus {
    /// In the pool but not yet ready (nonce gap).
    Future,
    /// In the pool and ready for inclusion.
    Ready,
    /// Broadcast to the listed peers.
    Broadcast(Vec<String>),
    /// Included in the given block.
    InBlock(String),
    /// The including block was retracted.
    Retracted(String),
    /// Finality was not reached in time.
    FinalityTimeout(String),
    /// Finalized in the given block.
    Finalized(String),
    /// Replaced by another transaction with the same nonce.
    Usurped(String),
    /// Dropped from the pool.
    Dropped,
    /// Rejected as invalid.
    Invalid,
}

impl TxStatus {
    /// Parses a status from a notification payload.
    ///
    /// Returns `None` for payloads that are not a known status.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    /// Returns `true` for statuses that end the subscription with an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Dropped | Self::Invalid | Self::Usurped(_) | Self::FinalityTimeout(_)
        )
    }

    /// Returns `true` for statuses after which the node sends nothing more.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_error() || matches!(self, Self::Finalized(_))
    }

    /// Short lowercase label used in logs and errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Ready => "ready",
            Self::Broadcast(_) => "broadcast",
            Self::InBlock(_) => "inBlock",
            Self::Retracted(_) => "retracted",
            Self::FinalityTimeout(_) => "finalityTimeout",
            Self::Finalized(_) => "finalized",
            Self::Usurped(_) => "usurped",
            Self::Dropped => "dropped",
            Self::Invalid => "invalid",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
