//! Substrate RPC methods used by the session.
//!
//! Methods follow the `module_methodName` naming of the node's RPC surface.
//!
//! | Module | Methods |
//! |--------|---------|
//! | `chain` | `getBlockHash` |
//! | `state` | `getRuntimeVersion` |
//! | `system` | `chain`, `accountNextIndex` |
//! | `author` | `submitAndWatchExtrinsic`, `unwatchExtrinsic` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

use crate::identifiers::SubscriptionId;

// ============================================================================
// Constants
// ============================================================================

/// Notification method carrying transaction status updates.
pub const EXTRINSIC_UPDATE: &str = "author_extrinsicUpdate";

// ============================================================================
// RpcMethod
// ============================================================================

/// A node RPC call with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcMethod {
    /// Block hash at the given height (0 = genesis).
    ChainGetBlockHash(u32),

    /// Runtime version at the best block.
    StateGetRuntimeVersion,

    /// Human readable chain name.
    SystemChain,

    /// Next usable nonce for an SS58 address, including the pool.
    SystemAccountNextIndex(String),

    /// Submit a hex-encoded extrinsic and subscribe to its status.
    AuthorSubmitAndWatchExtrinsic(String),

    /// Drop a status subscription.
    AuthorUnwatchExtrinsic(SubscriptionId),
}

impl RpcMethod {
    /// Returns the wire method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ChainGetBlockHash(_) => "chain_getBlockHash",
            Self::StateGetRuntimeVersion => "state_getRuntimeVersion",
            Self::SystemChain => "system_chain",
            Self::SystemAccountNextIndex(_) => "system_accountNextIndex",
            Self::AuthorSubmitAndWatchExtrinsic(_) => "author_submitAndWatchExtrinsic",
            Self::AuthorUnwatchExtrinsic(_) => "author_unwatchExtrinsic",
        }
    }

    /// Returns the positional params array.
    #[must_use]
    pub fn params(&self) -> Value {
        match self {
            Self::ChainGetBlockHash(height) => json!([height]),
            Self::StateGetRuntimeVersion | Self::SystemChain => json!([]),
            Self::SystemAccountNextIndex(address) => json!([address]),
            Self::AuthorSubmitAndWatchExtrinsic(extrinsic) => json!([extrinsic]),
            Self::AuthorUnwatchExtrinsic(subscription) => json!([subscription.as_str()]),
        }
    }

    /// Returns `true` if the call opens a subscription.
    #[inline]
    #[must_use]
    pub const fn is_subscription(&self) -> bool {
        matches!(self, Self::AuthorSubmitAndWatchExtrinsic(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
