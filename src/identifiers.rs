//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wraps | Source |
//! |------|-------|--------|
//! | [`RequestId`] | `u64` | Process-wide counter, JSON-RPC `id` |
//! | [`SubscriptionId`] | `String` | Assigned by the node |
//! | [`ToastId`] | `Uuid` | Assigned by the [`Notifier`](crate::notify::Notifier) |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// RequestId
// ============================================================================

/// Next request id. Starts at 1 so 0 never appears on the wire.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC request identifier used for request/response correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocates the next unique request id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Node-assigned subscription identifier.
///
/// Nodes send these as strings or numbers; both normalize to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates a subscription id from a string.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalizes a JSON value into a subscription id.
    ///
    /// Returns `None` for values that are neither strings nor numbers.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("subscription id must be a string or number"))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ToastId
// ============================================================================

/// Handle of a status notification on the UI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(Uuid);

impl ToastId {
    /// Generates a fresh random id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_request_id_serializes_as_number() {
        let id = RequestId::from_raw(7);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
    }

    #[test]
    fn test_subscription_id_from_string_and_number() {
        let from_str: SubscriptionId = serde_json::from_value(json!("abc")).expect("string");
        let from_num: SubscriptionId = serde_json::from_value(json!(42)).expect("number");

        assert_eq!(from_str.as_str(), "abc");
        assert_eq!(from_num.as_str(), "42");
        assert!(SubscriptionId::from_value(&json!(null)).is_none());
    }

    #[test]
    fn test_toast_ids_are_unique() {
        assert_ne!(ToastId::generate(), ToastId::generate());
    }
}
