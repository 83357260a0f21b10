//! Toast value type.

use serde::{Deserialize, Serialize};

// ============================================================================
// Severity
// ============================================================================

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral progress.
    #[default]
    Info,
    /// Completed successfully.
    Success,
    /// Needs attention, still in progress.
    Warning,
    /// Failed.
    Error,
}

impl Severity {
    /// Lowercase name, as UI frameworks spell the color.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// Toast
// ============================================================================

/// Content of one notification.
///
/// `auto_dismiss_ms == None` means the toast stays until updated or
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    /// Heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Color.
    pub severity: Severity,
    /// Auto-dismiss delay.
    pub auto_dismiss_ms: Option<u64>,
    /// Whether the user may close it.
    pub dismissible: bool,
    /// Icon name.
    pub icon: Option<String>,
}

impl Toast {
    /// Creates a sticky, non-dismissible info toast.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Sets the severity.
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Dismisses automatically after `ms` milliseconds.
    #[inline]
    #[must_use]
    pub fn with_auto_dismiss(mut self, ms: u64) -> Self {
        self.auto_dismiss_ms = Some(ms);
        self
    }

    /// Lets the user close it.
    #[inline]
    #[must_use]
    pub fn with_dismissible(mut self) -> Self {
        self.dismissible = true;
        self
    }

    /// Sets the icon.
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Returns `true` if the toast stays until acted on.
    #[inline]
    #[must_use]
    pub const fn is_sticky(&self) -> bool {
        self.auto_dismiss_ms.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_sticky_info() {
        let toast = Toast::new("Title", "Body");
        assert_eq!(toast.severity, Severity::Info);
        assert!(toast.is_sticky());
        assert!(!toast.dismissible);
        assert!(toast.icon.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let toast = Toast::new("Title", "Done")
            .with_severity(Severity::Success)
            .with_auto_dismiss(2000)
            .with_dismissible()
            .with_icon("i-lucide-check");

        assert!(!toast.is_sticky());
        assert!(toast.dismissible);
        assert_eq!(toast.icon.as_deref(), Some("i-lucide-check"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(Toast::new("T", "D").with_auto_dismiss(5)).expect("json");
        assert_eq!(json["severity"], "info");
        assert_eq!(json["autoDismissMs"], 5);
        assert_eq!(json["dismissible"], false);
    }
}
