// ============================================================================
// spark-observe - Errors
// ============================================================================

use super::record::PropertyName;

/// Boxed error produced by a fallible property accessor.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Errors surfaced on the error channel of an element property stream.
///
/// Every variant is terminal: once an observer receives one, the stream
/// has released all of its subscriptions and emits nothing further.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// The collection announced an element that already has a tracked subscription.
    #[error("element added twice while observing \"{property}\": collection change stream is out of sync")]
    DuplicateElement {
        /// Tracked property name.
        property: PropertyName,
    },

    /// The collection announced the removal of an element that was never tracked.
    #[error("element removed but never tracked while observing \"{property}\": collection change stream is out of sync")]
    UnknownElement {
        /// Tracked property name.
        property: PropertyName,
    },

    /// The property accessor failed while reading the current value.
    #[error("failed to read property \"{property}\": {source}")]
    Accessor {
        /// Tracked property name.
        property: PropertyName,
        /// Error returned by the accessor.
        source: BoxError,
    },

    /// One or more subscriptions panicked while being released.
    ///
    /// Every pending release was still attempted.
    #[error("{} subscription(s) failed to release: {}", .failures.len(), .failures.join("; "))]
    Disposal {
        /// Panic message of each failed release.
        failures: Vec<String>,
    },
}

impl ObserveError {
    /// Whether the error signals that the collection's change events
    /// disagree with the tracked membership.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            Self::DuplicateElement { .. } | Self::UnknownElement { .. }
        )
    }

    /// Release failures carried by this error, or the error itself rendered
    /// as one failure.
    pub(crate) fn into_failures(self) -> Vec<String> {
        match self {
            Self::Disposal { failures } => failures,
            other => vec![other.to_string()],
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
