// ============================================================================
// spark-observe - Collection Change Contract
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::core::event::EventSource;

/// Membership change raised by an observable collection.
///
/// All four kinds travel through one event source, so a listener sees them
/// in exactly the order the collection applied them.
pub enum CollectionChange<T> {
    /// `value` was inserted at `index`.
    Added { index: usize, value: Rc<T> },
    /// `value` was removed from `index`.
    Removed { index: usize, value: Rc<T> },
    /// The element at `index` was replaced: `old` left, `new` entered.
    Replaced {
        index: usize,
        old: Rc<T>,
        new: Rc<T>,
    },
    /// Membership changed wholesale; re-read the collection.
    Reset,
}

impl<T> CollectionChange<T> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Added { .. } => ChangeKind::Added,
            Self::Removed { .. } => ChangeKind::Removed,
            Self::Replaced { .. } => ChangeKind::Replaced,
            Self::Reset => ChangeKind::Reset,
        }
    }

    /// Index the change applied to. `None` for resets.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Added { index, .. } | Self::Removed { index, .. } | Self::Replaced { index, .. } => {
                Some(*index)
            }
            Self::Reset => None,
        }
    }
}

impl<T> Clone for CollectionChange<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Added { index, value } => Self::Added {
                index: *index,
                value: value.clone(),
            },
            Self::Removed { index, value } => Self::Removed {
                index: *index,
                value: value.clone(),
            },
            Self::Replaced { index, old, new } => Self::Replaced {
                index: *index,
                old: old.clone(),
                new: new.clone(),
            },
            Self::Reset => Self::Reset,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CollectionChange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { index, value } => f
                .debug_struct("Added")
                .field("index", index)
                .field("value", value)
                .finish(),
            Self::Removed { index, value } => f
                .debug_struct("Removed")
                .field("index", index)
                .field("value", value)
                .finish(),
            Self::Replaced { index, old, new } => f
                .debug_struct("Replaced")
                .field("index", index)
                .field("old", old)
                .field("new", new)
                .finish(),
            Self::Reset => f.write_str("Reset"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ChangeKind {
    Added,
    Removed,
    Replaced,
    Reset,
}

// =============================================================================
// OBSERVABLE COLLECTION TRAIT
// =============================================================================

/// An ordered collection of shared elements that announces membership changes.
///
/// Implementors must raise each change after it is applied, so `snapshot`
/// called from a listener already reflects it, and must not hold any
/// internal borrow while emitting.
pub trait ObservableCollection: 'static {
    type Item: 'static;

    /// Current elements in iteration order.
    fn snapshot(&self) -> Vec<Rc<Self::Item>>;

    fn collection_changed(&self) -> &EventSource<CollectionChange<Self::Item>>;
}
