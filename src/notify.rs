// ============================================================================
// spark-observe - Property Change Notification
//
// The per-instance "something changed" contract consumed by the adapter.
// ============================================================================

use std::borrow::Cow;
use std::fmt;

use crate::core::event::EventSource;

// =============================================================================
// EVENT
// =============================================================================

/// A "property changed" event raised by an element.
///
/// An absent or empty name is the wildcard: every property of the
/// instance should be considered changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChanged {
    name: Option<Cow<'static, str>>,
}

impl PropertyChanged {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// The wildcard event.
    pub fn all() -> Self {
        Self { name: None }
    }

    /// The reported property name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.name().is_none_or(str::is_empty)
    }
}

// =============================================================================
// NOTIFIER TRAIT
// =============================================================================

/// Implemented by elements that announce their own property changes.
///
/// Implementors raise a [`PropertyChanged`] on the returned source after
/// the new value is observable through their getters.
pub trait NotifyPropertyChanged: 'static {
    fn property_changed(&self) -> &EventSource<PropertyChanged>;
}

// =============================================================================
// PROPERTY CHANGED SOURCE
// =============================================================================

/// Ready-made event source for elements to embed.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use spark_observe::{EventSource, NotifyPropertyChanged, PropertyChanged, PropertyChangedSource};
///
/// struct Person {
///     age: Cell<u32>,
///     changed: PropertyChangedSource,
/// }
///
/// impl Person {
///     fn birthday(&self) {
///         self.age.set(self.age.get() + 1);
///         self.changed.notify("age");
///     }
/// }
///
/// impl NotifyPropertyChanged for Person {
///     fn property_changed(&self) -> &EventSource<PropertyChanged> {
///         self.changed.source()
///     }
/// }
/// ```
#[derive(Default)]
pub struct PropertyChangedSource {
    source: EventSource<PropertyChanged>,
}

impl PropertyChangedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &EventSource<PropertyChanged> {
        &self.source
    }

    /// Announce that `name` changed.
    pub fn notify(&self, name: impl Into<Cow<'static, str>>) {
        self.source.emit(&PropertyChanged::named(name));
    }

    /// Announce that everything changed.
    pub fn notify_all(&self) {
        self.source.emit(&PropertyChanged::all());
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.source.len()
    }
}

impl fmt::Debug for PropertyChangedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangedSource")
            .field("listeners", &self.source.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
