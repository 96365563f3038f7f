// ============================================================================
// spark-observe - Collection Change Router
//
// Keeps the registry in lockstep with collection membership.
// ============================================================================
//
//   Added / Replaced.new   -> attach adapter, register, push eager value
//   Removed / Replaced.old -> dispose adapter, unregister
//   Reset                  -> dispose everything, re-register the snapshot
//
// Registration happens before the eager push, so an observer reacting to
// that first value already sees the element as tracked. A snapshot is
// registered in full before any of its eager values go out: an observer that
// changes the collection from inside one of those values is routed against a
// complete registry, and adapters it releases skip their pending push.
// ============================================================================

use std::rc::{Rc, Weak};

use crate::collections::CollectionChange;
use crate::core::error::ObserveError;
use crate::core::record::PropertyName;
use crate::notify::NotifyPropertyChanged;

use super::adapter::{Accessor, PropertyAdapter};
use super::observer::Observer;
use super::registry::SubscriptionRegistry;

/// Reads the collection's current elements in iteration order.
pub(crate) type SnapshotFn<T> = Box<dyn Fn() -> Vec<Rc<T>>>;

/// Destination of every tracked element's values.
pub(crate) trait ElementSink<T, V> {
    fn element_value(&self, instance: Rc<T>, value: V);

    fn fail(&self, error: ObserveError);
}

/// Per-element observer handed to an adapter.
///
/// Holds only weak handles: the adapter lives inside the element's event
/// source, and the element is kept alive by the registry.
struct ElementForwarder<T, V> {
    instance: Weak<T>,
    sink: Weak<dyn ElementSink<T, V>>,
}

impl<T, V> Observer<V> for ElementForwarder<T, V> {
    fn on_next(&self, value: V) {
        if let (Some(instance), Some(sink)) = (self.instance.upgrade(), self.sink.upgrade()) {
            sink.element_value(instance, value);
        }
    }

    fn on_error(&self, error: ObserveError) {
        if let Some(sink) = self.sink.upgrade() {
            sink.fail(error);
        }
    }
}

/// Eager values owed by a freshly registered snapshot, in collection order.
///
/// Adapters released before delivery (by a nested change or a terminal
/// error) push nothing.
pub(crate) struct PendingPushes<T, V>(Vec<Rc<PropertyAdapter<T, V>>>);

impl<T, V> PendingPushes<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    pub(crate) fn deliver(self) {
        for adapter in self.0 {
            adapter.push_initial();
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub(crate) struct CollectionChangeRouter<T, V> {
    registry: SubscriptionRegistry<T>,
    snapshot: SnapshotFn<T>,
    read: Accessor<T, V>,
    tracked: PropertyName,
    push_initial: bool,
    sink: Weak<dyn ElementSink<T, V>>,
}

impl<T, V> CollectionChangeRouter<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    pub(crate) fn new(
        snapshot: SnapshotFn<T>,
        read: Accessor<T, V>,
        tracked: PropertyName,
        push_initial: bool,
        sink: Weak<dyn ElementSink<T, V>>,
    ) -> Self {
        Self {
            registry: SubscriptionRegistry::new(tracked.clone()),
            snapshot,
            read,
            tracked,
            push_initial,
            sink,
        }
    }

    /// Start tracking `element`, then push its eager value.
    pub(crate) fn track(&self, element: Rc<T>) -> Result<(), ObserveError> {
        if let Some(adapter) = self.register(element)? {
            adapter.push_initial();
        }
        Ok(())
    }

    /// Attach and register `element` without pushing anything.
    ///
    /// Returns the adapter if its entry was stored.
    fn register(&self, element: Rc<T>) -> Result<Option<Rc<PropertyAdapter<T, V>>>, ObserveError> {
        let forwarder: Rc<dyn Observer<V>> = Rc::new(ElementForwarder {
            instance: Rc::downgrade(&element),
            sink: self.sink.clone(),
        });
        let (subscription, adapter) = PropertyAdapter::attach(
            &element,
            self.read.clone(),
            self.tracked.clone(),
            self.push_initial,
            forwarder,
        );
        Ok(self.registry.add(element, subscription)?.then_some(adapter))
    }

    /// Stop tracking `element`.
    pub(crate) fn untrack(&self, element: &Rc<T>) -> Result<(), ObserveError> {
        self.registry.remove(element)
    }

    /// Register every element currently in the collection, in order.
    ///
    /// The eager values are returned undelivered; see [`PendingPushes`].
    pub(crate) fn register_snapshot(&self) -> Result<PendingPushes<T, V>, ObserveError> {
        let mut pending = Vec::new();
        for element in (self.snapshot)() {
            pending.extend(self.register(element)?);
        }
        Ok(PendingPushes(pending))
    }

    /// Track every element currently in the collection, in order.
    pub(crate) fn track_snapshot(&self) -> Result<(), ObserveError> {
        self.register_snapshot()?.deliver();
        Ok(())
    }

    /// Apply one membership change to the registry.
    pub(crate) fn route(&self, change: &CollectionChange<T>) -> Result<(), ObserveError> {
        match change {
            CollectionChange::Added { value, .. } => self.track(value.clone()),
            CollectionChange::Removed { value, .. } => self.untrack(value),
            CollectionChange::Replaced { old, new, .. } => {
                // Identity decides: value-equal old/new are still two elements.
                self.untrack(old)?;
                self.track(new.clone())
            }
            CollectionChange::Reset => {
                tracing::debug!(property = %self.tracked, released = self.registry.len(), "collection reset");
                if let Err(error) = self.registry.remove_all() {
                    tracing::warn!(property = %self.tracked, %error, "reset left failed releases behind");
                }
                self.track_snapshot()
            }
        }
    }

    /// Release every adapter and refuse new ones.
    pub(crate) fn close(&self) -> Result<(), ObserveError> {
        self.registry.close()
    }

    /// Number of elements currently tracked.
    pub(crate) fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn is_tracking(&self, element: &Rc<T>) -> bool {
        self.registry.contains(element)
    }
}

// =============================================================================
// TESTS
// =============================================================================
