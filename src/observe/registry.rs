// ============================================================================
// spark-observe - Subscription Registry
//
// Identity-keyed map from tracked element to its adapter subscription.
// ============================================================================
//
// Invariant: exactly one entry per element believed to be a member of the
// collection. A duplicate add or an unknown remove means the collection's
// change stream disagrees with what we tracked; both are reported as errors.
//
// All methods take `&self` and never hold the map borrowed while a
// subscription is being disposed: teardown code may call back in.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::error::ObserveError;
use crate::core::record::{ElementKey, PropertyName};
use crate::core::subscription::{catch_release, release_all, Subscription};

struct Entry<T> {
    /// Keeps the allocation alive so its address cannot be reused as a key.
    element: Rc<T>,
    subscription: Subscription,
}

impl<T> Entry<T> {
    /// Detach the adapter, then let go of the element.
    ///
    /// Both steps run even if the first panics. Dropping the element may run
    /// its destructor when the registry held the last handle.
    fn release(self) -> Result<(), String> {
        let Entry {
            element,
            subscription,
        } = self;
        let detached = subscription.try_dispose();
        let dropped = catch_release(move || drop(element));
        detached.and(dropped)
    }
}

pub(crate) struct SubscriptionRegistry<T> {
    entries: RefCell<HashMap<ElementKey, Entry<T>>>,
    property: PropertyName,
    closed: Cell<bool>,
}

impl<T> SubscriptionRegistry<T> {
    pub(crate) fn new(property: PropertyName) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            property,
            closed: Cell::new(false),
        }
    }

    /// Track `subscription` for `element`.
    ///
    /// Fails with [`ObserveError::DuplicateElement`] if the element is already
    /// tracked; the existing entry is kept and the new subscription disposed.
    /// On a closed registry the subscription is disposed and nothing is stored.
    ///
    /// Returns whether the subscription was stored.
    pub(crate) fn add(&self, element: Rc<T>, subscription: Subscription) -> Result<bool, ObserveError> {
        if self.closed.get() {
            subscription.dispose();
            return Ok(false);
        }

        let key = ElementKey::of(&element);
        let rejected = {
            let mut entries = self.entries.borrow_mut();
            if entries.contains_key(&key) {
                Some(subscription)
            } else {
                entries.insert(
                    key,
                    Entry {
                        element,
                        subscription,
                    },
                );
                None
            }
        };

        match rejected {
            Some(subscription) => {
                subscription.dispose();
                tracing::warn!(property = %self.property, "duplicate element in registry");
                Err(ObserveError::DuplicateElement {
                    property: self.property.clone(),
                })
            }
            None => {
                tracing::trace!(property = %self.property, tracked = self.len(), "element tracked");
                Ok(true)
            }
        }
    }

    /// Dispose and forget the subscription for `element`.
    ///
    /// Fails with [`ObserveError::UnknownElement`] if it was not tracked.
    /// Succeeds silently once the registry is closed. A panicking release is
    /// logged; the entry is gone either way.
    pub(crate) fn remove(&self, element: &Rc<T>) -> Result<(), ObserveError> {
        let removed = self.entries.borrow_mut().remove(&ElementKey::of(element));
        match removed {
            Some(entry) => {
                if let Err(message) = entry.release() {
                    tracing::warn!(property = %self.property, %message, "untracked element failed to release");
                }
                tracing::trace!(property = %self.property, tracked = self.len(), "element untracked");
                Ok(())
            }
            None if self.closed.get() => Ok(()),
            None => {
                tracing::warn!(property = %self.property, "removed element was never tracked");
                Err(ObserveError::UnknownElement {
                    property: self.property.clone(),
                })
            }
        }
    }

    /// Dispose every subscription and empty the map.
    ///
    /// Every release is attempted; panics are aggregated into
    /// [`ObserveError::Disposal`].
    pub(crate) fn remove_all(&self) -> Result<(), ObserveError> {
        let drained: Vec<Entry<T>> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        tracing::trace!(property = %self.property, released = drained.len(), "registry cleared");
        release_all(drained.into_iter().map(Entry::release))
    }

    /// Remove everything and refuse further entries.
    pub(crate) fn close(&self) -> Result<(), ObserveError> {
        self.closed.set(true);
        self.remove_all()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn contains(&self, element: &Rc<T>) -> bool {
        self.entries.borrow().contains_key(&ElementKey::of(element))
    }
}

// =============================================================================
// TESTS
// =============================================================================
