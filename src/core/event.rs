// ============================================================================
// spark-observe - Event Source
// A single-threaded typed pub/sub primitive
// ============================================================================
//
// Listeners are stored as `Rc<Listener>` so snapshots are cheap.
// Snapshot-on-emit semantics:
//   - A listener added during emission is NOT called until the next emit.
//   - A listener removed during emission is skipped for the rest of the
//     round, so disposing a subscription from inside a callback takes
//     effect immediately.
//
// No borrow is held while callbacks run, so callbacks may call
// on()/off()/emit() on the same source.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::subscription::Subscription;

/// Identifier returned by [`EventSource::on`].
pub type ListenerId = u64;

/// Closure type for event listeners.
type ListenerFn<A> = dyn Fn(&A);

struct Listener<A> {
    id: ListenerId,
    active: Cell<bool>,
    callback: Box<ListenerFn<A>>,
}

struct Listeners<A> {
    listeners: RefCell<Vec<Rc<Listener<A>>>>,
    next_id: Cell<ListenerId>,
}

/// Typed synchronous event source.
///
/// `A` is the event payload type. All methods take `&self`.
pub struct EventSource<A> {
    registry: Rc<Listeners<A>>,
}

impl<A: 'static> EventSource<A> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Listeners {
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Register `callback` and return its [`ListenerId`].
    pub fn on(&self, callback: impl Fn(&A) + 'static) -> ListenerId {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry.listeners.borrow_mut().push(Rc::new(Listener {
            id,
            active: Cell::new(true),
            callback: Box::new(callback),
        }));
        id
    }

    /// Remove the listener identified by `id`.
    ///
    /// Does nothing if `id` is not present.
    pub fn off(&self, id: ListenerId) {
        remove_listener(&self.registry, id);
    }

    /// Register `callback` and return a [`Subscription`] that removes it.
    ///
    /// The subscription only holds a weak handle, so it never keeps the
    /// source alive, and disposing it after the source is gone is a no-op.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let id = self.on(callback);
        let registry: Weak<Listeners<A>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                remove_listener(&registry, id);
            }
        })
    }

    /// Emit `event` to all currently registered listeners, in registration order.
    pub fn emit(&self, event: &A) {
        let snapshot: Vec<Rc<Listener<A>>> = self.registry.listeners.borrow().clone();
        for listener in snapshot {
            if listener.active.get() {
                (listener.callback)(event);
            }
        }
    }

    /// Number of currently registered listeners.
    pub fn len(&self) -> usize {
        self.registry.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_listener<A>(registry: &Listeners<A>, id: ListenerId) {
    let removed = {
        let mut listeners = registry.listeners.borrow_mut();
        listeners
            .iter()
            .position(|listener| listener.id == id)
            .map(|index| listeners.remove(index))
    };
    // Dropped after the borrow ends: the callback's captures may reach back here.
    if let Some(listener) = removed {
        listener.active.set(false);
    }
}

impl<A: 'static> Default for EventSource<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for EventSource<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("listeners", &self.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
