// ============================================================================
// spark-observe - Element Property Observable
//
// One subscription over a collection, one stream of property changes for
// every element that is (or later becomes) a member.
// ============================================================================
//
// Lifecycle of an outward subscription:
//
//   Unsubscribed --subscribe--> Active --dispose / terminal error--> Disposed
//
// subscribe() registers the current snapshot, hooks the collection's change
// source, then delivers the eager values before it returns. Changes an
// observer makes while receiving them are routed like any other. Dispose
// releases every element adapter first, then the collection hook. A terminal
// error performs the same teardown before the observer hears about it.
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::collections::{CollectionChange, ObservableCollection};
use crate::core::error::{BoxError, ObserveError};
use crate::core::record::{ChangeRecord, PropertyName};
use crate::core::subscription::{merge_releases, CompositeSubscription};
use crate::notify::NotifyPropertyChanged;

use super::adapter::{accessor, try_accessor, Accessor};
use super::observer::Observer;
use super::router::{CollectionChangeRouter, ElementSink};

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for an element property stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Push each element's current value as soon as it gains a tracked
    /// subscription: at subscribe time, on add, on replace, and after a reset.
    pub push_current_value_on_subscribe: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            push_current_value_on_subscribe: true,
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// State of an outward subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Active,
    /// Terminal. Reached by dispose or by a terminal error.
    Disposed,
}

// =============================================================================
// STREAM CORE
// =============================================================================

struct StreamCore<T, V> {
    state: Cell<SubscriptionState>,
    property: PropertyName,
    observer: Box<dyn Observer<ChangeRecord<T, V>>>,
    router: CollectionChangeRouter<T, V>,
    hooks: CompositeSubscription,
}

impl<T, V> StreamCore<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    fn is_active(&self) -> bool {
        self.state.get() == SubscriptionState::Active
    }

    fn on_collection_change(&self, change: &CollectionChange<T>) {
        if !self.is_active() {
            return;
        }
        if let Err(error) = self.router.route(change) {
            self.fail(error);
        }
    }

    /// Release adapters, then the collection hook.
    ///
    /// Both steps always run; failures of either are merged.
    fn teardown(&self) -> Result<(), ObserveError> {
        let adapters = self.router.close();
        let hooks = self.hooks.dispose();
        merge_releases([adapters, hooks])
    }

    fn dispose(&self) -> Result<(), ObserveError> {
        if self.state.replace(SubscriptionState::Disposed) == SubscriptionState::Disposed {
            return Ok(());
        }
        tracing::debug!(property = %self.property, tracked = self.router.tracked_count(), "disposing element property stream");
        self.teardown()
    }
}

impl<T, V> ElementSink<T, V> for StreamCore<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    fn element_value(&self, instance: Rc<T>, value: V) {
        if !self.is_active() {
            return;
        }
        tracing::trace!(property = %self.property, "forwarding change record");
        self.observer
            .on_next(ChangeRecord::new(instance, self.property.clone(), value));
    }

    fn fail(&self, error: ObserveError) {
        if !self.is_active() {
            tracing::debug!(property = %self.property, %error, "error after termination ignored");
            return;
        }
        self.state.set(SubscriptionState::Disposed);
        tracing::warn!(property = %self.property, %error, "element property stream failed");

        if let Err(cleanup) = self.teardown() {
            tracing::warn!(property = %self.property, error = %cleanup, "cleanup after failure was incomplete");
        }
        self.observer.on_error(error);
    }
}

// =============================================================================
// SUBSCRIPTION HANDLE
// =============================================================================

/// Handle to an active element property stream.
///
/// Dropping the handle disposes the stream.
#[must_use = "dropping an ElementPropertySubscription immediately disposes it"]
pub struct ElementPropertySubscription<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    core: Rc<StreamCore<T, V>>,
}

impl<T, V> ElementPropertySubscription<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    /// Release every element subscription and the collection hook.
    ///
    /// Idempotent: later calls do nothing and return `Ok`. Every release is
    /// attempted; failing ones are reported together as
    /// [`ObserveError::Disposal`].
    pub fn dispose(&self) -> Result<(), ObserveError> {
        self.core.dispose()
    }

    pub fn state(&self) -> SubscriptionState {
        self.core.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == SubscriptionState::Disposed
    }

    /// Number of elements with a live tracked subscription.
    pub fn tracked_count(&self) -> usize {
        self.core.router.tracked_count()
    }

    /// Whether `element` (by identity) currently has a tracked subscription.
    pub fn is_tracking(&self, element: &Rc<T>) -> bool {
        self.core.router.is_tracking(element)
    }

    pub fn property_name(&self) -> &PropertyName {
        &self.core.property
    }
}

impl<T, V> Drop for ElementPropertySubscription<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    fn drop(&mut self) {
        if let Err(error) = self.core.dispose() {
            tracing::warn!(%error, "element property stream dropped with failed releases");
        }
    }
}

impl<T, V> fmt::Debug for ElementPropertySubscription<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementPropertySubscription")
            .field("property", &self.core.property)
            .field("state", &self.state())
            .field("tracked", &self.tracked_count())
            .finish()
    }
}

// =============================================================================
// OBSERVABLE
// =============================================================================

/// A cold stream of [`ChangeRecord`]s for one property of every element of
/// a collection.
///
/// Nothing is attached until [`ElementPropertyObservable::subscribe`]; every
/// call creates an independent stream.
pub struct ElementPropertyObservable<C, V>
where
    C: ObservableCollection,
{
    collection: Rc<C>,
    read: Accessor<C::Item, V>,
    property: PropertyName,
    options: ObserveOptions,
}

impl<C, V> ElementPropertyObservable<C, V>
where
    C: ObservableCollection,
    C::Item: NotifyPropertyChanged,
    V: 'static,
{
    pub fn new(collection: &Rc<C>, property: impl Into<PropertyName>, read: Accessor<C::Item, V>) -> Self {
        Self {
            collection: collection.clone(),
            read,
            property: property.into(),
            options: ObserveOptions::default(),
        }
    }

    /// Whether each element's current value is pushed when it becomes tracked.
    ///
    /// Defaults to `true`.
    pub fn push_current_value_on_subscribe(mut self, push: bool) -> Self {
        self.options.push_current_value_on_subscribe = push;
        self
    }

    pub fn with_options(mut self, options: ObserveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ObserveOptions {
        self.options
    }

    pub fn property_name(&self) -> &PropertyName {
        &self.property
    }

    /// Start the stream.
    ///
    /// Every element already in the collection is tracked before this
    /// returns; with the eager push enabled the observer has already
    /// received one record per element still tracked, in collection order.
    /// If tracking fails, the observer's `on_error` has been called and the
    /// returned handle is already disposed.
    pub fn subscribe<O>(&self, observer: O) -> ElementPropertySubscription<C::Item, V>
    where
        O: Observer<ChangeRecord<C::Item, V>> + 'static,
    {
        let weak_collection = Rc::downgrade(&self.collection);
        let core = Rc::new_cyclic(|weak_core: &Weak<StreamCore<C::Item, V>>| {
            let sink: Weak<dyn ElementSink<C::Item, V>> = weak_core.clone();
            StreamCore {
                state: Cell::new(SubscriptionState::Unsubscribed),
                property: self.property.clone(),
                observer: Box::new(observer),
                router: CollectionChangeRouter::new(
                    Box::new(move || {
                        weak_collection
                            .upgrade()
                            .map(|collection| collection.snapshot())
                            .unwrap_or_default()
                    }),
                    self.read.clone(),
                    self.property.clone(),
                    self.options.push_current_value_on_subscribe,
                    sink,
                ),
                hooks: CompositeSubscription::new(),
            }
        });

        core.state.set(SubscriptionState::Active);

        let pending = match core.router.register_snapshot() {
            Ok(pending) => Some(pending),
            Err(error) => {
                core.fail(error);
                None
            }
        };

        if core.is_active() {
            let hook = self.collection.collection_changed().subscribe({
                let weak_core = Rc::downgrade(&core);
                move |change: &CollectionChange<C::Item>| {
                    if let Some(core) = weak_core.upgrade() {
                        core.on_collection_change(change);
                    }
                }
            });
            core.hooks.add(hook);
            tracing::debug!(property = %self.property, tracked = core.router.tracked_count(), "element property stream active");
        }

        if let Some(pending) = pending {
            pending.deliver();
        }

        ElementPropertySubscription { core }
    }
}

impl<C, V> fmt::Debug for ElementPropertyObservable<C, V>
where
    C: ObservableCollection,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementPropertyObservable")
            .field("property", &self.property)
            .field("options", &self.options)
            .finish()
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Observe `property` on every element of `collection`.
///
/// `read` is called on each matching change (and for the eager push) to get
/// the live value.
///
/// # Example
///
/// ```
/// use std::cell::{Cell, RefCell};
/// use std::rc::Rc;
/// use spark_observe::{
///     observe_element_property, EventSource, NotifyPropertyChanged, ObservableVec,
///     PropertyChanged, PropertyChangedSource,
/// };
///
/// struct Person {
///     age: Cell<u32>,
///     changed: PropertyChangedSource,
/// }
///
/// impl Person {
///     fn new(age: u32) -> Self {
///         Self { age: Cell::new(age), changed: PropertyChangedSource::new() }
///     }
///     fn age(&self) -> u32 {
///         self.age.get()
///     }
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
///
/// let people = Rc::new(ObservableVec::from_vec(vec![Person::new(10)]));
/// let ages = Rc::new(RefCell::new(Vec::new()));
///
/// let sub = observe_element_property(&people, "age", Person::age).subscribe({
///     let ages = ages.clone();
///     move |record: spark_observe::ChangeRecord<Person, u32>| ages.borrow_mut().push(*record.value())
/// });
///
/// let bob = people.push(Person::new(20));
/// bob.birthday();
/// assert_eq!(*ages.borrow(), vec![10, 20, 21]);
///
/// sub.dispose().unwrap();
/// bob.birthday();
/// assert_eq!(ages.borrow().len(), 3);
/// ```
pub fn observe_element_property<C, V, F>(
    collection: &Rc<C>,
    property: impl Into<PropertyName>,
    read: F,
) -> ElementPropertyObservable<C, V>
where
    C: ObservableCollection,
    C::Item: NotifyPropertyChanged,
    V: 'static,
    F: Fn(&C::Item) -> V + 'static,
{
    ElementPropertyObservable::new(collection, property, accessor(read))
}

/// Like [`observe_element_property`] with a fallible accessor.
///
/// An accessor error terminates the stream with [`ObserveError::Accessor`]
/// after every subscription has been released.
pub fn try_observe_element_property<C, V, E, F>(
    collection: &Rc<C>,
    property: impl Into<PropertyName>,
    read: F,
) -> ElementPropertyObservable<C, V>
where
    C: ObservableCollection,
    C::Item: NotifyPropertyChanged,
    V: 'static,
    E: Into<BoxError>,
    F: Fn(&C::Item) -> Result<V, E> + 'static,
{
    ElementPropertyObservable::new(collection, property, try_accessor(read))
}
