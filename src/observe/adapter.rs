// ============================================================================
// spark-observe - Property Change Adapter
//
// Turns one element's raw "property changed" events into a stream of
// fresh values for one tracked property.
// ============================================================================
//
// Every passing event re-reads the property through the accessor; the raw
// event never carries a value. An event passes when it names the tracked
// property or names nothing (wildcard).
//
// The eager first value is governed by a flag owned by the adapter itself,
// so every adapter (one per element per tracking lifetime) gets its own.
// ============================================================================

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::core::error::{BoxError, ObserveError};
use crate::core::record::PropertyName;
use crate::core::subscription::Subscription;
use crate::notify::{NotifyPropertyChanged, PropertyChanged};

use super::observer::Observer;

/// Shared, fallible property accessor.
pub type Accessor<T, V> = Rc<dyn Fn(&T) -> Result<V, BoxError>>;

/// Wrap an infallible getter as an [`Accessor`].
pub fn accessor<T, V, F>(read: F) -> Accessor<T, V>
where
    F: Fn(&T) -> V + 'static,
{
    Rc::new(move |instance: &T| Ok(read(instance)))
}

/// Wrap a fallible getter as an [`Accessor`].
pub fn try_accessor<T, V, E, F>(read: F) -> Accessor<T, V>
where
    F: Fn(&T) -> Result<V, E> + 'static,
    E: Into<BoxError>,
{
    Rc::new(move |instance: &T| read(instance).map_err(Into::into))
}

// =============================================================================
// PROPERTY ADAPTER
// =============================================================================

pub(crate) struct PropertyAdapter<T, V> {
    instance: Weak<T>,
    read: Accessor<T, V>,
    tracked: PropertyName,
    /// Set while the eager first value is still owed.
    first: Cell<bool>,
    sink: Rc<dyn Observer<V>>,
}

impl<T, V> PropertyAdapter<T, V>
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    /// Attach to `instance` without pushing anything yet.
    ///
    /// The caller decides when the eager value goes out by calling
    /// [`PropertyAdapter::push_initial`]. Once the returned subscription is
    /// disposed the adapter owes nothing, so a late `push_initial` is a no-op.
    pub(crate) fn attach(
        instance: &Rc<T>,
        read: Accessor<T, V>,
        tracked: PropertyName,
        push_initial: bool,
        sink: Rc<dyn Observer<V>>,
    ) -> (Subscription, Rc<Self>) {
        let adapter = Rc::new(Self {
            instance: Rc::downgrade(instance),
            read,
            tracked,
            first: Cell::new(push_initial),
            sink,
        });

        let listener = instance.property_changed().subscribe({
            let adapter = adapter.clone();
            move |event: &PropertyChanged| adapter.on_raw_event(event)
        });
        let subscription = Subscription::new({
            let adapter = Rc::downgrade(&adapter);
            move || {
                if let Some(adapter) = adapter.upgrade() {
                    adapter.first.set(false);
                }
                listener.dispose();
            }
        });

        (subscription, adapter)
    }

    /// Emit the current value if the eager push is still owed.
    ///
    /// Does nothing on every call after the first.
    pub(crate) fn push_initial(&self) {
        if self.first.replace(false) {
            self.emit();
        }
    }

    fn on_raw_event(&self, event: &PropertyChanged) {
        if self.tracked.matches(event.name()) {
            // An event-driven value settles any pending eager push.
            self.first.set(false);
            self.emit();
        }
    }

    fn emit(&self) {
        let Some(instance) = self.instance.upgrade() else {
            return;
        };
        match (self.read)(&instance) {
            Ok(value) => self.sink.on_next(value),
            Err(source) => self.sink.on_error(ObserveError::Accessor {
                property: self.tracked.clone(),
                source,
            }),
        }
    }
}

/// Observe one named property of a single element.
///
/// Values matching `tracked` (or wildcard events) are re-read through `read`
/// and pushed to `sink`. With `push_initial`, the current value is pushed
/// before this function returns. Accessor failures go to `sink.on_error`.
///
/// Disposing the returned subscription detaches from the element.
pub fn observe_property<T, V>(
    instance: &Rc<T>,
    read: Accessor<T, V>,
    tracked: impl Into<PropertyName>,
    push_initial: bool,
    sink: Rc<dyn Observer<V>>,
) -> Subscription
where
    T: NotifyPropertyChanged,
    V: 'static,
{
    let (subscription, adapter) =
        PropertyAdapter::attach(instance, read, tracked.into(), push_initial, sink);
    adapter.push_initial();
    subscription
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::EventSource;
    use crate::notify::PropertyChangedSource;
    use std::cell::RefCell;

    struct Item {
        count: Cell<i32>,
        label: RefCell<String>,
        changed: PropertyChangedSource,
    }

    impl Item {
        fn new(count: i32) -> Rc<Self> {
            Rc::new(Self {
                count: Cell::new(count),
                label: RefCell::new(String::new()),
                changed: PropertyChangedSource::new(),
            })
        }

        fn set_count(&self, count: i32) {
            self.count.set(count);
            self.changed.notify("count");
        }

        fn set_label(&self, label: &str) {
            *self.label.borrow_mut() = label.to_string();
            self.changed.notify("label");
        }
    }

    impl NotifyPropertyChanged for Item {
        fn property_changed(&self) -> &EventSource<PropertyChanged> {
            self.changed.source()
        }
    }

    fn collect() -> (Rc<RefCell<Vec<i32>>>, Rc<dyn Observer<i32>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink: Rc<dyn Observer<i32>> = Rc::new({
            let seen = seen.clone();
            move |v: i32| seen.borrow_mut().push(v)
        });
        (seen, sink)
    }

    #[test]
    fn pushes_initial_value_first() {
        let item = Item::new(5);
        let (seen, sink) = collect();

        let _sub = observe_property(&item, accessor(|i: &Item| i.count.get()), "count", true, sink);
        assert_eq!(*seen.borrow(), vec![5]);

        item.set_count(6);
        assert_eq!(*seen.borrow(), vec![5, 6]);
    }

    #[test]
    fn no_initial_value_when_disabled() {
        let item = Item::new(5);
        let (seen, sink) = collect();

        let _sub = observe_property(&item, accessor(|i: &Item| i.count.get()), "count", false, sink);
        assert!(seen.borrow().is_empty());

        item.set_count(7);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn filters_other_properties_but_passes_wildcard() {
        let item = Item::new(1);
        let (seen, sink) = collect();

        let _sub = observe_property(&item, accessor(|i: &Item| i.count.get()), "count", false, sink);

        item.set_label("ignored");
        assert!(seen.borrow().is_empty());
        assert_eq!(*item.label.borrow(), "ignored");

        // Silent mutation followed by a wildcard: value is read live.
        item.count.set(42);
        item.changed.notify_all();
        item.changed.notify("");
        assert_eq!(*seen.borrow(), vec![42, 42]);
    }

    #[test]
    fn dispose_detaches_from_element() {
        let item = Item::new(1);
        let (seen, sink) = collect();

        let sub = observe_property(&item, accessor(|i: &Item| i.count.get()), "count", false, sink);
        assert_eq!(item.changed.listener_count(), 1);

        sub.dispose();
        sub.dispose();
        assert_eq!(item.changed.listener_count(), 0);

        item.set_count(2);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn initial_push_is_owed_once() {
        let item = Item::new(3);
        let (seen, sink) = collect();

        let (_sub, adapter) = PropertyAdapter::attach(
            &item,
            accessor(|i: &Item| i.count.get()),
            PropertyName::from("count"),
            true,
            sink,
        );
        adapter.push_initial();
        adapter.push_initial();
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn each_adapter_owns_its_first_flag() {
        let a = Item::new(1);
        let b = Item::new(2);
        let (seen, sink) = collect();
        let read = accessor(|i: &Item| i.count.get());

        let _sa = observe_property(&a, read.clone(), "count", true, sink.clone());
        let _sb = observe_property(&b, read, "count", true, sink);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn accessor_failure_reaches_error_channel() {
        let item = Item::new(-1);
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink: Rc<dyn Observer<i32>> = Rc::new(crate::observe::observer::observer(
            |_: i32| panic!("no value expected"),
            {
                let errors = errors.clone();
                move |e: ObserveError| errors.borrow_mut().push(e.to_string())
            },
        ));

        let read = try_accessor(|i: &Item| {
            let count = i.count.get();
            if count < 0 { Err("negative count") } else { Ok(count) }
        });
        let _sub = observe_property(&item, read, "count", true, sink);

        assert_eq!(
            *errors.borrow(),
            vec!["failed to read property \"count\": negative count".to_string()]
        );
    }

    #[test]
    fn detached_adapter_skips_pending_push() {
        let item = Item::new(3);
        let (seen, sink) = collect();
        let read: Accessor<Item, i32> = accessor(|item: &Item| item.count.get());

        let (subscription, adapter) = PropertyAdapter::attach(&item, read, "count".into(), true, sink);
        subscription.dispose();
        adapter.push_initial();

        assert!(seen.borrow().is_empty());
        assert_eq!(item.changed.listener_count(), 0);
    }
}
