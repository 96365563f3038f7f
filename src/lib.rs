// ============================================================================
// spark-observe - Element Property Observation for Rust
// ============================================================================
//
// Subscribe once to an observable collection and receive one stream of
// property changes for every element currently (and later) in it.
// Per-element subscriptions are created and released automatically as the
// collection's membership changes.
// ============================================================================

#[macro_use]
mod macros;

pub mod collections;
pub mod core;
pub mod notify;
pub mod observe;

// Re-export core items at crate root for ergonomic access
pub use core::error::{BoxError, ObserveError};
pub use core::event::{EventSource, ListenerId};
pub use core::record::{ChangeRecord, ElementKey, PropertyName};
pub use core::subscription::{CompositeSubscription, Subscription};

// Collaborator contracts and reference implementations
pub use collections::{ChangeKind, CollectionChange, ObservableCollection, ObservableVec};
pub use notify::{NotifyPropertyChanged, PropertyChanged, PropertyChangedSource};

// Observation entry points
pub use observe::{
    accessor, observe_element_property, observe_property, observer, try_accessor,
    try_observe_element_property, Accessor, ElementPropertyObservable,
    ElementPropertySubscription, FnObserver, ObserveOptions, Observer, SubscriptionState,
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // =========================================================================
    // Fixtures
    // =========================================================================

    struct Person {
        name: &'static str,
        age: Cell<u32>,
        changed: PropertyChangedSource,
    }

    impl Person {
        fn new(name: &'static str, age: u32) -> Person {
            Person {
                name,
                age: Cell::new(age),
                changed: PropertyChangedSource::new(),
            }
        }

        fn age(&self) -> u32 {
            self.age.get()
        }

        fn aging(&self) {
            self.age.set(self.age.get() + 1);
            self.changed.notify("age");
        }

        fn rename_silently(&self) {
            self.changed.notify("name");
        }
    }

    impl NotifyPropertyChanged for Person {
        fn property_changed(&self) -> &EventSource<PropertyChanged> {
            self.changed.source()
        }
    }

    type Log = Rc<RefCell<Vec<(&'static str, u32)>>>;

    fn logger(log: &Log) -> impl Fn(ChangeRecord<Person, u32>) + 'static {
        let log = log.clone();
        move |record| log.borrow_mut().push((record.instance().name, *record.value()))
    }

    // =========================================================================
    // End-to-end
    // =========================================================================

    #[test]
    fn end_to_end_membership_walkthrough() {
        let p1 = Rc::new(Person::new("p1", 10));
        let people = Rc::new(ObservableVec::from_rcs(vec![p1.clone()]));
        let log: Log = Rc::default();

        let sub = observe_element_property(&people, "age", Person::age).subscribe(logger(&log));
        assert_eq!(*log.borrow(), vec![("p1", 10)]);

        let p2 = people.push(Person::new("p2", 20));
        assert_eq!(log.borrow().last(), Some(&("p2", 20)));

        p1.aging();
        assert_eq!(log.borrow().last(), Some(&("p1", 11)));

        assert!(people.remove_item(&p1));
        p1.aging();
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(p1.changed.listener_count(), 0);

        people.set(0, Rc::new(Person::new("p3", 30)));
        assert_eq!(log.borrow().last(), Some(&("p3", 30)));
        assert_eq!(p2.changed.listener_count(), 0);
        p2.aging();
        assert_eq!(log.borrow().len(), 4);

        people.clear();
        assert_eq!(sub.tracked_count(), 0);
        assert_eq!(log.borrow().len(), 4);

        people.push(Person::new("p4", 40));
        assert_eq!(log.borrow().last(), Some(&("p4", 40)));
        assert_eq!(sub.tracked_count(), 1);
    }

    #[test]
    fn unrelated_property_changes_are_ignored() {
        let people = Rc::new(ObservableVec::from_vec(vec![Person::new("a", 1)]));
        let log: Log = Rc::default();
        let _sub = observe_element_property(&people, "age", Person::age)
            .push_current_value_on_subscribe(false)
            .subscribe(logger(&log));

        people.get(0).unwrap().rename_silently();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn macro_derives_property_name_from_getter() {
        let people = Rc::new(ObservableVec::from_vec(vec![Person::new("a", 1)]));
        let log: Log = Rc::default();

        let stream = observe_element_property!(people, age);
        assert_eq!(stream.property_name(), "age");
        let _sub = stream.subscribe(logger(&log));

        people.get(0).unwrap().aging();
        assert_eq!(*log.borrow(), vec![("a", 1), ("a", 2)]);

        let doubled = observe_element_property!(people, age => |p: &Person| p.age() * 2);
        let count = Rc::new(Cell::new(0));
        let _sub2 = doubled.subscribe(cloned!(count => move |r: ChangeRecord<Person, u32>| {
            assert_eq!(*r.value(), 4);
            count.set(count.get() + 1);
        }));
        assert_eq!(count.get(), 1);
    }
}
