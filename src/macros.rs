// ============================================================================
// spark-observe - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// This reduces the boilerplate of manually cloning `Rc` handles before
/// moving them into an observer or listener.
///
/// # Usage
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use spark_observe::{cloned, EventSource};
///
/// let source = EventSource::<i32>::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let _sub = source.subscribe(cloned!(seen => move |v: &i32| seen.borrow_mut().push(*v)));
/// source.emit(&3);
/// assert_eq!(*seen.borrow(), vec![3]);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Observe a property on every element, naming it after its getter.
///
/// The property name is taken from the getter identifier at compile time,
/// so it always matches the name the element announces as long as the
/// element uses the same identifier when it notifies.
///
/// # Usage
///
/// ```rust,ignore
/// // Getter method: tracks "age", reads with `person.age()`
/// let stream = observe_element_property!(people, age);
///
/// // Custom read: tracks "age", reads with the given closure
/// let stream = observe_element_property!(people, age => |p| p.age.get() * 12);
/// ```
///
/// Both forms expand to [`observe_element_property`](crate::observe_element_property).
#[macro_export]
macro_rules! observe_element_property {
    // Case 1: Getter with the same name as the property
    ($collection:expr, $property:ident) => {
        $crate::observe_element_property(&$collection, stringify!($property), |element| {
            element.$property()
        })
    };
    // Case 2: Explicit read
    ($collection:expr, $property:ident => $read:expr) => {
        $crate::observe_element_property(&$collection, stringify!($property), $read)
    };
}
