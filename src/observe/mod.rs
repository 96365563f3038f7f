// ============================================================================
// spark-observe - Element Property Observation
// ============================================================================
//
// Leaves first:
//
// 1. adapter:  one element's raw change events -> fresh values of one property
// 2. registry: element identity -> its adapter subscription
// 3. router:   collection membership changes -> registry create/destroy
// 4. element:  public entry point, one outward stream of ChangeRecords
// ============================================================================

pub mod adapter;
pub mod element;
pub mod observer;
mod registry;
mod router;

pub use adapter::{accessor, observe_property, try_accessor, Accessor};
pub use element::{
    observe_element_property, try_observe_element_property, ElementPropertyObservable,
    ElementPropertySubscription, ObserveOptions, SubscriptionState,
};
pub use observer::{observer, FnObserver, Observer};
