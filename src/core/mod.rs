// ============================================================================
// spark-observe - Core Module
// Records, identity, events, subscriptions, and errors
// ============================================================================

pub mod error;
pub mod event;
pub mod record;
pub mod subscription;

pub use error::{BoxError, ObserveError};
pub use event::{EventSource, ListenerId};
pub use record::{ChangeRecord, ElementKey, PropertyName};
pub use subscription::{CompositeSubscription, Subscription};
