// ============================================================================
// spark-observe - Subscriptions
//
// Disposable handles for attached listeners.
// ============================================================================
//
// A Subscription owns a single teardown closure. Disposing it runs the
// teardown exactly once; dropping an undisposed subscription disposes it.
//
// CompositeSubscription groups several handles so they can be released
// together. Release is best-effort: a panicking teardown is caught, the
// remaining teardowns still run, and the failures are reported together.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::error::ObserveError;

/// Teardown closure run when a subscription is disposed.
type DisposeFn = Box<dyn FnOnce()>;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle to an attached listener.
///
/// `dispose` is idempotent. Dropping the handle disposes it.
#[must_use = "dropping a Subscription immediately detaches it"]
pub struct Subscription {
    teardown: RefCell<Option<DisposeFn>>,
    disposed: Cell<bool>,
}

impl Subscription {
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            teardown: RefCell::new(Some(Box::new(teardown))),
            disposed: Cell::new(false),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self {
            teardown: RefCell::new(None),
            disposed: Cell::new(false),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Run the teardown if it has not run yet.
    ///
    /// A panic inside the teardown propagates; use [`Subscription::try_dispose`]
    /// to catch it.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        // Take before calling so the teardown may touch this handle.
        let teardown = self.teardown.borrow_mut().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Like [`Subscription::dispose`], but a panicking teardown is caught and
    /// returned as its panic message.
    pub fn try_dispose(&self) -> Result<(), String> {
        catch_release(|| self.dispose())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.disposed.get() {
            // Never unwind out of drop.
            if let Err(message) = self.try_dispose() {
                tracing::warn!(%message, "subscription teardown panicked during drop");
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

// =============================================================================
// COMPOSITE SUBSCRIPTION
// =============================================================================

/// A group of subscriptions released together.
#[derive(Default)]
pub struct CompositeSubscription {
    items: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to the group.
    ///
    /// If the group is already disposed, the subscription is disposed at once.
    pub fn add(&self, subscription: Subscription) {
        if self.disposed.get() {
            subscription.dispose();
            return;
        }
        self.items.borrow_mut().push(subscription);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Release every held subscription, in insertion order.
    ///
    /// All releases are attempted even if some panic. Idempotent.
    pub fn dispose(&self) -> Result<(), ObserveError> {
        if self.disposed.replace(true) {
            return Ok(());
        }
        let items: Vec<_> = self.items.borrow_mut().drain(..).collect();
        release_all(items.iter().map(Subscription::try_dispose))
    }
}

impl fmt::Debug for CompositeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSubscription")
            .field("len", &self.len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Run `release`, turning a panic into its message.
pub(crate) fn catch_release<F: FnOnce()>(release: F) -> Result<(), String> {
    catch_unwind(AssertUnwindSafe(release)).map_err(panic_message)
}

/// Drive every release to completion, collecting failures instead of
/// stopping at the first one.
pub(crate) fn release_all<I>(releases: I) -> Result<(), ObserveError>
where
    I: IntoIterator<Item = Result<(), String>>,
{
    let failures: Vec<String> = releases.into_iter().filter_map(Result::err).collect();
    if !failures.is_empty() {
        tracing::warn!(failed = failures.len(), "subscriptions failed to release");
    }
    disposal(failures)
}

/// Combine the outcomes of several already-attempted group releases.
pub(crate) fn merge_releases<I>(outcomes: I) -> Result<(), ObserveError>
where
    I: IntoIterator<Item = Result<(), ObserveError>>,
{
    disposal(
        outcomes
            .into_iter()
            .filter_map(Result::err)
            .flat_map(ObserveError::into_failures)
            .collect(),
    )
}

fn disposal(failures: Vec<String>) -> Result<(), ObserveError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(ObserveError::Disposal { failures })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
