// ============================================================================
// spark-observe - Observers
// ============================================================================

use crate::core::error::ObserveError;

/// Receives values pushed by a stream.
///
/// A stream calls `on_next` zero or more times and `on_error` at most once.
/// Nothing is delivered after `on_error`.
///
/// Any `Fn(R)` closure is an observer that logs errors.
pub trait Observer<R> {
    fn on_next(&self, value: R);

    /// Terminal failure of the stream.
    fn on_error(&self, error: ObserveError) {
        tracing::error!(%error, "unhandled error in element property stream");
    }
}

impl<R, F> Observer<R> for F
where
    F: Fn(R),
{
    fn on_next(&self, value: R) {
        self(value)
    }
}

/// Observer built from a value callback and an error callback.
pub struct FnObserver<N, E> {
    next: N,
    error: E,
}

/// Build an observer that also handles the terminal error.
///
/// ```
/// use spark_observe::{observer, Observer, ObserveError};
///
/// let o = observer(|v: i32| println!("{v}"), |e: ObserveError| eprintln!("{e}"));
/// o.on_next(1);
/// ```
pub fn observer<R, N, E>(next: N, error: E) -> FnObserver<N, E>
where
    N: Fn(R),
    E: Fn(ObserveError),
{
    FnObserver { next, error }
}

impl<R, N, E> Observer<R> for FnObserver<N, E>
where
    N: Fn(R),
    E: Fn(ObserveError),
{
    fn on_next(&self, value: R) {
        (self.next)(value)
    }

    fn on_error(&self, error: ObserveError) {
        (self.error)(error)
    }
}
