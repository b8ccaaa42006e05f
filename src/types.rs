//! Core types shared by sources, channels and the bridge.

use std::fmt;

/// A handle that releases a resource when disposed.
///
/// Implementations must tolerate `dispose` being called more than once and
/// from any thread.
pub trait Disposable {
    fn dispose(&self);
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&self) {
        (**self).dispose()
    }
}

impl<D: Disposable + ?Sized> Disposable for std::sync::Arc<D> {
    fn dispose(&self) {
        (**self).dispose()
    }
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type OnNext<T> = Box<dyn Fn(T) + Send + Sync>;
type OnError<E> = Box<dyn Fn(E) + Send + Sync>;
type OnCompleted = Box<dyn Fn() + Send + Sync>;

/// The three reactions a source delivers to.
///
/// A well-behaved source calls `on_next` any number of times followed by at
/// most one of `on_error` or `on_completed`.
pub struct Observer<T, E> {
    on_next: OnNext<T>,
    on_error: OnError<E>,
    on_completed: OnCompleted,
}

impl<T, E> Observer<T, E> {
    pub fn new<N, R, C>(on_next: N, on_error: R, on_completed: C) -> Self
    where
        N: Fn(T) + Send + Sync + 'static,
        R: Fn(E) + Send + Sync + 'static,
        C: Fn() + Send + Sync + 'static,
    {
        Self {
            on_next: Box::new(on_next),
            on_error: Box::new(on_error),
            on_completed: Box::new(on_completed),
        }
    }

    pub fn on_next(&self, value: T) {
        (self.on_next)(value)
    }

    pub fn on_error(&self, error: E) {
        (self.on_error)(error)
    }

    pub fn on_completed(&self) {
        (self.on_completed)()
    }
}

impl<T, E> fmt::Debug for Observer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}
