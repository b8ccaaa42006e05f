//! Source trait and the cold iterator source.

use crate::types::{Disposable, Observer};

/// A push-based emitter of `T` values that may terminate with an `E`.
pub trait Source<T, E> {
    /// Handle returned by [`Source::subscribe`]; disposing it detaches the
    /// observer.
    type Subscription: Disposable + Send + Sync + 'static;

    /// Attach an observer. The source may start emitting before this
    /// returns.
    fn subscribe(&self, observer: Observer<T, E>) -> Self::Subscription;
}

impl<S, T, E> Source<T, E> for &S
where
    S: Source<T, E> + ?Sized,
{
    type Subscription = S::Subscription;

    fn subscribe(&self, observer: Observer<T, E>) -> Self::Subscription {
        (**self).subscribe(observer)
    }
}

/// Subscription for sources that are finished by the time `subscribe`
/// returns. Disposing it does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSubscription;

impl Disposable for NoopSubscription {
    fn dispose(&self) {}
}

/// Cold source: every subscriber receives every item of a fresh clone of the
/// iterator, synchronously inside `subscribe`, followed by completion.
#[derive(Clone, Debug)]
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I> {
    pub fn new<C>(items: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: items.into_iter(),
        }
    }
}

impl<I, E> Source<I::Item, E> for IterSource<I>
where
    I: Iterator + Clone,
{
    type Subscription = NoopSubscription;

    fn subscribe(&self, observer: Observer<I::Item, E>) -> NoopSubscription {
        for item in self.iter.clone() {
            observer.on_next(item);
        }
        observer.on_completed();
        NoopSubscription
    }
}
