//! Multicast subject: fans values out to every live observer.

use crate::types::{Disposable, Observer, SubscriptionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::types::Source;

/// How the subject terminated.
#[derive(Clone, Debug)]
enum Terminal<E> {
    Completed,
    Failed(E),
}

struct Observers<T, E> {
    /// Live observers by ID.
    active: HashMap<SubscriptionId, Arc<Observer<T, E>>>,
    /// Set once `error` or `complete` has been called.
    terminal: Option<Terminal<E>>,
}

struct Inner<T, E> {
    observers: RwLock<Observers<T, E>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

/// A hot source that pushes values to every subscribed observer.
///
/// Emission takes a snapshot of the observers before calling them, so an
/// observer may dispose its own (or any other) subscription from inside a
/// callback without deadlocking.
pub struct Subject<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Subject<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Subject<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Create a new subject with no observers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                observers: RwLock::new(Observers {
                    active: HashMap::new(),
                    terminal: None,
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Push a value to all observers. Ignored once the subject has
    /// terminated.
    pub fn next(&self, value: T) {
        for observer in self.snapshot() {
            observer.on_next(value.clone());
        }
    }

    /// Terminate all observers with an error.
    pub fn error(&self, error: E) {
        for observer in self.stop(Terminal::Failed(error.clone())) {
            observer.on_error(error.clone());
        }
    }

    /// Terminate all observers cleanly.
    pub fn complete(&self) {
        for observer in self.stop(Terminal::Completed) {
            observer.on_completed();
        }
    }

    /// Get the number of live observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().active.len()
    }

    /// Whether `error` or `complete` has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.observers.read().terminal.is_some()
    }

    fn snapshot(&self) -> Vec<Arc<Observer<T, E>>> {
        let observers = self.inner.observers.read();
        if observers.terminal.is_some() {
            return Vec::new();
        }
        observers.active.values().cloned().collect()
    }

    /// Record the terminal signal and detach every observer. Returns the
    /// observers that still need to be notified.
    fn stop(&self, terminal: Terminal<E>) -> Vec<Arc<Observer<T, E>>> {
        let mut observers = self.inner.observers.write();
        if observers.terminal.is_some() {
            return Vec::new();
        }
        observers.terminal = Some(terminal);
        observers.active.drain().map(|(_, o)| o).collect()
    }
}

impl<T, E> Default for Subject<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Source<T, E> for Subject<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Subscription = SubjectSubscription;

    fn subscribe(&self, observer: Observer<T, E>) -> SubjectSubscription {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));

        let terminal = {
            let mut observers = self.inner.observers.write();
            match observers.terminal.clone() {
                None => {
                    observers.active.insert(id, Arc::new(observer));
                    let weak: Weak<Inner<T, E>> = Arc::downgrade(&self.inner);
                    return SubjectSubscription {
                        id,
                        subject: weak,
                        disposed: AtomicBool::new(false),
                    };
                }
                Some(terminal) => terminal,
            }
        };

        // Late subscriber: replay the terminal signal and hand back a handle
        // that is already detached.
        match terminal {
            Terminal::Completed => observer.on_completed(),
            Terminal::Failed(e) => observer.on_error(e),
        }
        SubjectSubscription {
            id,
            subject: Weak::<Inner<T, E>>::new(),
            disposed: AtomicBool::new(true),
        }
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: SubscriptionId);
}

impl<T, E> Unsubscribe for Inner<T, E>
where
    T: Send + Sync,
    E: Send + Sync,
{
    fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.write().active.remove(&id);
    }
}

/// Handle to an observer attached to a [`Subject`].
///
/// Does not keep the subject alive.
pub struct SubjectSubscription {
    id: SubscriptionId,
    subject: Weak<dyn Unsubscribe>,
    disposed: AtomicBool,
}

impl SubjectSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Disposable for SubjectSubscription {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(subject) = self.subject.upgrade() {
            subject.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for SubjectSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectSubscription")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
