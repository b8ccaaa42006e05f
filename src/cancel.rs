//! One-shot cancellation signal with callback registration.

use crate::types::Disposable;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Something a callback can be attached to that fires at most once.
pub trait CancellationSignal {
    /// Handle that detaches the callback when disposed.
    type Registration: Disposable + Send + Sync + 'static;

    /// Attach `callback`. If the signal has already been raised the callback
    /// runs before this returns.
    fn register<F>(&self, callback: F) -> Self::Registration
    where
        F: FnOnce() + Send + 'static;
}

struct Inner {
    cancelled: AtomicBool,
    callbacks: Mutex<HashMap<u64, Callback>>,
    next_id: AtomicU64,
}

/// Cloneable cancellation flag. All clones observe the same state.
///
/// [`CancellationToken::none`] produces a token that can never be cancelled
/// and accepts registrations without storing them.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Option<Arc<Inner>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Some(Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                callbacks: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            })),
        }
    }

    /// A token that never fires.
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// Raise the signal. Runs every registered callback on the calling
    /// thread. Only the first call has any effect.
    pub fn cancel(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        if inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        let callbacks: Vec<Callback> = {
            let mut callbacks = inner.callbacks.lock();
            callbacks.drain().map(|(_, cb)| cb).collect()
        };
        debug!(callbacks = callbacks.len(), "cancellation raised");
        for callback in callbacks {
            callback();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.cancelled.load(Ordering::Acquire))
    }

    /// Whether this token can ever fire.
    pub fn can_be_cancelled(&self) -> bool {
        self.inner.is_some()
    }

    /// Number of callbacks waiting for the signal.
    pub fn registration_count(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.callbacks.lock().len())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("can_be_cancelled", &self.can_be_cancelled())
            .finish()
    }
}

impl CancellationSignal for CancellationToken {
    type Registration = CancellationRegistration;

    fn register<F>(&self, callback: F) -> CancellationRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(inner) = &self.inner else {
            return CancellationRegistration::detached();
        };

        let id = inner.next_id.fetch_add(1, Ordering::SeqCst);
        {
            // `cancel` sets the flag before taking the lock, so checking it
            // under the lock cannot miss a concurrent cancel.
            let mut callbacks = inner.callbacks.lock();
            if !inner.cancelled.load(Ordering::Acquire) {
                callbacks.insert(id, Box::new(callback));
                return CancellationRegistration {
                    id,
                    token: Arc::downgrade(inner),
                    disposed: AtomicBool::new(false),
                };
            }
        }

        callback();
        CancellationRegistration::detached()
    }
}

/// Handle to a callback registered on a [`CancellationToken`].
///
/// Does not keep the token alive.
pub struct CancellationRegistration {
    id: u64,
    token: Weak<Inner>,
    disposed: AtomicBool,
}

impl CancellationRegistration {
    fn detached() -> Self {
        Self {
            id: 0,
            token: Weak::new(),
            disposed: AtomicBool::new(true),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Disposable for CancellationRegistration {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.token.upgrade() {
            inner.callbacks.lock().remove(&self.id);
        }
    }
}

impl std::fmt::Debug for CancellationRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationRegistration")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
