//! One-shot completion notification for a channel.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

pub(crate) type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Pending {
    fired: bool,
    callbacks: Vec<Callback>,
}

/// Fires registered callbacks exactly once.
///
/// Callbacks registered after firing run immediately on the registering
/// thread.
pub(crate) struct Completion {
    fired: AtomicBool,
    pending: Mutex<Pending>,
    synchronous: bool,
}

impl Completion {
    pub(crate) fn new(synchronous: bool) -> Self {
        Self {
            fired: AtomicBool::new(false),
            pending: Mutex::new(Pending::default()),
            synchronous,
        }
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Register a callback. Never blocks on other callbacks.
    pub(crate) fn subscribe(&self, callback: Callback) {
        {
            let mut pending = self.pending.lock();
            if !pending.fired {
                pending.callbacks.push(callback);
                return;
            }
        }
        callback();
    }

    /// Fire once. Returns false if already fired.
    pub(crate) fn fire(&self) -> bool {
        let callbacks = {
            let mut pending = self.pending.lock();
            if pending.fired {
                return false;
            }
            pending.fired = true;
            self.fired.store(true, Ordering::Release);
            std::mem::take(&mut pending.callbacks)
        };

        if callbacks.is_empty() {
            return true;
        }

        if self.synchronous {
            run_all(callbacks);
        } else {
            // Shared slot so the callbacks survive a failed spawn.
            let slot = Arc::new(Mutex::new(Some(callbacks)));
            let spawned = std::thread::Builder::new()
                .name("channel-completion".to_string())
                .spawn({
                    let slot = Arc::clone(&slot);
                    move || {
                        let callbacks = slot.lock().take();
                        run_all(callbacks.unwrap_or_default());
                    }
                });
            if let Err(err) = spawned {
                warn!(%err, "failed to spawn completion thread, running callbacks inline");
                let callbacks = slot.lock().take();
                run_all(callbacks.unwrap_or_default());
            }
        }
        true
    }
}

fn run_all(callbacks: Vec<Callback>) {
    for callback in callbacks {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_fires_once() {
        let completion = Completion::new(true);
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        completion.subscribe(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(completion.fire());
        assert!(!completion.fire());
        assert!(completion.is_fired());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_subscriber_runs_immediately() {
        let completion = Completion::new(true);
        completion.fire();

        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        completion.subscribe(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_asynchronous_callbacks_run_off_thread() {
        let completion = Completion::new(false);
        let (tx, rx) = crossbeam_channel::bounded(1);
        let caller = std::thread::current().id();

        completion.subscribe(Box::new(move || {
            let _ = tx.send(std::thread::current().id());
        }));
        completion.fire();

        let ran_on = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(ran_on, caller);
    }
}
