//! Source-to-channel adapter.

use crate::cancel::{CancellationSignal, CancellationToken};
use crate::channel::{self, ChannelReader, ChannelWriter};
use crate::error::{BridgeError, Result, TryWriteError};
use crate::source::Source;
use crate::types::{Disposable, Observer};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use super::config::{BridgeConfig, Capacity};

/// Reader returned by the bridge.
pub type BridgedReader<T, E> = ChannelReader<T, BridgeError<E>>;

/// Subscribe to `source` and expose its values as a channel reader.
///
/// - values are written without blocking; a rejected write either faults
///   the reader with [`BridgeError::BufferOverflow`] (`fail_on_drop`) or
///   drops the value
/// - a source error or completion closes the channel
/// - raising `cancellation` closes the channel and discards anything still
///   buffered
///
/// Once the channel is closed and drained, the source subscription and the
/// cancellation registration are each disposed exactly once.
pub fn bridge<T, E, S, C>(
    source: &S,
    capacity: impl Into<Capacity>,
    cancellation: &C,
    fail_on_drop: bool,
) -> Result<BridgedReader<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    S: Source<T, E> + ?Sized,
    C: CancellationSignal + ?Sized,
{
    let (writer, reader) = match capacity.into() {
        Capacity::Unbounded(options) => channel::unbounded(options),
        Capacity::Bounded(options) => channel::bounded(options)?,
    };

    let subscription = source.subscribe(forwarding_observer(writer, fail_on_drop));

    let shared = reader.shared();
    let registration = cancellation.register(move || {
        shared.try_complete(None);
        let drained = shared.drain();
        debug!(drained, "bridge cancelled");
    });

    let teardown = Teardown::new(subscription, registration);
    reader.on_completion(move || teardown.run());

    Ok(reader)
}

/// Observer that forwards into `writer` under the overflow policy.
fn forwarding_observer<T, E>(
    writer: ChannelWriter<T, BridgeError<E>>,
    fail_on_drop: bool,
) -> Observer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let on_error = writer.clone();
    let on_completed = writer.clone();

    Observer::new(
        move |value| forward(&writer, value, fail_on_drop),
        move |error| {
            if !on_error.try_complete(Some(BridgeError::Source(error))) {
                trace!("source error after channel closed");
            }
        },
        move || {
            on_completed.try_complete(None);
        },
    )
}

fn forward<T, E>(writer: &ChannelWriter<T, BridgeError<E>>, value: T, fail_on_drop: bool) {
    match writer.try_write(value) {
        Ok(()) => {}
        Err(TryWriteError::Full(_)) if fail_on_drop => {
            // Losing this race to another terminal transition is fine.
            match writer.complete(Some(BridgeError::BufferOverflow)) {
                Ok(()) => debug!("bridge buffer overflow, channel faulted"),
                Err(err) => trace!(%err, "overflow after channel closed"),
            }
        }
        Err(TryWriteError::Full(_)) => trace!("bridge buffer full, value dropped"),
        Err(TryWriteError::Closed(_)) => {}
    }
}

/// Disposes the subscription and the cancellation registration exactly once.
pub(crate) struct Teardown<S, R> {
    disposed: AtomicBool,
    subscription: S,
    registration: R,
}

impl<S, R> Teardown<S, R>
where
    S: Disposable,
    R: Disposable,
{
    pub(crate) fn new(subscription: S, registration: R) -> Self {
        Self {
            disposed: AtomicBool::new(false),
            subscription,
            registration,
        }
    }

    pub(crate) fn run(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.subscription.dispose();
        self.registration.dispose();
        trace!("bridge torn down");
    }
}

/// Adapter methods available on every [`Source`].
pub trait SourceExt<T, E>: Source<T, E> {
    /// Bridge into a reader that is never cancelled.
    fn as_channel_reader(&self, config: BridgeConfig) -> Result<BridgedReader<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        bridge(
            self,
            config.capacity,
            &CancellationToken::none(),
            config.fail_on_drop,
        )
    }

    /// Bridge into a reader that completes when `cancellation` fires.
    fn as_channel_reader_with_cancellation<C>(
        &self,
        config: BridgeConfig,
        cancellation: &C,
    ) -> Result<BridgedReader<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        C: CancellationSignal + ?Sized,
    {
        bridge(self, config.capacity, cancellation, config.fail_on_drop)
    }
}

impl<S, T, E> SourceExt<T, E> for S where S: Source<T, E> + ?Sized {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    struct Counted(Arc<AtomicUsize>);

    impl Disposable for Counted {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_teardown_runs_once_under_contention() {
        for _ in 0..100 {
            let subs = Arc::new(AtomicUsize::new(0));
            let regs = Arc::new(AtomicUsize::new(0));
            let teardown = Arc::new(Teardown::new(
                Counted(Arc::clone(&subs)),
                Counted(Arc::clone(&regs)),
            ));

            let handles: Vec<_> = (0..3)
                .map(|_| {
                    let teardown = Arc::clone(&teardown);
                    thread::spawn(move || teardown.run())
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(subs.load(Ordering::SeqCst), 1);
            assert_eq!(regs.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_forward_swallows_lost_overflow_race() {
        let (writer, reader) = channel::bounded::<u32, BridgeError<String>>(1).unwrap();
        writer.try_write(1).unwrap();
        writer.try_complete(None);

        // Channel already closed: must not panic or change the terminal state.
        forward(&writer, 2, true);

        assert_eq!(reader.try_read(), Some(1));
        assert!(reader.is_completed());
    }

    #[test]
    fn test_forward_overflow_faults_channel() {
        let (writer, reader) = channel::bounded::<u32, BridgeError<String>>(1).unwrap();
        forward(&writer, 1, true);
        forward(&writer, 2, true);
        forward(&writer, 3, true);

        let items: Vec<_> = reader.iter().collect();
        assert_eq!(items, vec![Ok(1), Err(BridgeError::BufferOverflow)]);
    }
}
