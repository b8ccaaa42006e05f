//! Buffered single-reader channels with a terminal state.
//!
//! A channel is a [`ChannelWriter`] / [`ChannelReader`] pair over a
//! crossbeam queue, plus:
//! - a terminal state, set at most once, optionally carrying an error
//! - a completion notification that fires once the channel is closed *and*
//!   drained
//! - a [`FullMode`] deciding what a bounded channel does when full
//!
//! Every writer operation is non-blocking. Reads can block (`recv`,
//! `iter`), time out (`recv_timeout`) or poll (`try_read`, `try_recv`).
//!
//! # Example
//!
//! ```ignore
//! let (writer, reader) = channel::bounded::<u32, String>(2)?;
//!
//! writer.try_write(1).unwrap();
//! writer.try_write(2).unwrap();
//! assert!(writer.try_write(3).unwrap_err().is_full());
//! writer.try_complete(None);
//!
//! let items: Vec<_> = reader.iter().collect::<Result<_, _>>()?;
//! assert_eq!(items, vec![1, 2]);
//! assert!(reader.is_completed());
//! ```

mod completion;
mod options;
mod queue;

pub use options::{BoundedChannelOptions, FullMode, UnboundedChannelOptions, DEFAULT_CAPACITY};
pub use queue::{ChannelReader, ChannelWriter, Iter};

pub(crate) use queue::Shared;

use crate::error::{ChannelError, Result};
use std::sync::Arc;
use tracing::debug;

/// Create a bounded channel.
///
/// Accepts a plain capacity or a full [`BoundedChannelOptions`]. A capacity
/// of zero is rejected.
pub fn bounded<T, E>(
    options: impl Into<BoundedChannelOptions>,
) -> Result<(ChannelWriter<T, E>, ChannelReader<T, E>)> {
    let options = options.into();
    if options.capacity == 0 {
        return Err(ChannelError::InvalidCapacity(options.capacity));
    }

    debug!(
        capacity = options.capacity,
        full_mode = ?options.full_mode,
        "creating bounded channel"
    );
    let (sender, receiver) = crossbeam_channel::bounded(options.capacity);
    let shared = Arc::new(Shared::new(
        sender,
        receiver,
        Some(options.capacity),
        options.full_mode,
        options.synchronous_continuations,
    ));
    Ok(pair(shared))
}

/// Create an unbounded channel. Writes are never rejected for capacity.
pub fn unbounded<T, E>(
    options: UnboundedChannelOptions,
) -> (ChannelWriter<T, E>, ChannelReader<T, E>) {
    debug!("creating unbounded channel");
    let (sender, receiver) = crossbeam_channel::unbounded();
    let shared = Arc::new(Shared::new(
        sender,
        receiver,
        None,
        FullMode::Reject,
        options.synchronous_continuations,
    ));
    pair(shared)
}

fn pair<T, E>(shared: Arc<Shared<T, E>>) -> (ChannelWriter<T, E>, ChannelReader<T, E>) {
    (
        ChannelWriter::new(Arc::clone(&shared)),
        ChannelReader::new(shared),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RecvError, RecvTimeoutError, TryRecvError, TryWriteError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        let result = bounded::<u32, String>(0);
        assert!(matches!(result, Err(ChannelError::InvalidCapacity(0))));
    }

    #[test]
    fn test_bounded_rejects_when_full() {
        let (writer, reader) = bounded::<u32, String>(2).unwrap();

        writer.try_write(1).unwrap();
        writer.try_write(2).unwrap();
        assert!(matches!(writer.try_write(3), Err(TryWriteError::Full(3))));

        assert_eq!(reader.len(), 2);
        assert_eq!(reader.capacity(), Some(2));
    }

    #[test]
    fn test_buffered_items_readable_after_error() {
        let (writer, reader) = bounded::<u32, String>(4).unwrap();

        writer.try_write(1).unwrap();
        writer.try_write(2).unwrap();
        assert!(writer.try_complete(Some("boom".to_string())));
        assert!(matches!(writer.try_write(3), Err(TryWriteError::Closed(3))));

        assert_eq!(reader.recv(), Ok(1));
        assert_eq!(reader.recv(), Ok(2));
        assert_eq!(reader.recv(), Err(RecvError::Faulted("boom".to_string())));
        assert_eq!(reader.recv(), Err(RecvError::Completed));
        assert!(reader.is_completed());
    }

    #[test]
    fn test_terminal_state_set_once() {
        let (writer, reader) = unbounded::<u32, String>(UnboundedChannelOptions::default());

        assert!(writer.try_complete(None));
        assert!(!writer.try_complete(Some("late".to_string())));
        assert_eq!(writer.complete(None), Err(ChannelError::AlreadyCompleted));

        assert_eq!(reader.try_recv(), Err(TryRecvError::Completed));
    }

    #[test]
    fn test_completion_waits_for_drain() {
        let (writer, reader) = bounded::<u32, String>(4).unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&fired);
        reader.on_completion(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        writer.try_write(1).unwrap();
        writer.try_complete(None);
        assert!(reader.is_closed());
        assert!(!reader.is_completed());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(reader.try_read(), Some(1));
        assert!(reader.is_completed());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completion_fires_immediately_when_empty() {
        let (writer, reader) = unbounded::<u32, String>(UnboundedChannelOptions::default());
        writer.try_complete(None);
        assert!(reader.is_completed());

        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        reader.on_completion(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_oldest_keeps_newest() {
        let options = BoundedChannelOptions::new(2).full_mode(FullMode::DropOldest);
        let (writer, reader) = bounded::<u32, String>(options).unwrap();

        for i in 1..=4 {
            writer.try_write(i).unwrap();
        }
        writer.try_complete(None);

        let items: Vec<u32> = reader.iter().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec![3, 4]);
    }

    #[test]
    fn test_drop_write_keeps_oldest() {
        let options = BoundedChannelOptions::new(2).full_mode(FullMode::DropWrite);
        let (writer, reader) = bounded::<u32, String>(options).unwrap();

        for i in 1..=4 {
            writer.try_write(i).unwrap();
        }
        writer.try_complete(None);

        let items: Vec<u32> = reader.iter().map(|r| r.unwrap()).collect();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_iter_yields_error_once() {
        let (writer, reader) = bounded::<u32, String>(2).unwrap();
        writer.try_write(1).unwrap();
        writer.try_complete(Some("bad".to_string()));

        let items: Vec<_> = reader.iter().collect();
        assert_eq!(items, vec![Ok(1), Err("bad".to_string())]);
    }

    #[test]
    fn test_recv_timeout() {
        let (writer, reader) = bounded::<u32, String>(1).unwrap();
        assert_eq!(
            reader.recv_timeout(Duration::from_millis(20)),
            Err(RecvTimeoutError::Timeout)
        );

        writer.try_complete(None);
        assert_eq!(
            reader.recv_timeout(Duration::from_millis(20)),
            Err(RecvTimeoutError::Completed)
        );
    }

    #[test]
    fn test_blocking_reader_across_threads() {
        let (writer, reader) = unbounded::<u32, String>(UnboundedChannelOptions::default());

        let producer = thread::spawn(move || {
            for i in 0..100 {
                writer.try_write(i).unwrap();
            }
            writer.try_complete(None);
        });

        let items: Vec<u32> = reader.iter().map(|r| r.unwrap()).collect();
        producer.join().unwrap();
        assert_eq!(items, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_dropping_reader_closes_channel() {
        let (writer, reader) = bounded::<u32, String>(4).unwrap();
        writer.try_write(1).unwrap();

        drop(reader);
        assert!(writer.is_closed());
        assert!(matches!(writer.try_write(2), Err(TryWriteError::Closed(2))));
    }
}
