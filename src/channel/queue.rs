//! Shared channel state plus the writer and reader halves.

use crate::error::{
    ChannelError, RecvError, RecvTimeoutError, Result, TryRecvError, TryWriteError,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use super::completion::Completion;
use super::options::FullMode;

/// Writer side of the channel state.
enum WriterState<T, E> {
    /// Accepting writes.
    Open(Sender<T>),
    /// Terminal. The error is handed to the reader once.
    Closed(Option<E>),
}

/// State shared by both halves and by the bridge.
pub(crate) struct Shared<T, E> {
    /// Guards writes against terminal transitions. Held only for a single
    /// write or transition.
    state: Mutex<WriterState<T, E>>,
    /// Mirrors `state` being `Closed` for lock-free checks on the read path.
    closed: AtomicBool,
    receiver: Receiver<T>,
    capacity: Option<usize>,
    full_mode: FullMode,
    /// Fires once the channel is closed and drained.
    completion: Completion,
}

impl<T, E> Shared<T, E> {
    pub(crate) fn new(
        sender: Sender<T>,
        receiver: Receiver<T>,
        capacity: Option<usize>,
        full_mode: FullMode,
        synchronous_continuations: bool,
    ) -> Self {
        Self {
            state: Mutex::new(WriterState::Open(sender)),
            closed: AtomicBool::new(false),
            receiver,
            capacity,
            full_mode,
            completion: Completion::new(synchronous_continuations),
        }
    }

    pub(crate) fn try_write(&self, value: T) -> std::result::Result<(), TryWriteError<T>> {
        let state = self.state.lock();
        let sender = match &*state {
            WriterState::Open(sender) => sender,
            WriterState::Closed(_) => return Err(TryWriteError::Closed(value)),
        };

        match sender.try_send(value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(value)) => match self.full_mode {
                FullMode::Reject => Err(TryWriteError::Full(value)),
                FullMode::DropWrite => {
                    trace!("channel full, discarding arriving item");
                    Ok(())
                }
                FullMode::DropOldest => {
                    // Writes are serialized by `state`, so after one eviction
                    // there is room unless the reader raced us to it.
                    let _ = self.receiver.try_recv();
                    trace!("channel full, evicted oldest item");
                    sender.try_send(value).map_err(|e| match e {
                        TrySendError::Full(v) => TryWriteError::Full(v),
                        TrySendError::Disconnected(v) => TryWriteError::Closed(v),
                    })
                }
            },
            // We hold a receiver for as long as we hold the sender.
            Err(TrySendError::Disconnected(value)) => Err(TryWriteError::Closed(value)),
        }
    }

    /// Move to the terminal state. Returns false if already terminal.
    pub(crate) fn try_complete(&self, error: Option<E>) -> bool {
        {
            let mut state = self.state.lock();
            if matches!(*state, WriterState::Closed(_)) {
                return false;
            }
            // Replacing the state drops the sender, which disconnects the
            // receiver once the buffer is empty.
            *state = WriterState::Closed(error);
            self.closed.store(true, Ordering::Release);
        }
        trace!(buffered = self.receiver.len(), "channel closed");
        self.complete_if_drained();
        true
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completion.is_fired()
    }

    /// Non-blocking read that never reports the terminal error.
    pub(crate) fn try_read(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(value) => {
                self.complete_if_drained();
                Some(value)
            }
            Err(crossbeam_channel::TryRecvError::Empty) => None,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.completion.fire();
                None
            }
        }
    }

    /// Discard everything currently buffered. Returns the number of items
    /// discarded.
    pub(crate) fn drain(&self) -> usize {
        let mut drained = 0;
        while self.try_read().is_some() {
            drained += 1;
        }
        drained
    }

    pub(crate) fn on_completion(&self, callback: Box<dyn FnOnce() + Send + 'static>) {
        self.completion.subscribe(callback);
    }

    fn complete_if_drained(&self) {
        if self.is_closed() && self.receiver.is_empty() {
            self.completion.fire();
        }
    }

    /// Report the terminal state after the receiver disconnected.
    fn terminal(&self) -> RecvError<E> {
        self.completion.fire();
        let mut state = self.state.lock();
        match &mut *state {
            WriterState::Closed(error) => match error.take() {
                Some(e) => RecvError::Faulted(e),
                None => RecvError::Completed,
            },
            WriterState::Open(_) => RecvError::Completed,
        }
    }
}

/// Writing half of a channel. Cheap to clone.
pub struct ChannelWriter<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for ChannelWriter<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> ChannelWriter<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    /// Write without blocking.
    pub fn try_write(&self, value: T) -> std::result::Result<(), TryWriteError<T>> {
        self.shared.try_write(value)
    }

    /// Close the channel, optionally with an error. Returns false if the
    /// channel was already closed.
    pub fn try_complete(&self, error: Option<E>) -> bool {
        self.shared.try_complete(error)
    }

    /// Close the channel, failing if it was already closed.
    pub fn complete(&self, error: Option<E>) -> Result<()> {
        if self.shared.try_complete(error) {
            Ok(())
        } else {
            Err(ChannelError::AlreadyCompleted)
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

/// Reading half of a channel.
///
/// There is exactly one reader per channel. Dropping it closes the channel
/// and discards whatever is still buffered.
pub struct ChannelReader<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> ChannelReader<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> Arc<Shared<T, E>> {
        Arc::clone(&self.shared)
    }

    /// Take the next item if one is buffered.
    pub fn try_read(&self) -> Option<T> {
        self.shared.try_read()
    }

    /// Take the next item without blocking.
    ///
    /// The terminal error, if any, is reported by the first read that finds
    /// the channel completed; later reads report `Completed`.
    pub fn try_recv(&self) -> std::result::Result<T, TryRecvError<E>> {
        match self.shared.receiver.try_recv() {
            Ok(value) => {
                self.shared.complete_if_drained();
                Ok(value)
            }
            Err(crossbeam_channel::TryRecvError::Empty) => Err(TryRecvError::Empty),
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                Err(self.shared.terminal().into())
            }
        }
    }

    /// Block until an item is available or the channel completes.
    pub fn recv(&self) -> std::result::Result<T, RecvError<E>> {
        match self.shared.receiver.recv() {
            Ok(value) => {
                self.shared.complete_if_drained();
                Ok(value)
            }
            Err(crossbeam_channel::RecvError) => Err(self.shared.terminal()),
        }
    }

    /// Block for at most `timeout`.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<T, RecvTimeoutError<E>> {
        match self.shared.receiver.recv_timeout(timeout) {
            Ok(value) => {
                self.shared.complete_if_drained();
                Ok(value)
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(RecvTimeoutError::Timeout),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(self.shared.terminal().into())
            }
        }
    }

    /// Blocking iterator over items. Yields `Err` at most once, for a
    /// faulted channel, and then ends.
    pub fn iter(&self) -> Iter<'_, T, E> {
        Iter {
            reader: self,
            done: false,
        }
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.shared.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.receiver.is_empty()
    }

    /// `None` for unbounded channels.
    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }

    /// Whether the writer side has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Whether the channel is closed and fully drained.
    pub fn is_completed(&self) -> bool {
        self.shared.is_completed()
    }

    /// Run `callback` once the channel is closed and drained. Runs
    /// immediately if that already happened.
    pub fn on_completion<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.on_completion(Box::new(callback));
    }
}

impl<T, E> Drop for ChannelReader<T, E> {
    fn drop(&mut self) {
        self.shared.try_complete(None);
        self.shared.drain();
    }
}

impl<T, E> std::fmt::Debug for ChannelReader<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelReader")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Blocking iterator returned by [`ChannelReader::iter`].
pub struct Iter<'a, T, E> {
    reader: &'a ChannelReader<T, E>,
    done: bool,
}

impl<T, E> Iterator for Iter<'_, T, E> {
    type Item = std::result::Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.recv() {
            Ok(value) => Some(Ok(value)),
            Err(RecvError::Completed) => {
                self.done = true;
                None
            }
            Err(RecvError::Faulted(e)) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, T, E> IntoIterator for &'a ChannelReader<T, E> {
    type Item = std::result::Result<T, E>;
    type IntoIter = Iter<'a, T, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
