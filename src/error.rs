//! Error types for channels and the observable bridge.

use thiserror::Error;

/// Terminal error carried by a bridged channel reader.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BridgeError<E> {
    /// A bounded buffer rejected a write while failing on drop.
    #[error("ChannelReader buffer overflow")]
    BufferOverflow,

    /// The source terminated with an error. Carried verbatim.
    #[error("{0}")]
    Source(E),
}

impl<E> BridgeError<E> {
    /// Whether this is the overflow tag.
    pub fn is_overflow(&self) -> bool {
        matches!(self, BridgeError::BufferOverflow)
    }

    /// The source error, if the source failed.
    pub fn into_source(self) -> Option<E> {
        match self {
            BridgeError::Source(e) => Some(e),
            BridgeError::BufferOverflow => None,
        }
    }
}

/// Errors raised by channel construction and terminal transitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Invalid capacity: {0} (bounded channels need at least 1 slot)")]
    InvalidCapacity(usize),

    #[error("Channel already completed")]
    AlreadyCompleted,
}

/// Why a non-blocking write was rejected. The value is handed back.
#[derive(Clone, PartialEq, Eq, Error)]
pub enum TryWriteError<T> {
    #[error("Channel is full")]
    Full(T),

    #[error("Channel is closed")]
    Closed(T),
}

impl<T> TryWriteError<T> {
    /// Recover the rejected value.
    pub fn into_inner(self) -> T {
        match self {
            TryWriteError::Full(v) | TryWriteError::Closed(v) => v,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TryWriteError::Full(_))
    }
}

impl<T> std::fmt::Debug for TryWriteError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryWriteError::Full(_) => f.write_str("Full(..)"),
            TryWriteError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

/// Returned by a blocking read once the channel has completed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecvError<E> {
    #[error("Channel completed")]
    Completed,

    #[error("Channel faulted: {0}")]
    Faulted(E),
}

/// Returned by a non-blocking read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TryRecvError<E> {
    #[error("Channel is empty")]
    Empty,

    #[error("Channel completed")]
    Completed,

    #[error("Channel faulted: {0}")]
    Faulted(E),
}

/// Returned by a read with a deadline.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecvTimeoutError<E> {
    #[error("Timed out waiting on channel")]
    Timeout,

    #[error("Channel completed")]
    Completed,

    #[error("Channel faulted: {0}")]
    Faulted(E),
}

impl<E> From<RecvError<E>> for TryRecvError<E> {
    fn from(e: RecvError<E>) -> Self {
        match e {
            RecvError::Completed => TryRecvError::Completed,
            RecvError::Faulted(e) => TryRecvError::Faulted(e),
        }
    }
}

impl<E> From<RecvError<E>> for RecvTimeoutError<E> {
    fn from(e: RecvError<E>) -> Self {
        match e {
            RecvError::Completed => RecvTimeoutError::Completed,
            RecvError::Faulted(e) => RecvTimeoutError::Faulted(e),
        }
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display_is_verbatim() {
        let err: BridgeError<String> = BridgeError::Source("connection reset".to_string());
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(err.into_source().as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_overflow_tag() {
        let err: BridgeError<String> = BridgeError::BufferOverflow;
        assert!(err.is_overflow());
        assert_eq!(err.to_string(), "ChannelReader buffer overflow");
        assert_eq!(err.into_source(), None);
    }

    #[test]
    fn test_try_write_error_returns_value() {
        let err = TryWriteError::Full(7);
        assert!(err.is_full());
        assert_eq!(err.into_inner(), 7);
        assert!(!TryWriteError::Closed(1).is_full());
    }
}
