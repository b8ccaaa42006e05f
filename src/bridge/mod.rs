//! Bridge a push-based [`Source`](crate::Source) into a pull-based
//! [`ChannelReader`](crate::ChannelReader).
//!
//! Three lifetimes meet here: the source subscription, the channel and an
//! external cancellation signal. Any of them may end first:
//! - overflow (with `fail_on_drop`), source error and source completion
//!   close the channel; already buffered values stay readable
//! - cancellation closes the channel and discards buffered values
//! - dropping the reader closes and drains the channel
//!
//! Every terminal transition is best effort: the first one wins, the rest
//! are no-ops. Cleanup is attached to the channel's completion (closed and
//! drained) rather than to each terminal path, and is guarded so the
//! subscription and the cancellation registration are disposed exactly once.
//!
//! # Example
//!
//! ```ignore
//! let subject: Subject<u32, String> = Subject::new();
//! let token = CancellationToken::new();
//!
//! let reader = subject.as_channel_reader_with_cancellation(
//!     BridgeConfig::bounded(2),
//!     &token,
//! )?;
//!
//! subject.next(1);
//! subject.next(2);
//! subject.next(3); // overflow: the reader is faulted
//!
//! for item in &reader {
//!     match item {
//!         Ok(v) => println!("value {v}"),
//!         Err(BridgeError::BufferOverflow) => println!("consumer too slow"),
//!         Err(BridgeError::Source(e)) => println!("source failed: {e}"),
//!     }
//! }
//! ```

mod adapter;
mod config;

pub use adapter::{bridge, BridgedReader, SourceExt};
pub use config::{BridgeConfig, Capacity};
