//! # Observable Channels
//!
//! Turn a push-based source into a pull-based, bounded channel reader.
//!
//! ## Core Concepts
//!
//! - **Sources**: emit values, then at most one error or completion
//! - **Channels**: buffered single-reader queues with a once-only terminal state
//! - **Cancellation**: one-shot signals that close and drain a bridged channel
//! - **Bridge**: subscribes a source to a channel under an overflow policy and
//!   cleans up exactly once, whichever side finishes first
//!
//! ## Example
//!
//! ```ignore
//! use observable_channels::{BridgeConfig, Observer, SourceExt, Subject};
//!
//! let subject: Subject<u64, String> = Subject::new();
//! let reader = subject.as_channel_reader(BridgeConfig::bounded(16))?;
//!
//! std::thread::spawn(move || {
//!     for i in 0..10 {
//!         subject.next(i);
//!     }
//!     subject.complete();
//! });
//!
//! for item in &reader {
//!     println!("{:?}", item);
//! }
//! ```

pub mod bridge;
pub mod cancel;
pub mod channel;
pub mod error;
pub mod source;
pub mod types;

// Re-exports
pub use bridge::{bridge, BridgeConfig, BridgedReader, Capacity, SourceExt};
pub use cancel::{CancellationRegistration, CancellationSignal, CancellationToken};
pub use channel::{
    BoundedChannelOptions, ChannelReader, ChannelWriter, FullMode, UnboundedChannelOptions,
};
pub use error::{
    BridgeError, ChannelError, RecvError, RecvTimeoutError, Result, TryRecvError, TryWriteError,
};
pub use source::{IterSource, NoopSubscription, Source, Subject, SubjectSubscription};
pub use types::{Disposable, Observer, SubscriptionId};
