//! Push-based sources.
//!
//! A [`Source`] accepts an [`Observer`](crate::Observer) and returns a
//! disposable subscription. Two implementations ship with the crate:
//! - [`Subject`]: hot, multicast; values are pushed by the owner
//! - [`IterSource`]: cold; replays an iterator on every subscribe
//!
//! # Example
//!
//! ```ignore
//! let subject: Subject<u32, String> = Subject::new();
//!
//! let sub = subject.subscribe(Observer::new(
//!     |v| println!("value: {v}"),
//!     |e| println!("error: {e}"),
//!     || println!("done"),
//! ));
//!
//! subject.next(1);
//! subject.complete();
//! sub.dispose();
//! ```

mod subject;
mod types;

pub use subject::{Subject, SubjectSubscription};
pub use types::{IterSource, NoopSubscription, Source};
