//! Channel construction options.

use serde::{Deserialize, Serialize};

/// Default capacity used when none is chosen.
pub const DEFAULT_CAPACITY: usize = 8;

/// What a bounded channel does with a write that arrives while it is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullMode {
    /// Reject the write; `try_write` returns `Full`.
    #[default]
    Reject,
    /// Evict the oldest buffered item to make room.
    DropOldest,
    /// Accept the write and discard the arriving item.
    DropWrite,
}

/// Options for a bounded channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundedChannelOptions {
    /// Max buffered items.
    /// Default: 8
    pub capacity: usize,

    /// Behavior when a write arrives at capacity.
    pub full_mode: FullMode,

    /// Run completion callbacks inline on the completing thread.
    /// When false, callbacks run on a spawned thread.
    /// Default: true
    pub synchronous_continuations: bool,
}

impl BoundedChannelOptions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn full_mode(mut self, full_mode: FullMode) -> Self {
        self.full_mode = full_mode;
        self
    }

    pub fn synchronous_continuations(mut self, enabled: bool) -> Self {
        self.synchronous_continuations = enabled;
        self
    }
}

impl Default for BoundedChannelOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            full_mode: FullMode::Reject,
            synchronous_continuations: true,
        }
    }
}

impl From<usize> for BoundedChannelOptions {
    fn from(capacity: usize) -> Self {
        Self::new(capacity)
    }
}

/// Options for an unbounded channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnboundedChannelOptions {
    /// See [`BoundedChannelOptions::synchronous_continuations`].
    pub synchronous_continuations: bool,
}

impl UnboundedChannelOptions {
    pub fn synchronous_continuations(mut self, enabled: bool) -> Self {
        self.synchronous_continuations = enabled;
        self
    }
}

impl Default for UnboundedChannelOptions {
    fn default() -> Self {
        Self {
            synchronous_continuations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_defaults() {
        let options = BoundedChannelOptions::default();
        assert_eq!(options.capacity, DEFAULT_CAPACITY);
        assert_eq!(options.full_mode, FullMode::Reject);
        assert!(options.synchronous_continuations);
    }

    #[test]
    fn test_bounded_from_json_fills_defaults() {
        let options: BoundedChannelOptions =
            serde_json::from_str(r#"{"capacity": 32, "full_mode": "drop_oldest"}"#).unwrap();
        assert_eq!(options.capacity, 32);
        assert_eq!(options.full_mode, FullMode::DropOldest);
        assert!(options.synchronous_continuations);
    }
}
