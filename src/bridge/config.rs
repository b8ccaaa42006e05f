//! Bridge configuration.

use crate::channel::{BoundedChannelOptions, UnboundedChannelOptions, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};

/// Buffer shape for a bridged reader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Capacity {
    /// Never rejects a write. `fail_on_drop` has no effect.
    Unbounded(UnboundedChannelOptions),
    /// Rejects writes once `capacity` items are buffered (for
    /// `FullMode::Reject`).
    Bounded(BoundedChannelOptions),
}

impl Capacity {
    pub fn unbounded() -> Self {
        Capacity::Unbounded(UnboundedChannelOptions::default())
    }

    pub fn bounded(capacity: usize) -> Self {
        Capacity::Bounded(BoundedChannelOptions::new(capacity))
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::bounded(DEFAULT_CAPACITY)
    }
}

impl From<usize> for Capacity {
    fn from(capacity: usize) -> Self {
        Capacity::bounded(capacity)
    }
}

impl From<BoundedChannelOptions> for Capacity {
    fn from(options: BoundedChannelOptions) -> Self {
        Capacity::Bounded(options)
    }
}

impl From<UnboundedChannelOptions> for Capacity {
    fn from(options: UnboundedChannelOptions) -> Self {
        Capacity::Unbounded(options)
    }
}

/// Configuration for bridging a source into a channel reader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Buffer shape.
    /// Default: bounded, 8 items
    pub capacity: Capacity,

    /// Fault the reader with `BufferOverflow` when a write is rejected,
    /// instead of silently dropping the value.
    /// Default: true
    pub fail_on_drop: bool,
}

impl BridgeConfig {
    pub fn bounded(capacity: usize) -> Self {
        Self::with_options(capacity)
    }

    pub fn unbounded() -> Self {
        Self::with_options(Capacity::unbounded())
    }

    pub fn with_options(capacity: impl Into<Capacity>) -> Self {
        Self {
            capacity: capacity.into(),
            ..Default::default()
        }
    }

    pub fn fail_on_drop(mut self, fail_on_drop: bool) -> Self {
        self.fail_on_drop = fail_on_drop;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            capacity: Capacity::default(),
            fail_on_drop: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::FullMode;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.capacity, Capacity::bounded(8));
        assert!(config.fail_on_drop);
    }

    #[test]
    fn test_builders() {
        let config = BridgeConfig::unbounded().fail_on_drop(false);
        assert_eq!(config.capacity, Capacity::unbounded());
        assert!(!config.fail_on_drop);

        let options = BoundedChannelOptions::new(3).full_mode(FullMode::DropOldest);
        let config = BridgeConfig::with_options(options.clone());
        assert_eq!(config.capacity, Capacity::Bounded(options));
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"capacity": {"mode": "bounded", "capacity": 64}, "fail_on_drop": false}"#,
        )
        .unwrap();
        assert_eq!(config.capacity, Capacity::bounded(64));
        assert!(!config.fail_on_drop);

        let config: BridgeConfig =
            serde_json::from_str(r#"{"capacity": {"mode": "unbounded"}}"#).unwrap();
        assert_eq!(config.capacity, Capacity::unbounded());
        assert!(config.fail_on_drop);
    }
}
