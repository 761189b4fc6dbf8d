// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! `CrossBar`-level and per-subscription configuration (spec §4.4).
//!
//! `#[serde(default)]` structs with a `Default` impl matching spec §4.4's
//! stated defaults, plus explicit validation performed once at
//! construction.

use serde::{Deserialize, Serialize};

use crate::{error::CrossBarError, stats::StatsOptions};

/// The backpressure policy applied when a subscriber's bounded queue is full
/// (spec §4.4, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlowConsumerStrategy {
    /// Drop the envelope for this subscriber; emit a warning.
    SkipUpdates,
    /// Close the subscription's queue with `FailedSubscription`.
    FailSubscription,
    /// Replace the latest enqueued envelope with the same key; skip if unkeyed
    /// or if an atomic replace is not possible.
    ConflateAndSkipUpdates,
}

impl Default for SlowConsumerStrategy {
    fn default() -> Self {
        Self::SkipUpdates
    }
}

/// `CrossBar`-level configuration (spec §4.4 "CrossBar-level options").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossBarConfig {
    /// Default bounded queue capacity for subscriptions that don't override
    /// it. `None` means unbounded.
    pub default_buffer_capacity: Option<usize>,
    /// Default backpressure policy for subscriptions that don't override it.
    pub default_slow_consumer_strategy: SlowConsumerStrategy,
    /// Default conflation interval (milliseconds) for subscriptions that
    /// don't override it. `0` disables conflation.
    pub default_conflation_interval_ms: u64,
    /// Maximum number of live channels. `None` means unbounded.
    pub max_channels: Option<usize>,
    /// Maximum channel name length.
    pub max_channel_name_length: usize,
    /// Whether to re-publish a `SubscriptionProcessed` trace event on the
    /// trace system channel after each handler invocation.
    pub enable_message_tracing: bool,
    /// Whether to publish lifecycle events (channel/subscription
    /// creation and teardown) on the lifecycle system channel.
    pub enable_lifecycle_tracking: bool,
    /// Whether to emit a trace record on every successful enqueue.
    pub enable_publish_logging: bool,
    /// The prefix identifying a system channel.
    pub system_channel_prefix: String,
    /// The bounded capacity used for system channels' own subscriptions.
    pub system_channel_buffer_capacity: usize,
    /// The default moving-percentile estimator configuration.
    pub default_stats_options: StatsOptions,
}

impl Default for CrossBarConfig {
    fn default() -> Self {
        Self {
            default_buffer_capacity: None,
            default_slow_consumer_strategy: SlowConsumerStrategy::default(),
            default_conflation_interval_ms: 0,
            max_channels: None,
            max_channel_name_length: berberis_core::consts::DEFAULT_MAX_CHANNEL_NAME_LENGTH,
            enable_message_tracing: false,
            enable_lifecycle_tracking: false,
            enable_publish_logging: false,
            system_channel_prefix: berberis_core::consts::DEFAULT_SYSTEM_CHANNEL_PREFIX.to_string(),
            system_channel_buffer_capacity: 1000,
            default_stats_options: StatsOptions::default(),
        }
    }
}

impl CrossBarConfig {
    /// Validates this configuration, rejecting non-positive capacities,
    /// and an empty system channel prefix (spec §4.4).
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidConfig`] on the first violated rule.
    pub fn validate(&self) -> Result<(), CrossBarError> {
        if self.default_buffer_capacity == Some(0) {
            return Err(CrossBarError::InvalidConfig {
                reason: "default_buffer_capacity must be > 0 when set".to_string(),
            });
        }
        if self.max_channels == Some(0) {
            return Err(CrossBarError::InvalidConfig {
                reason: "max_channels must be > 0 when set".to_string(),
            });
        }
        if self.max_channel_name_length == 0 {
            return Err(CrossBarError::InvalidConfig {
                reason: "max_channel_name_length must be > 0".to_string(),
            });
        }
        if self.system_channel_prefix.is_empty() {
            return Err(CrossBarError::InvalidConfig {
                reason: "system_channel_prefix must not be empty".to_string(),
            });
        }
        if self.system_channel_buffer_capacity == 0 {
            return Err(CrossBarError::InvalidConfig {
                reason: "system_channel_buffer_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-subscription options (spec §4.4 "Recognised subscription options").
///
/// Every field below that has a `CrossBarConfig`-level default (backpressure
/// strategy, buffer capacity, conflation interval, stats options) is `None`
/// by default here, meaning "inherit `CrossBarConfig`'s default for this
/// bar"; a builder method turns it into an explicit per-subscription
/// override that wins regardless of what the bar's config says, the same
/// `request.field.unwrap_or(self.field)` layering the rest of this codebase
/// uses for a per-call option falling back to an instance-level default.
///
/// The `onTimeout` callback is not part of this struct (callbacks are not
/// serializable); pass it directly to `CrossBar::subscribe`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscribeOptions {
    /// Prefix of the subscription's display name.
    pub subscription_name: Option<String>,
    /// Include the channel's value-store snapshot as an initial state factory.
    pub fetch_state: bool,
    /// The backpressure policy for this subscription. `None` inherits
    /// `CrossBarConfig::default_slow_consumer_strategy`.
    pub slow_consumer_strategy: Option<SlowConsumerStrategy>,
    /// Bounded queue capacity override. `None` inherits
    /// `CrossBarConfig::default_buffer_capacity`; `Some(None)` explicitly
    /// requests an unbounded queue; `Some(Some(n))` a bounded queue of size
    /// `n`.
    pub buffer_capacity: Option<Option<usize>>,
    /// Conflation interval (milliseconds) override. `None` inherits
    /// `CrossBarConfig::default_conflation_interval_ms`; `Some(0)`
    /// explicitly disables conflation.
    pub conflation_interval_ms: Option<u64>,
    /// Per-message handler timeout (milliseconds), if any. Has no
    /// `CrossBarConfig`-level default, so `None` simply means "no timeout".
    pub handler_timeout_ms: Option<u64>,
    /// The moving-percentile estimator configuration for this subscription.
    /// `None` inherits `CrossBarConfig::default_stats_options`.
    pub stats_options: Option<StatsOptions>,
}

impl SubscribeOptions {
    /// Validates this set of options.
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidConfig`] if `buffer_capacity` is
    /// `Some(Some(0))`.
    pub fn validate(&self) -> Result<(), CrossBarError> {
        if self.buffer_capacity == Some(Some(0)) {
            return Err(CrossBarError::InvalidConfig {
                reason: "buffer_capacity must be > 0 when set".to_string(),
            });
        }
        Ok(())
    }

    /// Builder: sets `subscription_name`.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.subscription_name = Some(name.into());
        self
    }

    /// Builder: sets `fetch_state`.
    #[must_use]
    pub fn with_fetch_state(mut self, fetch_state: bool) -> Self {
        self.fetch_state = fetch_state;
        self
    }

    /// Builder: sets `slow_consumer_strategy`, overriding the bar's configured default.
    #[must_use]
    pub fn with_slow_consumer_strategy(mut self, strategy: SlowConsumerStrategy) -> Self {
        self.slow_consumer_strategy = Some(strategy);
        self
    }

    /// Builder: sets `buffer_capacity` to a bounded size, overriding the bar's configured default.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(Some(capacity));
        self
    }

    /// Builder: explicitly requests an unbounded queue, overriding the bar's configured default.
    #[must_use]
    pub fn with_unbounded_buffer(mut self) -> Self {
        self.buffer_capacity = Some(None);
        self
    }

    /// Builder: sets `conflation_interval_ms`, overriding the bar's configured default.
    #[must_use]
    pub fn with_conflation_interval_ms(mut self, interval_ms: u64) -> Self {
        self.conflation_interval_ms = Some(interval_ms);
        self
    }

    /// Builder: sets `handler_timeout_ms`.
    #[must_use]
    pub fn with_handler_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.handler_timeout_ms = Some(timeout_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn default_crossbar_config() {
        let config = CrossBarConfig::default();
        assert_eq!(config.system_channel_prefix, "$");
        assert_eq!(config.system_channel_buffer_capacity, 1000);
        assert_eq!(config.max_channel_name_length, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_crossbar_config_with_partial_overrides() {
        let value = json!({ "max_channels": 100, "system_channel_prefix": "$" });
        let config: CrossBarConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.max_channels, Some(100));
        assert_eq!(config.default_buffer_capacity, None);
    }

    #[rstest]
    #[case(Some(0), false)]
    #[case(Some(1), true)]
    #[case(None, true)]
    fn validate_rejects_zero_capacity(#[case] capacity: Option<usize>, #[case] valid: bool) {
        let mut config = CrossBarConfig::default();
        config.default_buffer_capacity = capacity;
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn validate_rejects_empty_prefix() {
        let mut config = CrossBarConfig::default();
        config.system_channel_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn subscribe_options_builder() {
        let options = SubscribeOptions::default()
            .with_name("orders")
            .with_fetch_state(true)
            .with_buffer_capacity(10)
            .with_conflation_interval_ms(200);
        assert_eq!(options.subscription_name.as_deref(), Some("orders"));
        assert!(options.fetch_state);
        assert_eq!(options.buffer_capacity, Some(Some(10)));
        assert_eq!(options.conflation_interval_ms, Some(200));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn subscribe_options_default_inherits_bar_config() {
        let options = SubscribeOptions::default();
        assert_eq!(options.slow_consumer_strategy, None);
        assert_eq!(options.buffer_capacity, None);
        assert_eq!(options.conflation_interval_ms, None);
        assert_eq!(options.stats_options, None);
    }

    #[test]
    fn subscribe_options_unbounded_override() {
        let options = SubscribeOptions::default().with_unbounded_buffer();
        assert_eq!(options.buffer_capacity, Some(None));
    }
}
