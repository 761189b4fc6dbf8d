// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The CrossBar error taxonomy (spec §7), one variant per table row.
//!
//! A `thiserror` enum with one `#[error("...")]` message per failure kind,
//! `#[from]` conversions where an upstream error type composes cleanly.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by [`crate::crossbar::CrossBar`] operations.
#[derive(Debug, Error)]
pub enum CrossBarError {
    /// A channel name failed validation (empty, too long, contains `..`, etc).
    #[error("invalid channel name '{name}': {reason}")]
    InvalidChannelName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A publish or subscribe declared a payload type that disagrees with
    /// the channel's already-established type.
    #[error("type mismatch on channel '{channel}': expected {expected}, found {actual}")]
    TypeMismatch {
        /// The channel name.
        channel: String,
        /// The channel's declared type name.
        expected: String,
        /// The type name the caller attempted to use.
        actual: String,
    },

    /// `store=true` was requested without a non-empty key.
    #[error("publish failed on channel '{channel}': {reason}")]
    PublishFailure {
        /// The channel name.
        channel: String,
        /// Why the publish was rejected.
        reason: String,
    },

    /// An illegal subscription was requested (wildcard on a system channel,
    /// subscribe to a non-existent system channel, malformed pattern, ...).
    #[error("invalid subscription: {reason}")]
    InvalidSubscription {
        /// Why the subscription request was rejected.
        reason: String,
    },

    /// The bar has been disposed; no further API calls are accepted.
    #[error("CrossBar has been disposed")]
    ObjectDisposed,

    /// A handler invocation exceeded its configured timeout.
    #[error("handler timeout on channel '{channel}' for message {message_id} after {timeout:?}")]
    HandlerTimeout {
        /// The channel the message was delivered on.
        channel: String,
        /// The timed-out envelope's id.
        message_id: u64,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The subscription's queue was closed by the `FailSubscription`
    /// backpressure strategy.
    #[error("subscription '{name}' failed: {reason}")]
    FailedSubscription {
        /// The subscription's display name.
        name: String,
        /// Why it failed.
        reason: String,
    },

    /// A user handler panicked or returned an error.
    #[error("handler exception on channel '{channel}': {reason}")]
    HandlerException {
        /// The channel the message was delivered on.
        channel: String,
        /// The handler's failure message.
        reason: String,
    },

    /// The configured `maxChannels` limit would be exceeded by this creation.
    #[error("maximum channel count of {max} exceeded")]
    MaxChannelsExceeded {
        /// The configured limit.
        max: usize,
    },

    /// A `CrossBarConfig` or `SubscribeOptions` value failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}
