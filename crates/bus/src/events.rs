// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The fixed payload types re-published onto the core's own system channels
//! (spec §6 "Default trace channel name" / "Default lifecycle channel name").
//!
//! These are the *only* two payload types the core itself ever publishes;
//! every other channel's type is chosen by its first publisher or
//! subscriber. Trace/lifecycle publishers external to the core (named out
//! of scope in spec.md §1) would publish further instances of these same
//! types onto the same system channels using the ordinary `publish` API.

use std::time::Duration;

/// Re-published whenever a subscription's handler finishes one envelope
/// (spec §4.3 step 5, "publish a `SubscriptionProcessed` trace event").
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// A subscriber's handler finished processing one envelope.
    SubscriptionProcessed {
        /// The channel the envelope was delivered on.
        channel: String,
        /// The subscription's display name.
        subscription: String,
        /// Handler invocation duration, in nanoseconds.
        service_ns: u64,
    },
}

/// Re-published on the lifecycle system channel when
/// `enableLifecycleTracking` is set (spec §2 item 7, §6).
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A channel was created (lazily, on first publish or subscribe).
    ChannelCreated {
        /// The new channel's name.
        channel: String,
    },
    /// A channel was removed from the registry.
    ChannelDeleted {
        /// The removed channel's name.
        channel: String,
    },
    /// A subscription was registered.
    SubscriptionCreated {
        /// The subscription's display name.
        subscription: String,
        /// The channel name or wildcard pattern it targets.
        target: String,
    },
    /// A subscription's pipeline task terminated.
    SubscriptionTerminated {
        /// The subscription's display name.
        subscription: String,
        /// Why the pipeline stopped.
        reason: TerminationReason,
    },
}

/// Why a subscription's pipeline task stopped (spec §4.3 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The caller disposed the subscription explicitly.
    Disposed,
    /// The `FailSubscription` backpressure strategy closed the queue.
    Failed,
    /// The channel was deleted.
    ChannelDeleted,
    /// The whole CrossBar was disposed.
    BarDisposed,
}

/// A handler timeout observation, passed to a subscription's `onTimeout`
/// callback (spec §4.6, Scenario F).
#[derive(Debug, Clone)]
pub struct HandlerTimeoutEvent {
    /// The channel the timed-out message was delivered on.
    pub channel_name: String,
    /// The timed-out envelope's id.
    pub message_id: u64,
    /// The configured handler timeout.
    pub timeout: Duration,
}
