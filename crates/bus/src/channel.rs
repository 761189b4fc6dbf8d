// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The `Channel` registry entry (spec §3, §4.2).
//!
//! A `Channel` is not generic over its payload type at the Rust type level
//! (the registry holds `Arc<Channel>` in one `DashMap`, regardless of what
//! each channel happens to carry) — its payload type identity is instead a
//! runtime [`TypeId`] tag, checked once at registration and thereafter
//! trusted by every downcast (spec §9 "Dynamic typing / generic dispatch").

use std::{
    any::TypeId,
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::{
    envelope::{Envelope, MessageType},
    error::CrossBarError,
    ids::SequenceGenerator,
    name::ChannelName,
    stats::ChannelStatsTracker,
    subscription::{EnqueueOutcome, SubscriptionCore, SubscriptionMeta},
    value_store::ValueStore,
};

/// One registry entry: a payload-type-tagged fan-out endpoint (spec §4.2).
pub struct Channel {
    name: ChannelName,
    type_id: TypeId,
    type_name: &'static str,
    subscriptions: DashMap<u64, std::sync::Arc<dyn SubscriptionMeta>>,
    value_store: OnceLock<Box<dyn std::any::Any + Send + Sync>>,
    /// The most recently published envelope, type-erased behind the same
    /// `OnceLock<Box<dyn Any>>` pattern as `value_store`. Used to source a
    /// `body: T` for the `ChannelDelete`/`ChannelReset` notifications fanned
    /// out by `TryDeleteChannel`/`ResetChannel`, which are declared
    /// non-generic (or generic only over the caller's own `T`) over a
    /// channel registry that otherwise has no way to manufacture a `T` value
    /// out of thin air (spec §9's "Dynamic typing / generic dispatch",
    /// applied to the one operation that needs to *produce* a typed value
    /// rather than just route one) — see `DESIGN.md`.
    last_envelope: OnceLock<Box<dyn std::any::Any + Send + Sync>>,
    /// Type-erased closure that fans a `ChannelDelete` notification out to
    /// every direct (non-wildcard) subscriber and transitions each to
    /// `ChannelDeleted`; captured with `T` fixed the first time the channel
    /// is touched generically (see [`Channel::ensure_delete_notifier`]).
    delete_notifier: OnceLock<Box<dyn Fn(&Channel, u64) + Send + Sync>>,
    stats: ChannelStatsTracker,
    message_seq: SequenceGenerator,
    last_published_by: Mutex<Option<String>>,
    last_published_at_ticks: AtomicU64,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Creates a new, empty channel with payload type `T` fixed for its
    /// lifetime (spec §3 "T is immutable once the channel is created").
    #[must_use]
    pub(crate) fn new<T: 'static>(name: ChannelName) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            subscriptions: DashMap::new(),
            value_store: OnceLock::new(),
            last_envelope: OnceLock::new(),
            delete_notifier: OnceLock::new(),
            stats: ChannelStatsTracker::new(),
            message_seq: SequenceGenerator::new(),
            last_published_by: Mutex::new(None),
            last_published_at_ticks: AtomicU64::new(0),
        }
    }

    /// The channel's name.
    #[must_use]
    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// The channel's declared payload type name, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Verifies that `T` matches this channel's declared payload type.
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::TypeMismatch`] if `T` disagrees with the
    /// type this channel was created with.
    pub(crate) fn check_type<T: 'static>(&self) -> Result<(), CrossBarError> {
        if self.type_id == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(CrossBarError::TypeMismatch {
                channel: self.name.to_string(),
                expected: self.type_name.to_string(),
                actual: std::any::type_name::<T>().to_string(),
            })
        }
    }

    /// Whether `type_id` matches this channel's declared payload type.
    #[must_use]
    pub(crate) fn matches_type(&self, type_id: TypeId) -> bool {
        self.type_id == type_id
    }

    /// Returns (creating on first use) this channel's value store.
    ///
    /// # Panics
    ///
    /// Panics if `T` disagrees with the type tag established at channel
    /// creation; callers must call [`Channel::check_type`] first.
    pub(crate) fn value_store<T: Send + Sync + 'static>(&self) -> &ValueStore<T> {
        self.value_store
            .get_or_init(|| Box::new(ValueStore::<T>::new()))
            .downcast_ref::<ValueStore<T>>()
            .expect("value store type verified by check_type at the public API boundary")
    }

    /// Allocates the next per-channel monotonic message id.
    pub(crate) fn next_message_id(&self) -> u64 {
        self.message_seq.next_value()
    }

    /// Records (creating on first use) the most recently published envelope,
    /// so a later `ChannelDelete`/`ChannelReset` notification has a `T` value
    /// to carry as its body.
    pub(crate) fn record_last_envelope<T: Clone + Send + Sync + 'static>(&self, env: &Envelope<T>) {
        let cell = self
            .last_envelope
            .get_or_init(|| Box::new(Mutex::new(None::<Envelope<T>>)))
            .downcast_ref::<Mutex<Option<Envelope<T>>>>()
            .expect("type verified by check_type at the public API boundary");
        *cell.lock().unwrap_or_else(|p| p.into_inner()) = Some(env.clone());
    }

    fn last_body<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.last_envelope
            .get()?
            .downcast_ref::<Mutex<Option<Envelope<T>>>>()
            .expect("type verified by check_type at the public API boundary")
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|env| env.body.clone())
    }

    /// Ensures this channel can fan out a type-erased `ChannelDelete`
    /// notification (spec §4.1 `TryDeleteChannel`), capturing `T` the first
    /// time the channel is touched through a generic `publish`/`subscribe`
    /// call. A no-op after the first call (`OnceLock`).
    pub(crate) fn ensure_delete_notifier<T: Clone + Send + Sync + 'static>(&self) {
        self.delete_notifier.get_or_init(|| {
            Box::new(|channel: &Channel, now_ticks: u64| {
                let body = channel.last_body::<T>();
                for entry in &channel.subscriptions {
                    if entry.value().target().is_wildcard() {
                        continue;
                    }
                    let Some(sub) = entry.value().as_any().downcast_ref::<SubscriptionCore<T>>()
                    else {
                        continue;
                    };
                    if let Some(body) = &body {
                        let env = Envelope {
                            id: channel.next_message_id(),
                            timestamp_utc: Utc::now(),
                            message_type: MessageType::ChannelDelete,
                            correlation_id: Uuid::nil(),
                            key: None,
                            inception_ticks: now_ticks,
                            from: None,
                            body: body.clone(),
                            tag: None,
                            channel_name: Some(channel.name()),
                        };
                        let _ = sub.try_enqueue(env);
                    }
                    sub.mark_channel_deleted();
                }
            })
        });
    }

    /// Fans a `ChannelDelete` notification out to every direct subscriber
    /// and transitions each to `ChannelDeleted`. A no-op if the channel was
    /// never touched generically (no publish/subscribe ever ran, so no `T`
    /// was ever captured — in which case it also never had subscribers of a
    /// known type to notify).
    pub(crate) fn notify_deleted(&self, now_ticks: u64) {
        if let Some(notifier) = self.delete_notifier.get() {
            notifier(self, now_ticks);
        }
    }

    /// Records one publish (spec §4.5 per-channel tracker).
    pub(crate) fn record_publish(&self, now_ticks: u64, from: Option<&str>) {
        self.stats.record_publish(now_ticks);
        self.last_published_at_ticks.store(now_ticks, Ordering::Relaxed);
        if let Some(from) = from {
            *self.last_published_by.lock().unwrap_or_else(|p| p.into_inner()) = Some(from.to_string());
        }
    }

    /// The channel's publish-rate tracker.
    #[must_use]
    pub fn stats(&self) -> &ChannelStatsTracker {
        &self.stats
    }

    /// The most recent publisher's `from` metadata, if any publish supplied one.
    #[must_use]
    pub fn last_published_by(&self) -> Option<String> {
        self.last_published_by.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// The clock reading (nanoseconds) of the most recent publish.
    #[must_use]
    pub fn last_published_at_ticks(&self) -> u64 {
        self.last_published_at_ticks.load(Ordering::Relaxed)
    }

    /// Registers a subscription's core under `id`.
    pub(crate) fn insert_subscription<T: Send + Sync + 'static>(
        &self,
        id: u64,
        sub: std::sync::Arc<SubscriptionCore<T>>,
    ) {
        self.subscriptions.insert(id, sub as std::sync::Arc<dyn SubscriptionMeta>);
    }

    /// Removes a subscription by id. Returns whether an entry was removed.
    pub(crate) fn remove_subscription(&self, id: u64) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// The number of subscriptions currently registered on this channel
    /// (direct plus wildcard-attached).
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns a metadata snapshot for every subscription currently
    /// registered (for `GetChannelSubscriptions`, spec §4.1).
    pub(crate) fn subscription_metas(&self) -> Vec<std::sync::Arc<dyn SubscriptionMeta>> {
        self.subscriptions.iter().map(|entry| entry.value().clone()).collect()
    }
}

/// Outcome of one [`fan_out`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutStats {
    /// Number of subscriptions the envelope was successfully enqueued to.
    pub delivered: usize,
    /// Number of subscriptions the envelope was dropped for.
    pub dropped: usize,
    /// Number of subscriptions newly transitioned to `Failing` by this publish.
    pub newly_failed: usize,
}

/// Delivers `env` to every subscription currently registered on `channel`,
/// applying each subscription's backpressure strategy on failure (spec
/// §4.1 steps 2-4).
pub(crate) fn fan_out<T>(channel: &Channel, env: &Envelope<T>, publish_logging: bool) -> FanOutStats
where
    T: Clone + Send + Sync + 'static,
{
    let mut outcome = FanOutStats::default();
    for entry in &channel.subscriptions {
        let Some(sub) = entry.value().as_any().downcast_ref::<SubscriptionCore<T>>() else {
            continue;
        };
        match sub.try_enqueue(env.clone()) {
            EnqueueOutcome::Enqueued => {
                outcome.delivered += 1;
                if publish_logging {
                    trace!(
                        channel = %channel.name,
                        subscription = sub.display_name(),
                        message_id = env.id,
                        "enqueued"
                    );
                }
            }
            EnqueueOutcome::Conflated => {
                outcome.delivered += 1;
            }
            EnqueueOutcome::Dropped => {
                outcome.dropped += 1;
                warn!(
                    channel = %channel.name,
                    subscription = sub.display_name(),
                    "dropped message under backpressure (SkipUpdates)"
                );
            }
            EnqueueOutcome::JustFailed => {
                outcome.newly_failed += 1;
                warn!(
                    channel = %channel.name,
                    subscription = sub.display_name(),
                    "subscription failed under backpressure (FailSubscription)"
                );
            }
            EnqueueOutcome::AlreadyFailed => {}
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        config::SlowConsumerStrategy,
        envelope::{Envelope, MessageType},
        stats::StatsOptions,
        subscription::{SubscriptionCore, SubscriptionTarget, new_queue},
    };

    fn chan_name(raw: &str) -> ChannelName {
        ChannelName::try_new(raw, 256).unwrap()
    }

    fn envelope(id: u64, key: Option<&str>) -> Envelope<u64> {
        let mut env = Envelope::new(id, Utc::now(), MessageType::ChannelUpdate);
        env.id = id;
        env.key = key.map(str::to_string);
        env
    }

    fn subscribe(
        channel: &Channel,
        id: u64,
        capacity: usize,
        strategy: SlowConsumerStrategy,
    ) -> std::sync::Arc<SubscriptionCore<u64>> {
        let (tx, _rx) = new_queue::<u64>(Some(capacity));
        let sub = std::sync::Arc::new(SubscriptionCore::<u64>::new(
            id,
            format!("sub-{id}"),
            SubscriptionTarget::Channel(channel.name()),
            false,
            strategy,
            tx,
            StatsOptions::default(),
            0,
            Utc::now(),
        ));
        channel.insert_subscription(id, sub.clone());
        sub
    }

    #[test]
    fn fan_out_skip_updates_drops_once_full() {
        let channel = Channel::new::<u64>(chan_name("t"));
        let sub = subscribe(&channel, 1, 1, SlowConsumerStrategy::SkipUpdates);

        let first = fan_out(&channel, &envelope(1, None), false);
        assert_eq!(first.delivered, 1);
        assert_eq!(first.dropped, 0);

        // The one-slot queue is now full: the next envelope must be dropped,
        // not block the publisher or fail the subscription (spec §8 property 7).
        let second = fan_out(&channel, &envelope(2, None), false);
        assert_eq!(second.delivered, 0);
        assert_eq!(second.dropped, 1);
        assert_eq!(sub.state(), crate::subscription::PipelineState::Created);
    }

    #[test]
    fn fan_out_fail_subscription_fails_once_on_first_overflow() {
        let channel = Channel::new::<u64>(chan_name("t"));
        let sub = subscribe(&channel, 1, 1, SlowConsumerStrategy::FailSubscription);
        sub.start();

        let first = fan_out(&channel, &envelope(1, None), false);
        assert_eq!(first.delivered, 1);

        // First overflow fails the subscription (spec §8 property 8).
        let second = fan_out(&channel, &envelope(2, None), false);
        assert_eq!(second.newly_failed, 1);
        assert_eq!(sub.state(), crate::subscription::PipelineState::Failing);

        // A further publish must not raise to the caller nor re-fail it.
        let third = fan_out(&channel, &envelope(3, None), false);
        assert_eq!(third.delivered, 0);
        assert_eq!(third.dropped, 0);
        assert_eq!(third.newly_failed, 0);
    }

    #[test]
    fn fan_out_conflate_and_skip_updates_replaces_latest_by_key() {
        let channel = Channel::new::<u64>(chan_name("t"));
        let sub = subscribe(&channel, 1, 1, SlowConsumerStrategy::ConflateAndSkipUpdates);

        // Fill the one-slot queue, then overflow twice on the same key: the
        // side buffer must retain only the latest value for that key.
        fan_out(&channel, &envelope(1, Some("k1")), false);
        fan_out(&channel, &envelope(2, Some("k1")), false);
        fan_out(&channel, &envelope(3, Some("k1")), false);

        let backlog = sub.drain_conflate_backlog();
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].id, 3);
    }

    #[test]
    fn fan_out_conflate_and_skip_updates_drops_keyless_overflow() {
        let channel = Channel::new::<u64>(chan_name("t"));
        let sub = subscribe(&channel, 1, 1, SlowConsumerStrategy::ConflateAndSkipUpdates);

        fan_out(&channel, &envelope(1, None), false);
        let overflow = fan_out(&channel, &envelope(2, None), false);
        assert_eq!(overflow.dropped, 1);
        assert!(sub.drain_conflate_backlog().is_empty());
    }
}
