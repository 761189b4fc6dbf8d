// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! [`CrossBar`], the façade described in spec §4.1.
//!
//! Validates inputs, creates channels lazily on first publish or subscribe,
//! enforces type identity per channel, fans out to direct and wildcard
//! subscribers, manages the wildcard registry, and orchestrates teardown.
//! Everything else in this crate (channel registry entries, the per-
//! subscription pipeline, the wildcard matcher) is a collaborator `CrossBar`
//! owns and coordinates; this module is where the operations spec §4.1 names
//! actually live.

use std::{
    future::Future,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use berberis_core::{Clock, clock::SystemClock, drop::CleanDrop};
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    channel::{Channel, fan_out},
    config::{CrossBarConfig, SubscribeOptions},
    envelope::{Envelope, MessageType, PublishMeta},
    error::CrossBarError,
    events::{LifecycleEvent, TerminationReason, TraceEvent},
    ids::{SequenceGenerator, next_correlation_id},
    matching,
    name::{ChannelName, Pattern},
    pipeline::{self, PipelineConfig, TraceSink},
    stats::SubscriptionStatsSnapshot,
    subscription::{
        BoxError, HandlerFn, OnTimeoutFn, PipelineState, SubscriptionCore, SubscriptionTarget,
        new_queue,
    },
    system,
    wildcard::WildcardRegistry,
};

/// A point-in-time view of one registered subscription (spec §4.1
/// `GetChannelSubscriptions`).
#[derive(Debug, Clone)]
pub struct SubscriptionSnapshot {
    /// The subscription's unique id.
    pub id: u64,
    /// Display name (user-supplied name plus id).
    pub display_name: String,
    /// String form of the channel name or wildcard pattern targeted.
    pub target: String,
    /// Whether the target is a wildcard pattern.
    pub is_wildcard: bool,
    /// Whether the subscription is on a system channel.
    pub is_system: bool,
    /// When the subscription was registered.
    pub subscribed_on: chrono::DateTime<Utc>,
    /// The pipeline's current lifecycle state.
    pub state: PipelineState,
    /// Whether the subscription is currently suspended.
    pub is_suspended: bool,
}

/// An opaque handle to one live subscription, returned by
/// [`CrossBar::subscribe`].
///
/// Carries enough to dispose, suspend/resume, and read statistics without
/// handing the caller access to the ingress queue itself (that remains the
/// pipeline task's exclusive property, spec §3 invariant).
pub struct SubscriptionHandle<T> {
    core: Arc<SubscriptionCore<T>>,
    clock: Arc<dyn Clock>,
}

impl<T> std::fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.core.id())
            .field("state", &self.core.state())
            .finish()
    }
}

impl<T> SubscriptionHandle<T> {
    /// The subscription's unique, monotonic id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.core.id()
    }

    /// The subscription's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.core.display_name()
    }

    /// The pipeline's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.core.state()
    }

    /// Requests teardown. Idempotent (spec §4.3 "Dispose is idempotent").
    /// Does not block on the pipeline task finishing; see
    /// [`CrossBar::dispose`] for a variant that awaits full quiescence.
    pub fn dispose(&self) {
        self.core.request_dispose();
    }

    /// Pauses handler invocation (spec §4.3 suspension contract). The
    /// dequeue loop keeps accepting envelopes while suspended.
    pub fn suspend(&self) {
        self.core.suspend();
    }

    /// Resumes handler invocation.
    pub fn resume(&self) {
        self.core.resume();
    }

    /// Whether the subscription is currently suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.core.is_suspended()
    }

    /// Returns a statistics snapshot (spec §4.5 `GetStats`), optionally
    /// resetting the interval window used to compute rates.
    #[must_use]
    pub fn stats_snapshot(&self, reset: bool) -> SubscriptionStatsSnapshot {
        self.core.stats_snapshot(self.clock.now_ns().as_u64(), reset)
    }
}

impl<T> CleanDrop for SubscriptionHandle<T> {
    /// Requests teardown (idempotent; see [`SubscriptionHandle::dispose`]).
    /// Breaks the cycle in spec §9 ("subscriptions hold a back reference to
    /// the CrossBar"): the pipeline task's `unregister` closure only holds a
    /// `Weak<CrossBar>`, but a caller that drops every handle without ever
    /// calling `dispose` would otherwise leak a running pipeline task
    /// forever. This runs that request from `Drop` as a last resort.
    fn clean_drop(&mut self) {
        self.core.request_dispose();
    }
}

impl<T> Drop for SubscriptionHandle<T> {
    fn drop(&mut self) {
        self.clean_drop();
    }
}

/// The in-process, typed publish/subscribe message bus (spec §1, §4.1).
pub struct CrossBar {
    config: CrossBarConfig,
    clock: Arc<dyn Clock>,
    channels: DashMap<ChannelName, Arc<Channel>>,
    wildcards: WildcardRegistry,
    subscription_ids: SequenceGenerator,
    tasks: DashMap<u64, tokio::task::JoinHandle<()>>,
    disposed: AtomicBool,
    trace_channel: ChannelName,
    lifecycle_channel: Option<ChannelName>,
    /// Weak self-reference, used only to hand the pipeline a
    /// `Weak<dyn TraceSink>` without a strong back-reference cycle (spec §9
    /// "Cyclic ownership").
    self_ref: Weak<CrossBar>,
}

impl std::fmt::Debug for CrossBar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossBar")
            .field("channels", &self.channels.len())
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CrossBar {
    /// Constructs a new `CrossBar` with the given configuration and clock
    /// (spec §9: "the clock source... must be modelled as an explicit
    /// dependency injected into the CrossBar on construction").
    ///
    /// The trace system channel (`<prefix>message.traces`) is always created
    /// eagerly; the lifecycle channel (`<prefix>lifecycle`) is created
    /// eagerly only if `config.enable_lifecycle_tracking` is set (spec §6).
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: CrossBarConfig, clock: Arc<dyn Clock>) -> Result<Arc<Self>, CrossBarError> {
        config.validate()?;
        let trace_channel =
            system::trace_channel_name(&config.system_channel_prefix, config.max_channel_name_length)?;
        let lifecycle_channel = if config.enable_lifecycle_tracking {
            Some(system::lifecycle_channel_name(
                &config.system_channel_prefix,
                config.max_channel_name_length,
            )?)
        } else {
            None
        };

        let bar = Arc::new_cyclic(|self_ref| {
            let channels = DashMap::new();
            channels.insert(trace_channel, Arc::new(Channel::new::<TraceEvent>(trace_channel)));
            if let Some(lifecycle_channel) = lifecycle_channel {
                channels.insert(
                    lifecycle_channel,
                    Arc::new(Channel::new::<LifecycleEvent>(lifecycle_channel)),
                );
            }
            Self {
                config,
                clock,
                channels,
                wildcards: WildcardRegistry::new(),
                subscription_ids: SequenceGenerator::new(),
                tasks: DashMap::new(),
                disposed: AtomicBool::new(false),
                trace_channel,
                lifecycle_channel,
                self_ref: self_ref.clone(),
            }
        });
        Ok(bar)
    }

    /// Constructs a new `CrossBar` backed by a real-time
    /// [`berberis_core::clock::SystemClock`].
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new_with_system_clock(config: CrossBarConfig) -> Result<Arc<Self>, CrossBarError> {
        Self::new(config, Arc::new(SystemClock::new()))
    }

    fn check_disposed(&self) -> Result<(), CrossBarError> {
        if self.disposed.load(Ordering::Acquire) {
            Err(CrossBarError::ObjectDisposed)
        } else {
            Ok(())
        }
    }

    fn now_ticks(&self) -> u64 {
        self.clock.now_ns().as_u64()
    }

    fn is_system_name(&self, raw: &str) -> bool {
        raw.starts_with(&self.config.system_channel_prefix)
    }

    /// Returns (lazily creating, single-winner) the channel named `name`
    /// with payload type `T`, failing if a channel already exists with a
    /// different type (spec §4.1 "lazy single-winner creation protocol").
    fn get_or_create_channel<T: Send + Sync + 'static>(
        &self,
        name: ChannelName,
    ) -> Result<Arc<Channel>, CrossBarError> {
        if let Some(existing) = self.channels.get(&name) {
            existing.check_type::<T>()?;
            return Ok(existing.clone());
        }
        if let Some(max) = self.config.max_channels
            && self.channels.len() >= max
        {
            return Err(CrossBarError::MaxChannelsExceeded { max });
        }
        let created = Arc::new(Channel::new::<T>(name));
        let channel = match self.channels.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(created.clone());
                self.wildcards.attach_new_channel(name, &created);
                self.publish_lifecycle(LifecycleEvent::ChannelCreated { channel: name.to_string() });
                created
            }
        };
        channel.check_type::<T>()?;
        Ok(channel)
    }

    /// Publishes `body` on `channel` (spec §4.1 `Publish`, fan-out algorithm
    /// steps 1-5).
    ///
    /// Completes synchronously once enqueue attempts to all subscribers have
    /// been made; does not wait for handler execution.
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::ObjectDisposed`] if the bar has been
    /// disposed, [`CrossBarError::InvalidChannelName`] if `channel` fails
    /// name validation, [`CrossBarError::TypeMismatch`] if the channel
    /// already exists with a different payload type, or
    /// [`CrossBarError::PublishFailure`] if `store` is set without a
    /// non-empty `meta.key`.
    pub fn publish<T>(&self, channel: &str, body: T, store: bool, meta: PublishMeta) -> Result<(), CrossBarError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.check_disposed()?;
        let name = ChannelName::try_new(channel, self.config.max_channel_name_length)?;
        if store && meta.key.as_deref().is_none_or(str::is_empty) {
            return Err(CrossBarError::PublishFailure {
                channel: name.to_string(),
                reason: "store=true requires a non-empty key".to_string(),
            });
        }

        let chan = self.get_or_create_channel::<T>(name)?;
        chan.ensure_delete_notifier::<T>();
        let now = self.now_ticks();
        let env = Envelope {
            id: chan.next_message_id(),
            timestamp_utc: Utc::now(),
            message_type: MessageType::ChannelUpdate,
            correlation_id: meta.correlation_id.unwrap_or_else(next_correlation_id),
            key: meta.key.clone(),
            inception_ticks: now,
            from: meta.from.clone(),
            body,
            tag: meta.tag.clone(),
            channel_name: Some(name),
        };

        chan.record_publish(now, meta.from.as_deref());
        chan.record_last_envelope(&env);
        if store {
            chan.value_store::<T>().update(env.clone());
        }

        let outcome = fan_out(&chan, &env, self.config.enable_publish_logging);
        debug!(
            channel = %name,
            delivered = outcome.delivered,
            dropped = outcome.dropped,
            newly_failed = outcome.newly_failed,
            "publish fan-out complete"
        );
        Ok(())
    }

    /// Validates and resolves a `subscribe` target, returning whether it is
    /// a wildcard pattern and whether it is a system channel.
    fn resolve_target(&self, raw: &str) -> Result<(bool, bool), CrossBarError> {
        let is_wildcard = Pattern::is_wildcard(raw);
        let is_system = self.is_system_name(raw);
        if is_wildcard && is_system {
            return Err(CrossBarError::InvalidSubscription {
                reason: format!("'{raw}' is a system channel and cannot be wildcard-subscribed"),
            });
        }
        Ok((is_wildcard, is_system))
    }

    /// Subscribes `handler` to `channel_or_pattern` (spec §4.1 `Subscribe`).
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::ObjectDisposed`] if the bar has been
    /// disposed, [`CrossBarError::InvalidSubscription`] for a wildcard
    /// pattern on a system channel or a subscribe to a non-existent system
    /// channel, [`CrossBarError::TypeMismatch`] if the channel already
    /// exists with a different payload type, or [`CrossBarError::InvalidConfig`]
    /// if `options` fails validation.
    pub fn subscribe<T, F, Fut>(
        self: &Arc<Self>,
        channel_or_pattern: &str,
        mut handler: F,
        options: SubscribeOptions,
    ) -> Result<SubscriptionHandle<T>, CrossBarError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut(Envelope<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let boxed: HandlerFn<T> = Box::new(move |env: Envelope<T>| -> crate::subscription::HandlerFuture {
            Box::pin(handler(env))
        });
        self.subscribe_with_timeout(channel_or_pattern, boxed, options, None)
    }

    /// As [`CrossBar::subscribe`], with an `onTimeout` callback invoked
    /// synchronously whenever `options.handler_timeout_ms` elapses (spec
    /// §4.4 `onTimeout`).
    ///
    /// # Errors
    ///
    /// See [`CrossBar::subscribe`].
    pub fn subscribe_with_on_timeout<T, F, Fut>(
        self: &Arc<Self>,
        channel_or_pattern: &str,
        mut handler: F,
        options: SubscribeOptions,
        on_timeout: OnTimeoutFn,
    ) -> Result<SubscriptionHandle<T>, CrossBarError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut(Envelope<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let boxed: HandlerFn<T> = Box::new(move |env: Envelope<T>| -> crate::subscription::HandlerFuture {
            Box::pin(handler(env))
        });
        self.subscribe_with_timeout(channel_or_pattern, boxed, options, Some(on_timeout))
    }

    fn subscribe_with_timeout<T>(
        self: &Arc<Self>,
        channel_or_pattern: &str,
        handler: HandlerFn<T>,
        options: SubscribeOptions,
        on_timeout: Option<OnTimeoutFn>,
    ) -> Result<SubscriptionHandle<T>, CrossBarError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.check_disposed()?;
        options.validate()?;
        let (is_wildcard, is_system) = self.resolve_target(channel_or_pattern)?;

        // Per-subscription options fall back to the bar's configured
        // defaults wherever the caller left them unset (spec §4.4 "Default
        // ... for subscriptions that don't override it").
        let slow_consumer_strategy = options.slow_consumer_strategy.unwrap_or(self.config.default_slow_consumer_strategy);
        let conflation_interval_ms = options.conflation_interval_ms.unwrap_or(self.config.default_conflation_interval_ms);
        let stats_options = options.stats_options.unwrap_or(self.config.default_stats_options);
        let requested_buffer_capacity = options.buffer_capacity.unwrap_or(self.config.default_buffer_capacity);

        let id = self.subscription_ids.next_value();
        let display_name = match &options.subscription_name {
            Some(name) => format!("{name}-{id}"),
            None => format!("sub-{id}"),
        };
        let buffer_capacity = if is_system {
            Some(self.config.system_channel_buffer_capacity)
        } else {
            requested_buffer_capacity
        };
        let (sender, receiver) = new_queue::<T>(buffer_capacity);
        let subscribed_on = Utc::now();
        let now = self.now_ticks();

        let target = if is_wildcard {
            SubscriptionTarget::Wildcard(Pattern::try_new(channel_or_pattern)?)
        } else {
            SubscriptionTarget::Channel(ChannelName::try_new(
                channel_or_pattern,
                self.config.max_channel_name_length,
            )?)
        };

        let core = Arc::new(SubscriptionCore::<T>::new(
            id,
            display_name.clone(),
            target,
            is_system,
            slow_consumer_strategy,
            sender,
            stats_options,
            now,
            subscribed_on,
        ));

        let (initial_state, direct_channel_name) = match target {
            SubscriptionTarget::Wildcard(pattern) => {
                self.wildcards.register::<T>(id, pattern, core.clone());
                self.wildcards.attach_to_existing(id, &self.channels);
                let initial_state = if options.fetch_state {
                    self.gather_wildcard_initial_state::<T>(&pattern)
                } else {
                    Vec::new()
                };
                (initial_state, None)
            }
            SubscriptionTarget::Channel(name) => {
                let chan = if is_system {
                    let Some(existing) = self.channels.get(&name) else {
                        return Err(CrossBarError::InvalidSubscription {
                            reason: format!("system channel '{name}' does not exist"),
                        });
                    };
                    existing.check_type::<T>()?;
                    existing.clone()
                } else {
                    self.get_or_create_channel::<T>(name)?
                };
                chan.ensure_delete_notifier::<T>();
                chan.insert_subscription(id, core.clone());
                let initial_state = if options.fetch_state {
                    chan.value_store::<T>().snapshot().into_iter().map(|arc| (*arc).clone()).collect()
                } else {
                    Vec::new()
                };
                (initial_state, Some(name))
            }
        };

        self.publish_lifecycle(LifecycleEvent::SubscriptionCreated {
            subscription: display_name.clone(),
            target: channel_or_pattern.to_string(),
        });

        let trace: Weak<dyn TraceSink> = self.self_ref.clone();
        let unregister_id = id;
        let unregister_bar: Weak<CrossBar> = self.self_ref.clone();
        let unregister_core = core.clone();
        let unregister_display_name = display_name.clone();

        let cfg = PipelineConfig {
            subscription: core.clone(),
            receiver,
            initial_state,
            conflation_interval_ms,
            handler,
            handler_timeout: options.handler_timeout_ms.map(std::time::Duration::from_millis),
            on_timeout,
            clock: self.clock.clone(),
            channel_name: channel_or_pattern.to_string(),
            trace,
            message_tracing_enabled: self.config.enable_message_tracing,
            is_system,
            unregister: Box::new(move || {
                let Some(bar) = unregister_bar.upgrade() else {
                    return;
                };
                bar.tasks.remove(&unregister_id);
                let reason = match unregister_core.state() {
                    PipelineState::Failing => TerminationReason::Failed,
                    PipelineState::ChannelDeleted => TerminationReason::ChannelDeleted,
                    _ => TerminationReason::Disposed,
                };
                if let Some(name) = direct_channel_name {
                    if let Some(channel) = bar.channels.get(&name) {
                        channel.remove_subscription(unregister_id);
                    }
                } else {
                    for channel_name in bar.wildcards.unregister(unregister_id) {
                        if let Some(channel) = bar.channels.get(&channel_name) {
                            channel.remove_subscription(unregister_id);
                        }
                    }
                }
                bar.publish_lifecycle(LifecycleEvent::SubscriptionTerminated {
                    subscription: unregister_display_name.clone(),
                    reason,
                });
            }),
        };

        let handle = tokio::task::spawn(pipeline::run(cfg));
        self.tasks.insert(id, handle);

        Ok(SubscriptionHandle { core, clock: self.clock.clone() })
    }

    /// For a freshly registered wildcard subscription that requested
    /// `fetchState`, gathers the value-store snapshot of every
    /// already-matching channel at subscribe time (an extension of spec
    /// §4.4's `fetchState`, which only names "the channel's value-store
    /// snapshot" for a direct subscription — see `DESIGN.md` for why this is
    /// the natural generalisation to a pattern).
    fn gather_wildcard_initial_state<T: Clone + Send + Sync + 'static>(&self, pattern: &Pattern) -> Vec<Envelope<T>> {
        let mut out = Vec::new();
        for entry in &self.channels {
            if matching::is_match(pattern, entry.key()) && entry.value().check_type::<T>().is_ok() {
                out.extend(entry.value().value_store::<T>().snapshot().into_iter().map(|arc| (*arc).clone()));
            }
        }
        out
    }

    /// Returns the channel's value-store snapshot (spec §4.1
    /// `GetChannelState`).
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::ObjectDisposed`], [`CrossBarError::InvalidChannelName`],
    /// or [`CrossBarError::TypeMismatch`].
    pub fn get_channel_state<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<Vec<Envelope<T>>, CrossBarError> {
        self.check_disposed()?;
        let name = ChannelName::try_new(name, self.config.max_channel_name_length)?;
        let Some(chan) = self.channels.get(&name) else {
            return Ok(Vec::new());
        };
        chan.check_type::<T>()?;
        Ok(chan.value_store::<T>().snapshot().into_iter().map(|arc| (*arc).clone()).collect())
    }

    /// Returns the envelope stored under `key` on `name`, if any (spec §4.1
    /// `TryGetMessage`).
    ///
    /// # Errors
    ///
    /// See [`CrossBar::get_channel_state`].
    pub fn try_get_message<T: Clone + Send + Sync + 'static>(
        &self,
        name: &str,
        key: &str,
    ) -> Result<Option<Envelope<T>>, CrossBarError> {
        self.check_disposed()?;
        let name = ChannelName::try_new(name, self.config.max_channel_name_length)?;
        let Some(chan) = self.channels.get(&name) else {
            return Ok(None);
        };
        chan.check_type::<T>()?;
        Ok(chan.value_store::<T>().try_get(key).map(|arc| (*arc).clone()))
    }

    /// Removes and returns the envelope stored under `key` on `name`, then
    /// best-effort publishes a `ChannelDelete` envelope carrying it to every
    /// direct subscriber (spec §4.1 `TryDeleteMessage`).
    ///
    /// # Errors
    ///
    /// See [`CrossBar::get_channel_state`].
    pub fn try_delete_message<T: Clone + Send + Sync + 'static>(&self, name: &str, key: &str) -> Result<bool, CrossBarError> {
        self.check_disposed()?;
        let channel_name = ChannelName::try_new(name, self.config.max_channel_name_length)?;
        let Some(chan) = self.channels.get(&channel_name) else {
            return Ok(false);
        };
        chan.check_type::<T>()?;
        let Some(removed) = chan.value_store::<T>().try_delete(key) else {
            return Ok(false);
        };

        let now = self.now_ticks();
        let env = Envelope {
            id: chan.next_message_id(),
            timestamp_utc: Utc::now(),
            message_type: MessageType::ChannelDelete,
            correlation_id: next_correlation_id(),
            key: Some(key.to_string()),
            inception_ticks: now,
            from: None,
            body: removed.body.clone(),
            tag: None,
            channel_name: Some(channel_name),
        };
        fan_out(&chan, &env, self.config.enable_publish_logging);
        Ok(true)
    }

    /// Clears `name`'s value store, then best-effort publishes a
    /// `ChannelReset` envelope carrying a representative (the first
    /// remaining) stored value (spec §4.1 `ResetChannel`). A channel whose
    /// store was already empty clears silently with no envelope (see
    /// `DESIGN.md`).
    ///
    /// # Errors
    ///
    /// See [`CrossBar::get_channel_state`].
    pub fn reset_channel<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<(), CrossBarError> {
        self.check_disposed()?;
        let channel_name = ChannelName::try_new(name, self.config.max_channel_name_length)?;
        let Some(chan) = self.channels.get(&channel_name) else {
            return Ok(());
        };
        chan.check_type::<T>()?;
        let representative = chan.value_store::<T>().snapshot().into_iter().next();
        chan.value_store::<T>().clear();

        if let Some(last) = representative {
            let now = self.now_ticks();
            let env = Envelope {
                id: chan.next_message_id(),
                timestamp_utc: Utc::now(),
                message_type: MessageType::ChannelReset,
                correlation_id: next_correlation_id(),
                key: None,
                inception_ticks: now,
                from: None,
                body: last.body.clone(),
                tag: None,
                channel_name: Some(channel_name),
            };
            fan_out(&chan, &env, self.config.enable_publish_logging);
        }
        Ok(())
    }

    /// Removes `name` from the registry. Every direct (non-wildcard)
    /// subscriber is notified with a best-effort `ChannelDelete` envelope
    /// and transitioned to `ChannelDeleted`; wildcard subscribers are left
    /// alive (spec §4.1 `TryDeleteChannel`).
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::ObjectDisposed`] or
    /// [`CrossBarError::InvalidChannelName`].
    pub fn try_delete_channel(&self, name: &str) -> Result<bool, CrossBarError> {
        self.check_disposed()?;
        let channel_name = ChannelName::try_new(name, self.config.max_channel_name_length)?;
        let Some((_, chan)) = self.channels.remove(&channel_name) else {
            return Ok(false);
        };
        chan.notify_deleted(self.now_ticks());
        self.publish_lifecycle(LifecycleEvent::ChannelDeleted { channel: channel_name.to_string() });
        Ok(true)
    }

    /// Returns every live, non-system channel name (spec §6: "`GetChannels()`
    /// must exclude system channels").
    #[must_use]
    pub fn get_channels(&self) -> Vec<ChannelName> {
        self.channels
            .iter()
            .map(|entry| *entry.key())
            .filter(|name| !name.is_system(&self.config.system_channel_prefix))
            .collect()
    }

    /// Returns a snapshot of every subscription currently registered on
    /// `name` (spec §4.1 `GetChannelSubscriptions`).
    #[must_use]
    pub fn get_channel_subscriptions(&self, name: &str) -> Vec<SubscriptionSnapshot> {
        let Ok(channel_name) = ChannelName::try_new(name, self.config.max_channel_name_length) else {
            return Vec::new();
        };
        let Some(chan) = self.channels.get(&channel_name) else {
            return Vec::new();
        };
        chan.subscription_metas()
            .into_iter()
            .map(|meta| SubscriptionSnapshot {
                id: meta.id(),
                display_name: meta.display_name().to_string(),
                target: meta.target().to_string(),
                is_wildcard: meta.target().is_wildcard(),
                is_system: meta.is_system(),
                subscribed_on: meta.subscribed_on(),
                state: meta.state(),
                is_suspended: meta.is_suspended(),
            })
            .collect()
    }

    /// Returns a fresh, random correlation id (spec §4.1
    /// `GetNextCorrelationId`).
    #[must_use]
    pub fn get_next_correlation_id(&self) -> Uuid {
        next_correlation_id()
    }

    /// Publishes a lifecycle event on the lifecycle system channel, if
    /// `enableLifecycleTracking` is set. A no-op otherwise. Best-effort:
    /// failures (which can only be backpressure on the system channel's
    /// subscribers) are logged, never surfaced.
    fn publish_lifecycle(&self, event: LifecycleEvent) {
        let Some(lifecycle_channel) = self.lifecycle_channel else {
            return;
        };
        if let Err(err) = self.publish(lifecycle_channel.as_str(), event, false, PublishMeta::default()) {
            warn!(error = %err, "failed to publish lifecycle event");
        }
    }

    /// Marks the bar disposed and disposes every subscription in every
    /// channel, awaiting each pipeline task's completion (spec §4.1
    /// `Dispose`). Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("disposing CrossBar");

        for chan in &self.channels {
            for meta in chan.value().subscription_metas() {
                meta.request_dispose();
            }
        }

        let ids: Vec<u64> = self.tasks.iter().map(|entry| *entry.key()).collect();
        let mut handles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, handle)) = self.tasks.remove(&id) {
                handles.push(handle);
            }
        }
        for handle in handles {
            let _ = handle.await;
        }

        self.channels.clear();
    }
}

impl TraceSink for CrossBar {
    fn publish_trace(&self, event: TraceEvent) {
        if let Err(err) = self.publish(self.trace_channel.as_str(), event, false, PublishMeta::default()) {
            warn!(error = %err, "failed to publish trace event");
        }
    }
}
