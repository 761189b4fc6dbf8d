// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The `Subscription<T>` entity and its ingress queue (spec §3, §4.3, §4.4).
//!
//! `SubscriptionCore<T>` is the shared, `Arc`-owned state a publisher's
//! fan-out and the owning pipeline task both touch: the queue sender, the
//! backpressure strategy, the suspension flag, and the statistics tracker.
//! The pipeline task itself (the sole queue consumer) lives in
//! [`crate::pipeline`]; `SubscriptionCore` never reads its own queue.

use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{Notify, mpsc};

use crate::{
    config::SlowConsumerStrategy,
    envelope::Envelope,
    events::HandlerTimeoutEvent,
    name::{ChannelName, Pattern},
    stats::{StatsOptions, SubscriptionStatsSnapshot, SubscriptionStatsTracker},
};

/// A boxed, `Send + Sync` error, used for handler failures (spec §4.6
/// `HandlerException`).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The future a subscription handler returns.
pub type HandlerFuture = BoxFuture<'static, Result<(), BoxError>>;

/// A subscription's user-supplied message handler.
///
/// Boxed and type-erased at the `FnMut` level (not at the `T` level) so the
/// pipeline task can invoke it repeatedly without re-acquiring generic
/// context; never invoked concurrently with itself (spec §3 invariant,
/// §8 property 6).
pub type HandlerFn<T> = Box<dyn FnMut(Envelope<T>) -> HandlerFuture + Send + 'static>;

/// A subscription's `onTimeout` callback (spec §4.4); invoked synchronously,
/// must be fast.
pub type OnTimeoutFn = Box<dyn Fn(HandlerTimeoutEvent) + Send + Sync + 'static>;

/// What a subscription is bound to: a single channel name, or a wildcard
/// pattern (spec §3 "Wildcard pattern").
#[derive(Debug, Clone, Copy)]
pub enum SubscriptionTarget {
    /// Bound to exactly one channel name.
    Channel(ChannelName),
    /// Bound to a wildcard pattern, matching any current or future channel.
    Wildcard(Pattern),
}

impl SubscriptionTarget {
    /// Returns whether this target is a wildcard pattern.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

impl fmt::Display for SubscriptionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(name) => write!(f, "{name}"),
            Self::Wildcard(pattern) => write!(f, "{pattern}"),
        }
    }
}

/// The ingress queue's sending half; bounded or unbounded depending on
/// `bufferCapacity` (spec §4.4).
pub(crate) enum QueueSender<T> {
    Bounded(mpsc::Sender<Envelope<T>>),
    Unbounded(mpsc::UnboundedSender<Envelope<T>>),
}

impl<T> QueueSender<T> {
    /// Attempts a non-blocking enqueue, returning the envelope back on
    /// failure (queue full, or the receiver has gone away).
    pub(crate) fn try_send(&self, env: Envelope<T>) -> Result<(), Envelope<T>> {
        match self {
            Self::Bounded(tx) => tx.try_send(env).map_err(|err| match err {
                mpsc::error::TrySendError::Full(env) | mpsc::error::TrySendError::Closed(env) => {
                    env
                }
            }),
            Self::Unbounded(tx) => tx.send(env).map_err(|err| err.0),
        }
    }
}

/// The ingress queue's receiving half, owned exclusively by the pipeline
/// task (spec §3 invariant: "exactly one consumer task reads its queue").
pub(crate) enum QueueReceiver<T> {
    Bounded(mpsc::Receiver<Envelope<T>>),
    Unbounded(mpsc::UnboundedReceiver<Envelope<T>>),
}

impl<T> QueueReceiver<T> {
    pub(crate) async fn recv(&mut self) -> Option<Envelope<T>> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Option<Envelope<T>> {
        match self {
            Self::Bounded(rx) => rx.try_recv().ok(),
            Self::Unbounded(rx) => rx.try_recv().ok(),
        }
    }
}

/// Constructs a queue pair for the given capacity (`None` ⇒ unbounded).
pub(crate) fn new_queue<T>(capacity: Option<usize>) -> (QueueSender<T>, QueueReceiver<T>) {
    match capacity {
        Some(n) => {
            let (tx, rx) = mpsc::channel(n);
            (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
    }
}

/// Outcome of a single fan-out enqueue attempt against one subscription
/// (spec §4.1 steps 3-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Enqueued directly onto the ingress queue.
    Enqueued,
    /// Accepted into the conflate-on-backpressure side buffer (strategy
    /// `ConflateAndSkipUpdates`, keyed envelope).
    Conflated,
    /// Dropped: queue was full and the strategy is `SkipUpdates`, or the
    /// strategy is `ConflateAndSkipUpdates` but the envelope had no key.
    Dropped,
    /// The subscription was just transitioned to `Failing` by this
    /// enqueue attempt (strategy `FailSubscription`).
    JustFailed,
    /// The subscription had already failed; this envelope was not
    /// delivered and no new transition occurred.
    AlreadyFailed,
}

/// The pipeline's lifecycle state (spec §4.3 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Constructed, task not yet started.
    Created,
    /// Task started, actively consuming the queue.
    Running,
    /// User called `Dispose`; draining in progress.
    Draining,
    /// `FailSubscription` backpressure closed the queue.
    Failing,
    /// The channel was deleted.
    ChannelDeleted,
    /// The pipeline task has exited.
    Terminated,
}

/// Triggers driving [`PipelineState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineTrigger {
    /// The pipeline task has begun running.
    Start,
    /// The caller (or CrossBar dispose) requested teardown.
    Dispose,
    /// A bounded queue filled and the strategy is `FailSubscription`.
    BackpressureFail,
    /// The channel was removed from the registry.
    ChannelDeleted,
    /// The pipeline task has finished draining and is about to exit.
    Finish,
}

pub(crate) fn pipeline_transition_table()
-> std::collections::HashMap<(PipelineState, PipelineTrigger), PipelineState> {
    use PipelineState::{ChannelDeleted, Created, Draining, Failing, Running, Terminated};
    use PipelineTrigger::{
        BackpressureFail, ChannelDeleted as ChannelDeletedTrigger, Dispose, Finish, Start,
    };

    let mut table = std::collections::HashMap::new();
    table.insert((Created, Start), Running);
    table.insert((Running, Dispose), Draining);
    table.insert((Running, BackpressureFail), Failing);
    table.insert((Running, ChannelDeletedTrigger), ChannelDeleted);
    table.insert((Draining, Finish), Terminated);
    table.insert((Failing, Finish), Terminated);
    table.insert((ChannelDeleted, Finish), Terminated);
    table
}

fn pipeline_state_str(state: PipelineState) -> String {
    format!("{state:?}")
}

fn pipeline_trigger_str(trigger: PipelineTrigger) -> String {
    format!("{trigger:?}")
}

/// The shared state of one subscription, touched by both publishers (via
/// fan-out) and the owning pipeline task.
///
/// Everything here must remain valid and race-free under concurrent
/// publishes from many threads; the queue itself is the only piece the
/// pipeline task exclusively owns (and it is moved out, not stored here,
/// see [`crate::pipeline::spawn`]).
pub struct SubscriptionCore<T> {
    id: u64,
    display_name: String,
    target: SubscriptionTarget,
    is_system: bool,
    slow_consumer_strategy: SlowConsumerStrategy,
    sender: QueueSender<T>,
    suspended: AtomicBool,
    resume_notify: ArcSwap<Notify>,
    conflate_backlog: DashMap<String, Envelope<T>>,
    pub(crate) backlog_notify: Notify,
    /// Woken whenever the pipeline state transitions away from `Running`
    /// (dispose, backpressure failure, or channel deletion); the pipeline
    /// task re-reads [`Self::state`] on wake to decide how to stop.
    pub(crate) lifecycle_notify: Notify,
    stats: SubscriptionStatsTracker,
    subscribed_on: DateTime<Utc>,
    state: Mutex<berberis_core::fsm::FiniteStateMachine<PipelineState, PipelineTrigger>>,
}

impl<T> fmt::Debug for SubscriptionCore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionCore")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("target", &self.target)
            .field("is_system", &self.is_system)
            .finish_non_exhaustive()
    }
}

impl<T> SubscriptionCore<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: u64,
        display_name: String,
        target: SubscriptionTarget,
        is_system: bool,
        slow_consumer_strategy: SlowConsumerStrategy,
        sender: QueueSender<T>,
        stats_options: StatsOptions,
        now_ticks: u64,
        subscribed_on: DateTime<Utc>,
    ) -> Self {
        let table = pipeline_transition_table();
        Self {
            id,
            display_name,
            target,
            is_system,
            slow_consumer_strategy,
            sender,
            suspended: AtomicBool::new(false),
            resume_notify: ArcSwap::from_pointee(Notify::new()),
            conflate_backlog: DashMap::new(),
            backlog_notify: Notify::new(),
            lifecycle_notify: Notify::new(),
            stats: SubscriptionStatsTracker::new(stats_options, now_ticks),
            subscribed_on,
            state: Mutex::new(berberis_core::fsm::FiniteStateMachine::new(
                PipelineState::Created,
                table,
                pipeline_trigger_str,
                pipeline_state_str,
            )),
        }
    }

    /// The subscription's unique, monotonic id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The subscription's display name (user-supplied name plus id).
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The channel name or wildcard pattern this subscription targets.
    #[must_use]
    pub fn target(&self) -> SubscriptionTarget {
        self.target
    }

    /// Whether this subscription targets a system channel.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// When this subscription was registered.
    #[must_use]
    pub fn subscribed_on(&self) -> DateTime<Utc> {
        self.subscribed_on
    }

    /// This subscription's statistics tracker.
    #[must_use]
    pub fn stats(&self) -> &SubscriptionStatsTracker {
        &self.stats
    }

    /// Returns a statistics snapshot, optionally resetting interval counters.
    #[must_use]
    pub fn stats_snapshot(&self, now_ticks: u64, reset: bool) -> SubscriptionStatsSnapshot {
        self.stats.snapshot(now_ticks, reset)
    }

    /// The current pipeline lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).state()
    }

    pub(crate) fn start(&self) {
        let mut fsm = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if fsm.state() == PipelineState::Created {
            fsm.trigger(PipelineTrigger::Start);
        }
    }

    /// Requests teardown. Returns `true` if this call is the one that
    /// transitioned the subscription out of `Running` (dispose is
    /// idempotent, spec §4.3 "Dispose is idempotent").
    pub(crate) fn request_dispose(&self) -> bool {
        let transitioned = {
            let mut fsm = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if fsm.state() == PipelineState::Running {
                fsm.trigger(PipelineTrigger::Dispose);
                true
            } else {
                false
            }
        };
        if transitioned {
            self.lifecycle_notify.notify_waiters();
        }
        transitioned
    }

    /// Marks the subscription as failed by backpressure. Returns `true` if
    /// this call performed the transition (first queue-full event, spec
    /// §8 property 8).
    pub(crate) fn mark_failed(&self) -> bool {
        let transitioned = {
            let mut fsm = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if fsm.state() == PipelineState::Running {
                fsm.trigger(PipelineTrigger::BackpressureFail);
                true
            } else {
                false
            }
        };
        if transitioned {
            self.lifecycle_notify.notify_waiters();
        }
        transitioned
    }

    /// Marks the subscription's channel as deleted. Returns `true` if this
    /// call performed the transition.
    pub(crate) fn mark_channel_deleted(&self) -> bool {
        let transitioned = {
            let mut fsm = self.state.lock().unwrap_or_else(|p| p.into_inner());
            if fsm.state() == PipelineState::Running {
                fsm.trigger(PipelineTrigger::ChannelDeleted);
                true
            } else {
                false
            }
        };
        if transitioned {
            self.lifecycle_notify.notify_waiters();
        }
        transitioned
    }

    pub(crate) fn finish(&self) {
        let mut fsm = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if matches!(
            fsm.state(),
            PipelineState::Draining | PipelineState::Failing | PipelineState::ChannelDeleted
        ) {
            fsm.trigger(PipelineTrigger::Finish);
        }
    }

    /// Whether the subscription is currently suspended (spec §4.3
    /// suspension contract).
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Sets the suspension flag; a fresh one-shot notification replaces
    /// the old one (spec §4.3 / §9: "a reset pattern that replaces the
    /// waiter atomically when suspending again").
    pub fn suspend(&self) {
        if self
            .suspended
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.resume_notify.store(std::sync::Arc::new(Notify::new()));
        }
    }

    /// Clears the suspension flag and releases any pipeline task waiting
    /// on the current notify handle.
    pub fn resume(&self) {
        if self
            .suspended
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.resume_notify.load().notify_waiters();
        }
    }

    pub(crate) fn resume_notify_handle(&self) -> std::sync::Arc<Notify> {
        self.resume_notify.load_full()
    }

    /// Attempts to enqueue `env`, applying the configured backpressure
    /// strategy on failure (spec §4.1 steps 3-4).
    pub fn try_enqueue(&self, env: Envelope<T>) -> EnqueueOutcome
    where
        T: Clone,
    {
        match self.sender.try_send(env) {
            Ok(()) => {
                self.stats.record_enqueue();
                EnqueueOutcome::Enqueued
            }
            Err(env) => self.apply_backpressure(env),
        }
    }

    fn apply_backpressure(&self, env: Envelope<T>) -> EnqueueOutcome {
        match self.slow_consumer_strategy {
            SlowConsumerStrategy::SkipUpdates => EnqueueOutcome::Dropped,
            SlowConsumerStrategy::FailSubscription => {
                if self.mark_failed() {
                    EnqueueOutcome::JustFailed
                } else {
                    EnqueueOutcome::AlreadyFailed
                }
            }
            SlowConsumerStrategy::ConflateAndSkipUpdates => {
                if let Some(key) = env.key.clone() {
                    self.conflate_backlog.insert(key, env);
                    self.stats.record_enqueue();
                    self.backlog_notify.notify_one();
                    EnqueueOutcome::Conflated
                } else {
                    EnqueueOutcome::Dropped
                }
            }
        }
    }

    /// Drains the conflate-on-backpressure side buffer, returning every
    /// pending envelope in arbitrary (per-key) order.
    pub(crate) fn drain_conflate_backlog(&self) -> Vec<Envelope<T>> {
        let keys: Vec<String> = self
            .conflate_backlog
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        keys.into_iter()
            .filter_map(|key| self.conflate_backlog.remove(&key).map(|(_, env)| env))
            .collect()
    }
}

/// Type-erased view onto a [`SubscriptionCore<T>`], letting
/// [`crate::channel::Channel`] list and downcast subscriptions without
/// itself being generic over every payload type it has ever seen (spec §9
/// "Dynamic typing / generic dispatch").
pub(crate) trait SubscriptionMeta: Send + Sync {
    fn id(&self) -> u64;
    fn display_name(&self) -> &str;
    fn target(&self) -> SubscriptionTarget;
    fn is_system(&self) -> bool;
    fn subscribed_on(&self) -> DateTime<Utc>;
    fn state(&self) -> PipelineState;
    fn is_suspended(&self) -> bool;
    /// Requests teardown, type-erased (spec §4.1 `Dispose`: "disposes every
    /// subscription in every channel" without regard to payload type).
    fn request_dispose(&self) -> bool;
    fn as_any(&self) -> &(dyn std::any::Any + Send + Sync);
}

impl<T: Send + Sync + 'static> SubscriptionMeta for SubscriptionCore<T> {
    fn id(&self) -> u64 {
        Self::id(self)
    }

    fn display_name(&self) -> &str {
        Self::display_name(self)
    }

    fn target(&self) -> SubscriptionTarget {
        Self::target(self)
    }

    fn is_system(&self) -> bool {
        Self::is_system(self)
    }

    fn subscribed_on(&self) -> DateTime<Utc> {
        Self::subscribed_on(self)
    }

    fn state(&self) -> PipelineState {
        Self::state(self)
    }

    fn is_suspended(&self) -> bool {
        Self::is_suspended(self)
    }

    fn request_dispose(&self) -> bool {
        Self::request_dispose(self)
    }

    fn as_any(&self) -> &(dyn std::any::Any + Send + Sync) {
        self
    }
}
