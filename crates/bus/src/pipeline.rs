// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The single consumer task per subscription (spec §4.3).
//!
//! One [`run`] future is spawned per subscription via `tokio::task::spawn`;
//! it owns the ingress [`QueueReceiver`] exclusively (spec §3 invariant:
//! "exactly one consumer task reads its queue") and is the only place a
//! handler is ever invoked, satisfying "handler invocations on a single
//! subscription never overlap" (spec §8 property 6) by construction: there
//! is only one task doing the invoking, and it always awaits one handler
//! call before starting the next.

use std::{collections::HashMap, sync::Arc, sync::Weak, time::Duration};

use berberis_core::Clock;
use tracing::{debug, warn};

use crate::{
    envelope::Envelope,
    events::{HandlerTimeoutEvent, TraceEvent},
    subscription::{HandlerFn, OnTimeoutFn, PipelineState, QueueReceiver, SubscriptionCore},
};

/// The subset of `CrossBar` the pipeline needs to re-publish trace events,
/// modelled as a narrow interface rather than a strong back-reference to
/// the whole bar (spec §9 "Cyclic ownership"). Held as a [`Weak`] so a
/// disposed/dropped `CrossBar` never keeps a pipeline task (or vice versa)
/// alive.
pub trait TraceSink: Send + Sync {
    /// Publishes `event` onto the trace system channel.
    fn publish_trace(&self, event: TraceEvent);
}

/// Everything [`run`] needs to drive one subscription's pipeline.
pub(crate) struct PipelineConfig<T> {
    pub subscription: Arc<SubscriptionCore<T>>,
    pub receiver: QueueReceiver<T>,
    pub initial_state: Vec<Envelope<T>>,
    pub conflation_interval_ms: u64,
    pub handler: HandlerFn<T>,
    pub handler_timeout: Option<Duration>,
    pub on_timeout: Option<OnTimeoutFn>,
    pub clock: Arc<dyn Clock>,
    pub channel_name: String,
    pub trace: Weak<dyn TraceSink>,
    pub message_tracing_enabled: bool,
    pub is_system: bool,
    /// Invoked exactly once on exit; removes this subscription from its
    /// channel's (and, for wildcards, the wildcard registry's) map. Captures
    /// only the id/name/target needed to do that, not a reference to the
    /// whole bar (spec §9).
    pub unregister: Box<dyn FnOnce() + Send>,
}

/// Runs one subscription's pipeline to completion. Spawn with
/// `tokio::spawn(pipeline::run(cfg).instrument(...))` or call `run` directly
/// inside a task.
pub(crate) async fn run<T>(mut cfg: PipelineConfig<T>)
where
    T: Clone + Send + 'static,
{
    // Step 1: cooperative hand-off before doing any work.
    tokio::task::yield_now().await;
    cfg.subscription.start();

    // Step 2: deliver initial state before any live message.
    for env in std::mem::take(&mut cfg.initial_state) {
        process_message(
            &env,
            &cfg.subscription,
            &mut cfg.handler,
            cfg.handler_timeout,
            cfg.on_timeout.as_deref(),
            &cfg.clock,
            &cfg.channel_name,
            &cfg.trace,
            cfg.message_tracing_enabled,
            cfg.is_system,
        )
        .await;
    }

    // Step 3/4: timed conflation (if enabled) plus the live read loop.
    let mut conflation_map: HashMap<String, Envelope<T>> = HashMap::new();
    let mut interval = if cfg.conflation_interval_ms > 0 {
        Some(tokio::time::interval(Duration::from_millis(
            cfg.conflation_interval_ms,
        )))
    } else {
        None
    };

    loop {
        // Register the waiter before checking state: `Notify::notify_waiters`
        // stores no permit, so a transition that fires between the state
        // check and the first poll of `notified()` would otherwise be lost
        // forever (see `Notify`'s own docs on this exact hazard). Clone the
        // `Arc` so the pinned future borrows it rather than `cfg` itself,
        // since other arms below take `&mut cfg`.
        let subscription = cfg.subscription.clone();
        let notified = subscription.lifecycle_notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if cfg.subscription.state() != PipelineState::Running {
            break;
        }

        tokio::select! {
            biased;

            () = &mut notified => {
                // Re-check state next iteration; Draining/ChannelDeleted drain
                // remaining queued items below, Failing stops immediately.
            }

            () = cfg.subscription.backlog_notify.notified() => {
                for env in cfg.subscription.drain_conflate_backlog() {
                    dequeue_and_dispatch(&env, &mut conflation_map, &mut cfg).await;
                }
            }

            () = tick_or_pending(interval.as_mut()) => {
                flush_conflation(&mut conflation_map, &mut cfg).await;
            }

            maybe_env = cfg.receiver.recv() => {
                match maybe_env {
                    Some(env) => dequeue_and_dispatch(&env, &mut conflation_map, &mut cfg).await,
                    None => break,
                }
            }
        }
    }

    let state = cfg.subscription.state();
    if state == PipelineState::Draining || state == PipelineState::ChannelDeleted {
        // Drain whatever is left in the ingress queue before exiting (spec
        // §4.3 "Closure": "the pipeline exits when the queue is closed... on
        // exit: flusher sub-task is awaited").
        while let Some(env) = cfg.receiver.try_recv() {
            dequeue_and_dispatch(&env, &mut conflation_map, &mut cfg).await;
        }
        flush_conflation(&mut conflation_map, &mut cfg).await;
        for env in cfg.subscription.drain_conflate_backlog() {
            dequeue_and_dispatch(&env, &mut conflation_map, &mut cfg).await;
        }
    }

    debug!(
        subscription = cfg.subscription.display_name(),
        channel = %cfg.channel_name,
        final_state = ?cfg.subscription.state(),
        "pipeline task exiting"
    );

    cfg.subscription.finish();
    (cfg.unregister)();
}

/// Awaits the next tick of `interval` if conflation is enabled, otherwise
/// never resolves — letting the enclosing `select!` skip this arm entirely
/// without needing a boolean guard that would also have to be threaded
/// through a mutable borrow of `interval`.
async fn tick_or_pending(interval: Option<&mut tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Records the dequeue statistics for one envelope pulled off the ingress
/// queue, then either inserts it into the conflation map (keyed envelopes,
/// conflation enabled) or processes it immediately (spec §4.3 step 4).
async fn dequeue_and_dispatch<T>(
    env: &Envelope<T>,
    conflation_map: &mut HashMap<String, Envelope<T>>,
    cfg: &mut PipelineConfig<T>,
) where
    T: Clone + Send + 'static,
{
    let now = cfg.clock.now_ns().as_u64();
    let latency_ticks = now.saturating_sub(env.inception_ticks);
    cfg.subscription.stats().record_dequeue(latency_ticks, now);

    if cfg.conflation_interval_ms > 0
        && let Some(key) = env.key.clone()
    {
        conflation_map.insert(key, env.clone());
        return;
    }

    process_message(
        env,
        &cfg.subscription,
        &mut cfg.handler,
        cfg.handler_timeout,
        cfg.on_timeout.as_deref(),
        &cfg.clock,
        &cfg.channel_name,
        &cfg.trace,
        cfg.message_tracing_enabled,
        cfg.is_system,
    )
    .await;
}

/// Atomically swaps the conflation map for an empty one and processes every
/// envelope it held, in iteration order (spec §4.3 step 3, §9 "swap current
/// for empty backing semantics under a short critical section" — the
/// critical section here is simply owning `conflation_map` exclusively
/// inside this single-consumer task, so no lock is required).
async fn flush_conflation<T>(conflation_map: &mut HashMap<String, Envelope<T>>, cfg: &mut PipelineConfig<T>)
where
    T: Clone + Send + 'static,
{
    if conflation_map.is_empty() {
        return;
    }
    let drained: Vec<Envelope<T>> = std::mem::take(conflation_map).into_values().collect();
    for env in &drained {
        process_message(
            env,
            &cfg.subscription,
            &mut cfg.handler,
            cfg.handler_timeout,
            cfg.on_timeout.as_deref(),
            &cfg.clock,
            &cfg.channel_name,
            &cfg.trace,
            cfg.message_tracing_enabled,
            cfg.is_system,
        )
        .await;
    }
}

/// The process-message step, shared by the initial-state replay and the
/// live path (spec §4.3 "Process-message step").
#[allow(clippy::too_many_arguments)]
async fn process_message<T>(
    env: &Envelope<T>,
    subscription: &Arc<SubscriptionCore<T>>,
    handler: &mut HandlerFn<T>,
    handler_timeout: Option<Duration>,
    on_timeout: Option<&OnTimeoutFn>,
    clock: &Arc<dyn Clock>,
    channel_name: &str,
    trace: &Weak<dyn TraceSink>,
    message_tracing_enabled: bool,
    is_system: bool,
) where
    T: Clone + Send + 'static,
{
    // 1. Suspension check, performed before invocation, never mid-handler.
    if subscription.is_suspended() {
        let notify = subscription.resume_notify_handle();
        notify.notified().await;
    }

    // 2. Service timing.
    let service_start = clock.now_ns().as_u64();
    let message_id = env.id;
    let to_invoke = env.clone();

    let result = match handler_timeout {
        // Fast path (spec §4.3 step 3): no timeout configured, no
        // cancellation machinery allocated, the handler future is awaited
        // directly.
        None => handler(to_invoke).await,
        Some(timeout) => match tokio::time::timeout(timeout, handler(to_invoke)).await {
            Ok(result) => result,
            Err(_) => {
                subscription.stats().record_timeout();
                if let Some(cb) = on_timeout {
                    cb(HandlerTimeoutEvent {
                        channel_name: channel_name.to_string(),
                        message_id,
                        timeout,
                    });
                }
                warn!(
                    subscription = subscription.display_name(),
                    channel = channel_name,
                    message_id,
                    ?timeout,
                    "handler timed out"
                );
                return;
            }
        },
    };

    if let Err(err) = result {
        warn!(
            subscription = subscription.display_name(),
            channel = channel_name,
            message_id,
            error = %err,
            "handler exception"
        );
        return;
    }

    let service_end = clock.now_ns().as_u64();
    let service_ticks = service_end.saturating_sub(service_start);
    subscription.stats().record_processed(service_ticks, service_end);

    if message_tracing_enabled
        && !is_system
        && let Some(sink) = trace.upgrade()
    {
        sink.publish_trace(TraceEvent::SubscriptionProcessed {
            channel: channel_name.to_string(),
            subscription: subscription.display_name().to_string(),
            service_ns: service_ticks,
        });
    }
}
