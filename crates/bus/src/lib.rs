// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! `berberis-bus`: CrossBar, an in-process, typed publish/subscribe message bus.
//!
//! A `CrossBar` fans values of any `T: Send + Sync + 'static` out to
//! subscribers registered either on an exact channel name or on a wildcard
//! pattern (`orders.*`, `orders.>`), with per-subscription backpressure
//! policies, optional conflation, a last-value-per-key store per channel,
//! and system channels carrying trace and lifecycle events.
//!
//! ```
//! use berberis_bus::{CrossBar, CrossBarConfig, PublishMeta, SubscribeOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bar = CrossBar::new_with_system_clock(CrossBarConfig::default())?;
//!
//! let _sub = bar.subscribe::<String, _, _>(
//!     "orders.new",
//!     |env| async move {
//!         println!("received {}", env.body);
//!         Ok(())
//!     },
//!     SubscribeOptions::default(),
//! )?;
//!
//! bar.publish("orders.new", "order-1".to_string(), false, PublishMeta::default())?;
//! bar.dispose().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! This crate has no feature flags; every module below is always compiled.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod channel;
pub mod config;
pub mod crossbar;
pub mod envelope;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod matching;
pub mod metrics;
pub mod name;
pub mod pipeline;
pub mod stats;
pub mod subscription;
pub mod system;
pub mod value_store;
pub mod wildcard;

pub use crate::{
    config::{CrossBarConfig, SlowConsumerStrategy, SubscribeOptions},
    crossbar::{CrossBar, SubscriptionHandle, SubscriptionSnapshot},
    envelope::{Envelope, MessageType, PublishMeta},
    error::CrossBarError,
    events::{HandlerTimeoutEvent, LifecycleEvent, TerminationReason, TraceEvent},
    ids::next_correlation_id,
    logging::init_tracing,
    name::{ChannelName, Pattern},
};
