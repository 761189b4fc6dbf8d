// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! An explicit clock dependency, injected rather than read from an ambient
//! singleton.
//!
//! `AtomicTime` already separates real-time from static/manually-controlled
//! modes; `Clock` wraps it behind a trait object so callers (the CrossBar,
//! in `berberis-bus`) depend on `Arc<dyn Clock>` instead of reaching for a
//! process-wide global, matching the design note that the clock, logger, and
//! id generators must be explicit constructor dependencies, not ambient
//! singletons.

use std::fmt;

use crate::{UnixNanos, time::AtomicTime};

/// A monotonic nanosecond tick source.
///
/// Implementations must return strictly non-decreasing values across calls
/// from any thread.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time, in nanoseconds since the UNIX epoch.
    fn now_ns(&self) -> UnixNanos;
}

/// A [`Clock`] backed by [`AtomicTime`] in real-time mode, synchronised with
/// system wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock {
    inner: AtomicTime,
}

impl SystemClock {
    /// Creates a new real-time system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: AtomicTime::default(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ns(&self) -> UnixNanos {
        self.inner.get_time_ns()
    }
}

/// A [`Clock`] backed by [`AtomicTime`] in static mode, for deterministic
/// tests: time only advances when [`StaticClock::advance`] or
/// [`StaticClock::set`] is called.
#[derive(Debug)]
pub struct StaticClock {
    inner: AtomicTime,
}

impl StaticClock {
    /// Creates a new static clock starting at `start`.
    #[must_use]
    pub fn new(start: UnixNanos) -> Self {
        Self {
            inner: AtomicTime::new(false, start),
        }
    }

    /// Advances the clock by `delta_ns` nanoseconds, returning the new time.
    ///
    /// # Panics
    ///
    /// Panics if the increment would overflow `u64::MAX`.
    pub fn advance(&self, delta_ns: u64) -> UnixNanos {
        self.inner
            .increment_time(delta_ns)
            .expect("StaticClock overflow")
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, time: UnixNanos) {
        self.inner.set_time(time);
    }
}

impl Default for StaticClock {
    fn default() -> Self {
        Self::new(UnixNanos::default())
    }
}

impl Clock for StaticClock {
    fn now_ns(&self) -> UnixNanos {
        self.inner.get_time_ns()
    }
}
