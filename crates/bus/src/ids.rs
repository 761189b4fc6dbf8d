// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Monotonic id generators (spec §3 "Subscription... unique id (monotonic
//! across the whole CrossBar)" and §4.1 `GetNextCorrelationId`).

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// A process-local monotonic `u64` generator.
///
/// Used for subscription ids (monotonic across the whole CrossBar) and for
/// per-channel message ids (monotonic per channel).
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU64,
}

impl SequenceGenerator {
    /// Creates a new generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next value in the sequence.
    pub fn next_value(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Returns a new random correlation id (spec §4.1 `GetNextCorrelationId`).
#[must_use]
pub fn next_correlation_id() -> Uuid {
    Uuid::new_v4()
}
