// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The wildcard subscription registry (spec §3 "Wildcard pattern", §9
//! "Wildcard subscription race").
//!
//! A wildcard subscription is not stored on any single [`crate::channel::Channel`]
//! at registration time — there may be no matching channel yet. Instead it is
//! recorded here, and attached to a channel's own subscription map through
//! two independent passes that together close the race spec §9 calls out:
//!
//! 1. **Channel-creation attach**: whenever a channel is created (first
//!    publish or first direct subscribe), every currently registered
//!    wildcard pattern matching the new name is attached to it once, at
//!    creation time ([`WildcardRegistry::attach_new_channel`]).
//! 2. **Subscribe-time backfill**: whenever a new wildcard subscription is
//!    registered, it is attached to every channel that already exists and
//!    matches its pattern ([`WildcardRegistry::attach_to_existing`]).
//!
//! Together these two passes guarantee a wildcard subscription is attached
//! to every matching channel regardless of which of the two existed first;
//! neither pass depends on the other's timing, so there is no window where
//! a channel and a matching wildcard subscription can both be present
//! without the attach having run.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::name::{ChannelName, Pattern};

/// One registered wildcard subscription, stored behind a type-erased
/// closure so the registry (like [`crate::channel::Channel`]) need not be
/// generic over every subscription's payload type.
struct WildcardEntry {
    pattern: Pattern,
    /// Inserts this subscription's core into a channel's subscription map.
    /// Returns `false` if `channel`'s declared type disagrees with this
    /// subscription's type, which is left unattached (spec §9: a wildcard
    /// whose payload type disagrees with a matching channel simply never
    /// attaches to it, rather than erroring).
    attach: Box<dyn Fn(&crate::channel::Channel) -> bool + Send + Sync>,
}

/// The process-wide wildcard subscription registry.
///
/// Keyed by subscription id rather than pattern, since two distinct
/// subscriptions may legally share the same pattern string (spec §3 does
/// not forbid duplicate wildcard subscriptions on the same pattern).
#[derive(Default)]
pub(crate) struct WildcardRegistry {
    entries: DashMap<u64, WildcardEntry>,
    /// Channels each wildcard subscription has actually been attached to,
    /// so dispose/unregister can remove it from every one of them (a
    /// wildcard subscription's single pipeline may be attached to many
    /// channels at once).
    attachments: DashMap<u64, Mutex<Vec<ChannelName>>>,
}

impl WildcardRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
            attachments: DashMap::new(),
        }
    }

    /// Registers a new wildcard subscription under `id`/`pattern`.
    pub(crate) fn register<T: Send + Sync + 'static>(
        &self,
        id: u64,
        pattern: Pattern,
        sub: Arc<crate::subscription::SubscriptionCore<T>>,
    ) {
        self.entries.insert(
            id,
            WildcardEntry {
                pattern,
                attach: Box::new(move |channel: &crate::channel::Channel| {
                    if !channel.matches_type(std::any::TypeId::of::<T>()) {
                        return false;
                    }
                    channel.insert_subscription(id, sub.clone());
                    true
                }),
            },
        );
    }

    /// Removes a wildcard subscription from the registry (spec §4.3
    /// dispose: the registry entry must be dropped so no channel created
    /// afterward attaches a disposed subscription). Returns the channels it
    /// had been attached to, so the caller can remove it from each one.
    pub(crate) fn unregister(&self, id: u64) -> Vec<ChannelName> {
        self.entries.remove(&id);
        self.attachments
            .remove(&id)
            .map(|(_, channels)| channels.into_inner().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Attaches every currently registered wildcard pattern matching `name`
    /// to `channel`, a channel just created with that name. Called exactly
    /// once, at channel-creation time (pass 1 above).
    pub(crate) fn attach_new_channel(&self, name: ChannelName, channel: &crate::channel::Channel) {
        for entry in &self.entries {
            if crate::matching::is_match(&entry.pattern, &name) && (entry.attach)(channel) {
                self.record_attachment(*entry.key(), name);
            }
        }
    }

    /// Attaches a freshly registered wildcard subscription (keyed by `id`)
    /// to every already-existing channel whose name matches its pattern
    /// (pass 2 above). Channels created afterward are instead covered by
    /// [`Self::attach_new_channel`].
    pub(crate) fn attach_to_existing(
        &self,
        id: u64,
        channels: &DashMap<ChannelName, Arc<crate::channel::Channel>>,
    ) {
        let Some(entry) = self.entries.get(&id) else {
            return;
        };
        let mut newly_attached = Vec::new();
        for channel_entry in channels {
            if crate::matching::is_match(&entry.pattern, channel_entry.key())
                && (entry.attach)(channel_entry.value())
            {
                newly_attached.push(*channel_entry.key());
            }
        }
        drop(entry);
        for name in newly_attached {
            self.record_attachment(id, name);
        }
    }

    fn record_attachment(&self, id: u64, name: ChannelName) {
        self.attachments
            .entry(id)
            .or_insert_with(|| Mutex::new(Vec::new()))
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(name);
    }
}
