// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! [`Envelope`], the message-plus-metadata unit that flows through every
//! channel (spec §3).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::name::ChannelName;

/// The kind of event an [`Envelope`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A regular published update.
    ChannelUpdate,
    /// The channel (or a stored key) was deleted.
    ChannelDelete,
    /// The channel's value store was reset.
    ChannelReset,
    /// An internal trace event re-published on a system channel.
    SystemTrace,
}

/// A published value plus its delivery metadata.
///
/// `id` and `inception_ticks` are always assigned by the core, never by the
/// caller (spec §3 invariant). `key` must be `Some` whenever the envelope is
/// destined for the value store.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// Per-channel monotonic id, assigned at publish if the caller did not supply one.
    pub id: u64,
    /// Wall-clock UTC time the envelope was constructed.
    pub timestamp_utc: DateTime<Utc>,
    /// What kind of event this envelope represents.
    pub message_type: MessageType,
    /// Correlates related envelopes/requests across channels.
    pub correlation_id: Uuid,
    /// The value-store key, if this envelope is stored.
    pub key: Option<String>,
    /// Clock reading (nanoseconds) when the publish was accepted by the core.
    pub inception_ticks: u64,
    /// An optional caller-supplied source identifier.
    pub from: Option<String>,
    /// The published payload.
    pub body: T,
    /// An optional free-form tag.
    pub tag: Option<String>,
    /// The channel this envelope was published on, if applicable.
    pub channel_name: Option<ChannelName>,
}

impl<T> Envelope<T> {
    /// Returns a new envelope with the given `body`, leaving every optional
    /// field unset. `id` and `inception_ticks` must be assigned by the
    /// caller before the envelope is handed to a subscriber queue.
    pub fn new(body: T, timestamp_utc: DateTime<Utc>, message_type: MessageType) -> Self {
        Self {
            id: 0,
            timestamp_utc,
            message_type,
            correlation_id: Uuid::nil(),
            key: None,
            inception_ticks: 0,
            from: None,
            body,
            tag: None,
            channel_name: None,
        }
    }

    /// Returns a new envelope with `body` replaced, keeping all metadata.
    pub fn with_body<U>(&self, body: U) -> Envelope<U> {
        Envelope {
            id: self.id,
            timestamp_utc: self.timestamp_utc,
            message_type: self.message_type,
            correlation_id: self.correlation_id,
            key: self.key.clone(),
            inception_ticks: self.inception_ticks,
            from: self.from.clone(),
            body,
            tag: self.tag.clone(),
            channel_name: self.channel_name,
        }
    }
}

/// Optional metadata a caller may attach to a `publish` call (spec §4.1).
#[derive(Debug, Clone, Default)]
pub struct PublishMeta {
    /// Correlates this publish with related envelopes/requests.
    pub correlation_id: Option<Uuid>,
    /// The value-store key; required when `store=true`.
    pub key: Option<String>,
    /// An optional caller-supplied source identifier.
    pub from: Option<String>,
    /// An optional free-form tag.
    pub tag: Option<String>,
}
