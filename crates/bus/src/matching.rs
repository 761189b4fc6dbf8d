// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! The wildcard matching rule (spec §4.1, definitive):
//!
//! Let pattern `P`. If `P` contains `>`, let `prefix` be the substring of `P`
//! before the first `>`; match iff `channelName` begins with `prefix`.
//! Otherwise, split both `P` and `channelName` on `.`, discarding empty
//! segments; match iff segment counts are equal and, for every index `i`,
//! `P[i] == "*"` or `P[i] == channelName[i]` as byte-for-byte equal strings.
//!
//! This is unrelated to a glob-style `*`/`?` character matcher, which
//! matches individual characters within a single segment. Here `*` matches
//! one whole dot-delimited segment, and matching is defined over segments,
//! not bytes.

use crate::name::{ChannelName, Pattern};

/// Returns whether `pattern` matches `channel` per the definitive rule above.
#[must_use]
pub fn is_match(pattern: &Pattern, channel: &ChannelName) -> bool {
    let pattern = pattern.as_str();
    let channel = channel.as_str();

    if let Some(idx) = pattern.find('>') {
        let prefix = &pattern[..idx];
        return channel.starts_with(prefix);
    }

    let pattern_segments: Vec<&str> = pattern.split('.').filter(|s| !s.is_empty()).collect();
    let channel_segments: Vec<&str> = channel.split('.').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != channel_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(channel_segments.iter())
        .all(|(p, c)| *p == "*" || p == c)
}
