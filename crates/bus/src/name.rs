// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Validated, interned channel-name and wildcard-pattern wrappers.
//!
//! Both types wrap a [`Ustr`] so that cloning and hashing a name or pattern is
//! a cheap pointer copy, the same trade-off an interned topic string makes
//! for message topics.

use std::fmt;

use ustr::Ustr;

use crate::error::CrossBarError;

/// A validated, dot-segmented channel name.
///
/// Invariants (see spec §3): non-empty, length within the configured
/// maximum, must not contain `".."`, and must not contain the wildcard
/// characters `*` or `>` (a string with those characters is a [`Pattern`],
/// not a channel name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelName(Ustr);

impl ChannelName {
    /// Validates and interns `raw` as a channel name.
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidChannelName`] if `raw` is empty,
    /// exceeds `max_len`, contains `".."`, or contains a wildcard character.
    pub fn try_new(raw: &str, max_len: usize) -> Result<Self, CrossBarError> {
        if raw.is_empty() || raw.trim().is_empty() {
            return Err(CrossBarError::InvalidChannelName {
                name: raw.to_string(),
                reason: "channel name must not be empty or whitespace".to_string(),
            });
        }
        if raw.len() > max_len {
            return Err(CrossBarError::InvalidChannelName {
                name: raw.to_string(),
                reason: format!("channel name exceeds maximum length of {max_len}"),
            });
        }
        if raw.contains("..") {
            return Err(CrossBarError::InvalidChannelName {
                name: raw.to_string(),
                reason: "channel name must not contain '..'".to_string(),
            });
        }
        if raw.contains('*') || raw.contains('>') {
            return Err(CrossBarError::InvalidChannelName {
                name: raw.to_string(),
                reason: "channel name must not contain wildcard characters '*' or '>'"
                    .to_string(),
            });
        }
        Ok(Self(Ustr::from(raw)))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this channel name starts with the given system prefix.
    #[must_use]
    pub fn is_system(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.as_str().starts_with(prefix)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// A validated wildcard pattern (segment wildcard `*` or recursive-prefix `>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pattern(Ustr);

impl Pattern {
    /// Validates and interns `raw` as a wildcard pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CrossBarError::InvalidSubscription`] if `raw` is empty.
    pub fn try_new(raw: &str) -> Result<Self, CrossBarError> {
        if raw.is_empty() || raw.trim().is_empty() {
            return Err(CrossBarError::InvalidSubscription {
                reason: "pattern must not be empty or whitespace".to_string(),
            });
        }
        Ok(Self(Ustr::from(raw)))
    }

    /// Returns the pattern as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this string actually designates a wildcard pattern
    /// rather than a plain channel name (contains `*` or `>`).
    #[must_use]
    pub fn is_wildcard(raw: &str) -> bool {
        raw.contains('*') || raw.contains('>')
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
