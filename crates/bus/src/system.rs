// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! System channel names (spec §6 "External Interfaces").
//!
//! System channels share the ordinary pipeline but cannot be
//! wildcard-subscribed, have a fixed bounded capacity, and are excluded from
//! `CrossBar::get_channels`.

use crate::{error::CrossBarError, name::ChannelName};

/// Returns the default trace channel name for the given `prefix`
/// (`<prefix>message.traces`, default `$message.traces`).
pub fn trace_channel_name(prefix: &str, max_len: usize) -> Result<ChannelName, CrossBarError> {
    ChannelName::try_new(&format!("{prefix}message.traces"), max_len)
}

/// Returns the default lifecycle channel name for the given `prefix`
/// (`<prefix>lifecycle`, default `$lifecycle`).
pub fn lifecycle_channel_name(prefix: &str, max_len: usize) -> Result<ChannelName, CrossBarError> {
    ChannelName::try_new(&format!("{prefix}lifecycle"), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_system_channel_names() {
        assert_eq!(
            trace_channel_name("$", 256).unwrap().as_str(),
            "$message.traces"
        );
        assert_eq!(lifecycle_channel_name("$", 256).unwrap().as_str(), "$lifecycle");
    }
}
