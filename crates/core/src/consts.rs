// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Core constants.

/// The crate's name string constant.
pub static BERBERIS: &str = "Berberis";

/// The crate version string, read from `Cargo.toml` at compile time.
pub static BERBERIS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default prefix identifying a system channel (see `ChannelName::is_system`).
pub static DEFAULT_SYSTEM_CHANNEL_PREFIX: &str = "$";

/// Default maximum channel name length.
pub const DEFAULT_MAX_CHANNEL_NAME_LENGTH: usize = 256;
