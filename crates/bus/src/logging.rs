// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Tracing bootstrap (spec §10.2 "Logging").
//!
//! Reads `RUST_LOG`, builds an `EnvFilter`, and installs a
//! `tracing_subscriber::fmt` subscriber. Absence of `RUST_LOG` is treated as
//! "logging not wanted" rather than an error, so embedding applications that
//! install their own subscriber are never surprised by a second one.

use std::env;

use tracing_subscriber::EnvFilter;

/// Initializes a `tracing_subscriber::fmt` subscriber from the `RUST_LOG`
/// environment variable.
///
/// Should only be called once during an application's run, ideally at the
/// beginning. A `CrossBar` embedded inside an application that already
/// installs its own subscriber should skip this and just construct the bar.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing() -> anyhow::Result<()> {
    if let Ok(directive) = env::var("RUST_LOG") {
        let env_filter = EnvFilter::new(directive.clone());
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;
        println!("initialized tracing logs with RUST_LOG={directive}");
    }
    Ok(())
}
