// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tracing subscriber setup shared by every binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install compact stderr subscriber.
///
/// Level defaults to "info", but can be overridden through `RUST_LOG`. Logs
/// are written to stderr so stdout stays free for command output that users
/// may want to pipe somewhere.
pub fn init() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();
}
