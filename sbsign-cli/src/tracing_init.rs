// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::GlobalArgs;

pub fn init(g: &GlobalArgs) -> Result<()> {
    // If RUST_LOG is set, honor it entirely.
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(g.log_level.as_str())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().without_time())
        .with(filter)
        .init();

    Ok(())
}
