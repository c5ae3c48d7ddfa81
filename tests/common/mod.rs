//! Logging for integration tests.
//!
//! Each test binary calls `init_test_setup()` from a `#[ctor::ctor]` hook.
//! `RUST_LOG` picks the filter; without it only rejected operations
//! (`debug!` events) are shown, since per-call `trace` spans swamp the
//! output of the deep-tree tests.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "nodetree=debug";

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE);

        if let Err(e) = tracing_subscriber::registry()
            .with(fmt_layer.with_filter(env_filter))
            .try_init()
        {
            eprintln!("Error: Failed to set up logging: {}", e);
            return;
        }
        info!("Test Setup complete");
    });
}
