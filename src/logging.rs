// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic logging to stderr
//!
//! Quiet by default (`warn`). `MSEARCH_LOG` selects the filter, falling back
//! to `RUST_LOG`:
//!
//! ```bash
//! MSEARCH_LOG=debug msearch files src main
//! MSEARCH_LOG=msearch::normalize=trace msearch dirs .
//! ```

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

pub const ENV_VAR: &str = "MSEARCH_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Filter directives from the environment, or the quiet default
pub fn filter_directives(msearch_log: Option<String>, rust_log: Option<String>) -> String {
    msearch_log
        .or(rust_log)
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize logging. Only the first call takes effect.
pub fn init() {
    INIT.call_once(|| {
        let directives = filter_directives(
            std::env::var(ENV_VAR).ok(),
            std::env::var("RUST_LOG").ok(),
        );
        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(true)
            .with_level(true)
            .with_filter(filter);

        // A subscriber installed by an embedding program wins
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}
