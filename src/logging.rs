//! Log setup.
//!
//! Logs go to **stderr**: stdout carries the handshake line the host reads.
//! Filtering follows `RUST_LOG`, for example:
//!
//! ```bash
//! # Every SendGrid request and retry wait
//! RUST_LOG=sendgrid_provider=debug ./sendgrid-provider
//!
//! # Include the gRPC transport
//! RUST_LOG=debug ./sendgrid-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,sendgrid_provider=info";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber with [`DEFAULT_FILTER`].
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging() -> bool {
    init_logging_with_default(DEFAULT_FILTER)
}

/// Install the global subscriber, filtering with `default_filter` when
/// `RUST_LOG` is unset. An unparsable `default_filter` falls back to
/// [`DEFAULT_FILTER`].
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging_with_default(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}
