//! Tracing subscriber setup for binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Longest filter directive accepted from the environment.
const MAX_FILTER_LENGTH: usize = 4096;

/// Builds a filter from a raw directive, falling back to `default`.
///
/// Empty, oversized, or unparsable directives are ignored so a bad
/// `RUST_LOG` never prevents startup.
#[must_use]
pub fn env_filter(raw: Option<&str>, default: &str) -> EnvFilter {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_FILTER_LENGTH)
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Installs a formatted subscriber filtered by `RUST_LOG`.
///
/// Does nothing when a global subscriber is already set.
pub fn init(default: &str) {
    let raw = std::env::var("RUST_LOG").ok();
    let filter = env_filter(raw.as_deref(), default);
    drop(
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init(),
    );
}
