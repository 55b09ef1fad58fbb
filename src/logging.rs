//! Structured logging for the CLI.
//!
//! Logs go to stderr so command output on stdout stays clean. `RUST_LOG`
//! wins when set; otherwise `--verbose` picks `debug` over `info`.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// The filter directive used when `RUST_LOG` is absent.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_filter(filter(verbose)),
        );

        // Someone else (a test harness, an embedding app) may already own
        // the global subscriber.
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(default_level(true), "debug");
        assert_eq!(default_level(false), "info");
    }

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
        tracing::info!("still logging");
    }
}
