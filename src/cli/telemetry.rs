use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the log filter, e.g. `SUBCLEAN_LOG=subclean=trace,mongodb=debug`
pub const LOG_ENV: &str = "SUBCLEAN_LOG";

/// Default filter directive for the given verbosity
#[must_use]
pub const fn default_directive(debug: bool) -> &'static str {
    if debug {
        "subclean=debug"
    } else {
        "subclean=info"
    }
}

/// Initialize logging to stderr, stdout is kept for the report
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "subclean=info");
        assert_eq!(default_directive(true), "subclean=debug");
    }

    #[test]
    fn test_init_twice_fails() {
        // the first call may lose against another test installing a subscriber
        let _ = init(false);
        assert!(init(true).is_err());
    }
}
