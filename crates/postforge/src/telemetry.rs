//! Process-wide tracing setup for the binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "info";

/// `RUST_LOG` when set and valid, else [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. `try_init` also installs the `log`
/// bridge, so `log` records from the HTTP clients land in the same output.
///
/// Returns false when a subscriber was already installed; the first one
/// stays in place.
pub fn init(json: bool) -> bool {
    let registry = Registry::default().with(env_filter());
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Tracing subscriber already installed: {}", e);
            false
        }
    }
}
