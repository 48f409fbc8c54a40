//! Log output setup.
//!
//! The library only emits `tracing` events. Hosts that want them on stderr
//! call [`init`] once at startup; `RUST_LOG` takes precedence over the
//! configured level.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs a formatted stderr subscriber.
///
/// Returns `false` if a global subscriber was already set, in which case
/// nothing changes.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
