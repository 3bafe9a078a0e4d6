//! Tracing subscriber setup for applications embedding the loader.
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! application installs a subscriber, either its own or the one below.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Build the stderr subscriber used by [`init`] and [`try_init`].
///
/// `RUST_LOG` takes precedence over `default_directive` when set.
fn subscriber(default_directive: &str) -> Result<impl tracing::Subscriber + Send + Sync + use<>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };

    Ok(FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(default_directive: &str) -> Result<()> {
    tracing::subscriber::set_global_default(subscriber(default_directive)?)?;
    Ok(())
}

/// Install the global subscriber unless one is already installed.
///
/// Returns `true` if this call installed it.
pub fn try_init(default_directive: &str) -> bool {
    match subscriber(default_directive) {
        Ok(subscriber) => tracing::subscriber::set_global_default(subscriber).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        try_init("info");
        assert!(!try_init("debug"));
        assert!(init("debug").is_err());
    }
}
