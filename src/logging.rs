//! Tracing subscriber setup.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"composer_lock_diff=info"`).
///
/// Only the first call has an effect. If the host application already set a
/// global subscriber, that one is kept.
pub fn init(default_filter: &str) {
    INIT_ONCE.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init("composer_lock_diff=debug");
        init("composer_lock_diff=debug");
        tracing::info!("logging initialised");
    }
}
