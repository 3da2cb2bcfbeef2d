//! Tracing subscriber setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered at `default_level`. `RUST_LOG` takes
/// precedence when set. Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
