//! Tracing initialisation.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `info`. Calling it twice is harmless.
pub fn init_tracing() {
    init_tracing_with("info");
}

/// Like [`init_tracing`] with a different fallback filter, e.g.
/// `"boardroom=debug,info"`.
pub fn init_tracing_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
