use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Must be called exactly once, before any
/// task that might emit a tracing event is spawned. Library crates never
/// call this themselves -- only a binary's `main`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
